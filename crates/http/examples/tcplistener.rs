//! Debug tool: accepts a single TCP connection, parses one request off it
//! and prints what arrived.
//!
//! ```bash
//! cargo run --example tcplistener
//! curl -d 'hello' http://localhost:42069/
//! ```

use tokio::net::TcpListener;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use wire_http::protocol::Request;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let listener = match TcpListener::bind("0.0.0.0:42069").await {
        Ok(listener) => listener,
        Err(e) => {
            error!(cause = %e, "bind error");
            return;
        }
    };

    let (mut stream, remote_addr) = match listener.accept().await {
        Ok(stream_and_addr) => stream_and_addr,
        Err(e) => {
            error!(cause = %e, "accept error");
            return;
        }
    };
    info!(%remote_addr, "connection accepted");

    let request = match Request::from_reader(&mut stream).await {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "parse error");
            return;
        }
    };

    println!("Request line:");
    println!("- Method: {}", request.request_line.method);
    println!("- Target: {}", request.request_line.request_target);
    println!("- Version: {}", request.request_line.http_version);
    println!("Headers:");
    for (name, value) in request.headers.iter() {
        println!("- {name}: {value}");
    }
    println!("Body:");
    println!("{}", String::from_utf8_lossy(&request.body));
}
