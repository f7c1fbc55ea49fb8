//! Standalone UDP line sender: reads stdin line by line and fires each one
//! at `localhost:42069`. Pair it with `nc -ul 42069` to watch the datagrams.

use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tokio::net::UdpSocket;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => socket,
        Err(e) => {
            error!(cause = %e, "bind error");
            return;
        }
    };
    if let Err(e) = socket.connect("localhost:42069").await {
        error!(cause = %e, "connect error");
        return;
    }

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        println!(">");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line + "\n",
            Ok(None) => return,
            Err(e) => {
                error!(cause = %e, "error reading stdin");
                continue;
            }
        };

        match socket.send(line.as_bytes()).await {
            Ok(n) => info!(bytes = n, "sent to connection"),
            Err(e) => error!(cause = %e, "send error"),
        }
    }
}
