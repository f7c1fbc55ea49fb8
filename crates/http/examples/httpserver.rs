//! Demo server exercising the whole public surface: canned HTML pages,
//! a static file, and a reverse proxy streamed through the chunked writer
//! with digest trailers.
//!
//! ```bash
//! cargo run --example httpserver
//! curl -v http://localhost:42069/
//! curl -v --raw http://localhost:42069/httpbin/stream/3
//! ```

use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use wire_http::handler::make_handler;
use wire_http::protocol::{Headers, Request, SendError};
use wire_http::response::{ResponseWriter, StatusCode, default_headers};
use wire_http::server::serve;

const PORT: u16 = 42069;

const PAGE_200: &[u8] = br#"<html>
<head>
<title>200 OK</title>
</head>
<body>
<h1>Success!</h1>
<p>Your request was an absolute banger.</p>
</body>
</html>
"#;

const PAGE_400: &[u8] = br#"<html>
<head>
<title>400 Bad Request</title>
</head>
<body>
<h1>Bad Request</h1>
<p>Your request honestly kinda sucked.</p>
</body>
</html>
"#;

const PAGE_500: &[u8] = br#"<html>
<head>
<title>500 Internal Server Error</title>
</head>
<body>
<h1>Internal Server Error</h1>
<p>Okay, you know what? This one is on me.</p>
</body>
</html>
"#;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = match serve(PORT, make_handler(handler)).await {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "error starting server");
            return;
        }
    };
    info!(port = PORT, "server started");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(cause = %e, "failed to listen for interrupt signal");
    }
    server.close();
    info!("server gracefully stopped");
}

async fn handler(writer: ResponseWriter<TcpStream>, request: Request) {
    let target = request.request_line.request_target.clone();

    let result = if let Some(upstream_path) = target.strip_prefix("/httpbin/") {
        proxy_handler(writer, upstream_path).await
    } else {
        match target.as_str() {
            "/yourproblem" => respond_html(writer, StatusCode::BAD_REQUEST, PAGE_400).await,
            "/myproblem" => respond_html(writer, StatusCode::INTERNAL_SERVER_ERROR, PAGE_500).await,
            "/video" => video_handler(writer).await,
            _ => respond_html(writer, StatusCode::OK, PAGE_200).await,
        }
    };

    if let Err(e) = result {
        error!(cause = %e, request_target = %target, "failed to write response");
    }
}

async fn respond_html(
    mut writer: ResponseWriter<TcpStream>,
    status: StatusCode,
    body: &[u8],
) -> Result<(), SendError> {
    writer.write_status_line(status).await?;
    let mut headers = default_headers(body.len());
    headers.replace("content-type", "text/html");
    writer.write_headers(&headers).await?;
    writer.write_body(body).await?;
    Ok(())
}

async fn video_handler(mut writer: ResponseWriter<TcpStream>) -> Result<(), SendError> {
    let data = match tokio::fs::read("assets/vim.mp4").await {
        Ok(data) => data,
        Err(e) => {
            error!(cause = %e, "error reading video asset");
            return respond_html(writer, StatusCode::INTERNAL_SERVER_ERROR, PAGE_500).await;
        }
    };

    writer.write_status_line(StatusCode::OK).await?;
    let mut headers = default_headers(data.len());
    headers.replace("content-type", "video/mp4");
    writer.write_headers(&headers).await?;
    writer.write_body(&data).await?;
    Ok(())
}

/// Streams `http://httpbin.org/<path>` through the chunked writer, closing
/// with sha-256 and length trailers computed over the streamed body.
async fn proxy_handler(mut writer: ResponseWriter<TcpStream>, upstream_path: &str) -> Result<(), SendError> {
    info!(upstream_path, "proxying to httpbin.org");

    let mut upstream = match TcpStream::connect(("httpbin.org", 80)).await {
        Ok(upstream) => upstream,
        Err(e) => {
            error!(cause = %e, "can't reach upstream");
            return respond_html(writer, StatusCode::INTERNAL_SERVER_ERROR, PAGE_500).await;
        }
    };
    let upstream_request =
        format!("GET /{upstream_path} HTTP/1.1\r\nHost: httpbin.org\r\nConnection: close\r\n\r\n");
    upstream.write_all(upstream_request.as_bytes()).await?;

    writer.write_status_line(StatusCode::OK).await?;
    let mut headers = default_headers(0);
    headers.remove("content-length");
    headers.replace("transfer-encoding", "chunked");
    headers.replace("trailer", "X-Content-Sha256, X-Content-Length");
    writer.write_headers(&headers).await?;

    let mut hasher = Sha256::new();
    let mut body_len = 0usize;
    let mut head = Vec::new();
    let mut head_done = false;
    let mut buffer = [0u8; 1024];

    loop {
        let n = upstream.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        if head_done {
            stream_chunk(&mut writer, &mut hasher, &mut body_len, &buffer[..n]).await?;
        } else {
            // everything before the upstream's blank line is its header
            // section, which is not part of the proxied body
            head.extend_from_slice(&buffer[..n]);
            if let Some(pos) = head.windows(4).position(|window| window == b"\r\n\r\n") {
                head_done = true;
                let first_body_bytes = head.split_off(pos + 4);
                stream_chunk(&mut writer, &mut hasher, &mut body_len, &first_body_bytes).await?;
            }
        }
    }

    writer.write_chunked_body_done().await?;

    let digest = hasher.finalize().iter().map(|byte| format!("{byte:02x}")).collect::<String>();
    let mut trailers = Headers::new();
    trailers.set("x-content-sha256", &digest);
    trailers.set("x-content-length", &body_len.to_string());
    writer.write_trailers(&trailers).await?;
    Ok(())
}

async fn stream_chunk(
    writer: &mut ResponseWriter<TcpStream>,
    hasher: &mut Sha256,
    body_len: &mut usize,
    bytes: &[u8],
) -> Result<(), SendError> {
    if bytes.is_empty() {
        return Ok(());
    }
    hasher.update(bytes);
    *body_len += bytes.len();
    writer.write_chunked_body(bytes).await?;
    Ok(())
}
