//! HTTP/1.1 implemented directly on raw TCP streams
//!
//! This crate implements the HTTP/1.1 wire protocol from scratch on top of
//! tokio byte streams: an incremental request parser that is correct under
//! arbitrary read fragmentation, a response writer that enforces the legal
//! ordering of status line, headers, body and trailers, and a connection
//! dispatcher that wires both to a user handler.
//!
//! # Features
//!
//! - Incremental HTTP/1.1 request parsing over partial reads
//! - Case-insensitive header collection with duplicate merging
//! - Ordered response writing (status line, headers, body)
//! - Chunked transfer encoding with trailer support
//! - One task per connection, graceful listener shutdown
//!
//! # Example
//!
//! ```no_run
//! use tokio::net::TcpStream;
//! use wire_http::handler::make_handler;
//! use wire_http::protocol::Request;
//! use wire_http::response::{default_headers, ResponseWriter, StatusCode};
//! use wire_http::server::serve;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = serve(8080, make_handler(hello_world)).await.expect("bind server error");
//!     tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
//!     server.close();
//! }
//!
//! async fn hello_world(mut writer: ResponseWriter<TcpStream>, _request: Request) {
//!     let body = b"Hello World!\r\n";
//!     let _ = writer.write_status_line(StatusCode::OK).await;
//!     let _ = writer.write_headers(&default_headers(body.len())).await;
//!     let _ = writer.write_body(body).await;
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`protocol`]: Protocol types for requests, headers and errors
//! - [`codec`]: Incremental request decoding over byte buffers
//! - [`response`]: Response writer state machine and status codes
//! - [`connection`]: Per-connection lifecycle management
//! - [`handler`]: Request handler trait and utilities
//! - [`server`]: Listener, accept loop and shutdown
//!
//! # Limitations
//!
//! - HTTP/1.1 only, one request per connection (no keep-alive, no pipelining)
//! - No TLS support (use a reverse proxy for HTTPS)
//! - `Content-Length` is the only header the parser interprets

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod response;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
