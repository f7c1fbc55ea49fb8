//! Listener, accept loop and shutdown.
//!
//! [`serve`] binds a TCP listener and runs the accept loop on its own task,
//! spawning one task per accepted connection. The returned [`Server`] handle
//! only shuts the listener down; connections already being processed drain
//! naturally as their I/O completes.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;

/// A handle to a running server.
///
/// The closed flag is the only state shared between this handle and the
/// accept loop; it is read by the loop and written by [`Server::close`].
#[derive(Debug)]
pub struct Server {
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    local_addr: SocketAddr,
}

/// Binds `port` and starts accepting connections in the background.
///
/// Every accepted connection is processed on its own task by an
/// [`HttpConnection`] driving `handler`. Bind `port` 0 to let the OS pick
/// one; [`Server::local_addr`] reports the result.
pub async fn serve<H>(port: u16, handler: H) -> io::Result<Server>
where
    H: Handler<TcpStream> + 'static,
{
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let local_addr = listener.local_addr()?;

    let closed = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(Notify::new());
    let handler = Arc::new(handler);

    {
        let closed = closed.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            accept_loop(listener, handler, closed, shutdown).await;
        });
    }

    info!(port = local_addr.port(), "server listening");
    Ok(Server { closed, shutdown, local_addr })
}

impl Server {
    /// Stops accepting connections and closes the listener.
    ///
    /// Idempotent: calling it again after the listener is gone is a no-op.
    /// In-flight connection tasks are not terminated.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
        info!("server closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

async fn accept_loop<H>(listener: TcpListener, handler: Arc<H>, closed: Arc<AtomicBool>, shutdown: Arc<Notify>)
where
    H: Handler<TcpStream> + 'static,
{
    loop {
        let (tcp_stream, _remote_addr) = select! {
            accepted = listener.accept() => match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    if closed.load(Ordering::SeqCst) {
                        return;
                    }
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            },
            // close() dropped us a permit; the listener closes with this task
            _ = shutdown.notified() => return,
        };

        let handler = handler.clone();
        tokio::spawn(async move {
            let connection = HttpConnection::new(tcp_stream);
            match connection.process(handler).await {
                Ok(()) => {
                    info!("finished processing, connection shutdown");
                }
                Err(e) => {
                    error!(cause = %e, "connection closed with error");
                }
            }
        });
    }
}
