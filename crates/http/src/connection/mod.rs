//! Per-connection lifecycle management.
//!
//! [`HttpConnection`] owns one transport stream and processes exactly one
//! request on it: parse to completion, hand the request and a
//! [`ResponseWriter`] to the handler, close. There is no keep-alive and no
//! pipelining; the connection ends when the handler returns (or earlier on a
//! parse fault).

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::error;

use crate::handler::Handler;
use crate::protocol::{HttpError, Request};
use crate::response::{ResponseWriter, StatusCode, default_headers};

const BAD_REQUEST_PAGE: &[u8] = b"<html>\n<head><title>400 Bad Request</title></head>\n<body><h1>Bad Request</h1></body>\n</html>\n";

/// One accepted connection, from first byte to close.
#[derive(Debug)]
pub struct HttpConnection<S> {
    stream: S,
}

impl<S> HttpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Parses the request and invokes the handler.
    ///
    /// The writer moves into the handler call, so the write side of the
    /// stream is released whenever the handler finishes, panics aside. A
    /// parse fault answers with a best-effort canned 400 page and reports
    /// the original error.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler<S>,
    {
        let request = match Request::from_reader(&mut self.stream).await {
            Ok(request) => request,
            Err(e) => {
                error!(cause = %e, "can't parse request, answering 400");
                if let Err(write_error) = respond_bad_request(self.stream).await {
                    error!(cause = %write_error, "can't write error response");
                }
                return Err(e.into());
            }
        };

        let writer = ResponseWriter::new(self.stream);
        handler.call(writer, request).await;
        Ok(())
    }
}

/// Best-effort canned error page for unparseable requests.
async fn respond_bad_request<S>(stream: S) -> Result<(), HttpError>
where
    S: AsyncWrite + Unpin,
{
    let mut writer = ResponseWriter::new(stream);
    writer.write_status_line(StatusCode::BAD_REQUEST).await?;
    let mut headers = default_headers(BAD_REQUEST_PAGE.len());
    headers.replace("content-type", "text/html");
    writer.write_headers(&headers).await?;
    writer.write_body(BAD_REQUEST_PAGE).await?;
    Ok(())
}
