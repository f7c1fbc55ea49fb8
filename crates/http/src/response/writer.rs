//! The ordered response writer.
//!
//! [`ResponseWriter`] owns the connection's write side for the lifetime of
//! one response and emits exact HTTP/1.1 wire bytes. Every operation checks
//! the writer's [`WriteState`] first: calling out of order is a
//! [`SendError`] and performs no I/O, so a protocol violation can never
//! corrupt the stream.

use std::io::Write;

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::ensure;
use crate::protocol::{Headers, SendError};
use crate::response::StatusCode;

/// Initial capacity of the staging buffer each operation serializes into.
const INIT_BUFFER_SIZE: usize = 4 * 1024;

/// The wire sections already written.
///
/// `write_chunked_body`, `write_chunked_body_done` and `write_trailers` all
/// operate within `HeadersWritten` and do not advance the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Init,
    StatusLineWritten,
    HeadersWritten,
    BodyWritten,
}

/// Writes one HTTP/1.1 response onto an owned sink.
///
/// The writer takes ownership of its sink; dropping the writer releases the
/// underlying connection on every exit path, including handler faults.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    buffer: BytesMut,
    state: WriteState,
    chunked_body_done: bool,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(INIT_BUFFER_SIZE),
            state: WriteState::Init,
            chunked_body_done: false,
        }
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Emits `HTTP/1.1 <code> <reason>\r\n`. Legal only as the first write.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), SendError> {
        self.expect_state("write_status_line", WriteState::Init)?;

        self.buffer.clear();
        write!(BufWriter(&mut self.buffer), "HTTP/1.1 {} {}\r\n", status, status.reason_phrase())?;
        self.flush_buffer().await?;

        self.state = WriteState::StatusLineWritten;
        Ok(())
    }

    /// Emits one `<name>: <value>` line per entry, in unspecified order,
    /// followed by the blank line that terminates the header section.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), SendError> {
        self.expect_state("write_headers", WriteState::StatusLineWritten)?;

        self.buffer.clear();
        put_header_lines(&mut self.buffer, headers);
        self.buffer.extend_from_slice(b"\r\n");
        self.flush_buffer().await?;

        self.state = WriteState::HeadersWritten;
        Ok(())
    }

    /// Writes the plain response body verbatim.
    ///
    /// The writer does not check the payload against the declared
    /// `Content-Length`; keeping them consistent is the caller's job.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, SendError> {
        self.expect_state("write_body", WriteState::HeadersWritten)?;

        self.writer.write_all(body).await?;
        self.writer.flush().await?;

        self.state = WriteState::BodyWritten;
        Ok(body.len())
    }

    /// Emits one chunk: `<hex-length>\r\n<payload>\r\n`.
    ///
    /// The length prefix is lowercase hexadecimal. An empty payload is a
    /// valid call that writes nothing, since a zero-length frame would read
    /// as the stream terminator.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize, SendError> {
        self.expect_state("write_chunked_body", WriteState::HeadersWritten)?;
        ensure!(!self.chunked_body_done, SendError::ChunkedBodyTerminated);

        if chunk.is_empty() {
            return Ok(0);
        }

        self.buffer.clear();
        write!(BufWriter(&mut self.buffer), "{:x}\r\n", chunk.len())?;
        self.buffer.extend_from_slice(chunk);
        self.buffer.extend_from_slice(b"\r\n");
        self.flush_buffer().await?;

        Ok(chunk.len())
    }

    /// Emits the final `0\r\n` chunk marker.
    ///
    /// The terminating CRLF of the message is not written here: the trailer
    /// section supplies it, even when there are no trailer fields.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), SendError> {
        self.expect_state("write_chunked_body_done", WriteState::HeadersWritten)?;
        ensure!(!self.chunked_body_done, SendError::ChunkedBodyTerminated);

        self.writer.write_all(b"0\r\n").await?;
        self.writer.flush().await?;

        self.chunked_body_done = true;
        Ok(())
    }

    /// Emits the trailer section: each entry as a generic header line, then
    /// the terminating blank line.
    ///
    /// Legal only after [`write_chunked_body_done`](Self::write_chunked_body_done).
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), SendError> {
        self.expect_state("write_trailers", WriteState::HeadersWritten)?;
        ensure!(self.chunked_body_done, SendError::TrailersBeforeLastChunk);

        self.buffer.clear();
        put_header_lines(&mut self.buffer, trailers);
        self.buffer.extend_from_slice(b"\r\n");
        self.flush_buffer().await?;

        Ok(())
    }

    /// Access to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    fn expect_state(&self, operation: &'static str, expected: WriteState) -> Result<(), SendError> {
        ensure!(self.state == expected, SendError::out_of_order(operation, self.state));
        Ok(())
    }

    async fn flush_buffer(&mut self) -> Result<(), SendError> {
        self.writer.write_all(&self.buffer).await?;
        Ok(self.writer.flush().await?)
    }
}

/// Headers the server answers with unless the handler says otherwise.
///
/// Each entry can be replaced or removed by the caller before
/// [`ResponseWriter::write_headers`].
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("content-length", &content_len.to_string());
    headers.set("connection", "close");
    headers.set("content-type", "text/plain");
    headers
}

fn put_header_lines(dst: &mut BytesMut, headers: &Headers) {
    for (name, value) in headers.iter() {
        dst.extend_from_slice(name.as_bytes());
        dst.extend_from_slice(b": ");
        dst.extend_from_slice(value.as_bytes());
        dst.extend_from_slice(b"\r\n");
    }
}

/// io::Write adapter over the staging buffer, for `write!` formatting.
struct BufWriter<'a>(&'a mut BytesMut);

impl Write for BufWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    // Mock IO capturing everything the writer emits
    #[derive(Debug, Default)]
    struct MockIO {
        write_data: Vec<u8>,
    }

    impl AsyncWrite for MockIO {
        fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
            self.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    fn mock_writer() -> ResponseWriter<MockIO> {
        ResponseWriter::new(MockIO::default())
    }

    #[tokio::test]
    async fn writes_full_plain_response() {
        let mut writer = mock_writer();

        writer.write_status_line(StatusCode::OK).await.unwrap();
        let mut headers = Headers::new();
        headers.set("content-length", "2");
        writer.write_headers(&headers).await.unwrap();
        let written = writer.write_body(b"hi").await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(writer.state(), WriteState::BodyWritten);
        assert_eq!(writer.get_mut().write_data, b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nhi");
    }

    #[tokio::test]
    async fn unrecognized_status_has_empty_reason() {
        let mut writer = mock_writer();

        writer.write_status_line(StatusCode::from_u16(418)).await.unwrap();

        assert_eq!(writer.get_mut().write_data, b"HTTP/1.1 418 \r\n");
    }

    #[tokio::test]
    async fn body_before_headers_is_rejected_without_io() {
        let mut writer = mock_writer();

        let result = writer.write_body(b"hi").await;

        assert!(matches!(
            result,
            Err(SendError::OutOfOrder { operation: "write_body", state: WriteState::Init })
        ));
        assert!(writer.get_mut().write_data.is_empty());
    }

    #[tokio::test]
    async fn second_status_line_is_rejected() {
        let mut writer = mock_writer();
        writer.write_status_line(StatusCode::OK).await.unwrap();

        let result = writer.write_status_line(StatusCode::OK).await;

        assert!(matches!(result, Err(SendError::OutOfOrder { .. })));
        assert_eq!(writer.get_mut().write_data, b"HTTP/1.1 200 OK\r\n");
    }

    #[tokio::test]
    async fn chunk_wire_format() {
        let mut writer = mock_writer();
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();
        writer.get_mut().write_data.clear();

        let written = writer.write_chunked_body(b"hi").await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(writer.get_mut().write_data, b"2\r\nhi\r\n");

        writer.get_mut().write_data.clear();
        writer.write_chunked_body_done().await.unwrap();
        assert_eq!(writer.get_mut().write_data, b"0\r\n");
    }

    #[tokio::test]
    async fn chunk_length_is_lowercase_hex() {
        let mut writer = mock_writer();
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();
        writer.get_mut().write_data.clear();

        let payload = [b'x'; 26];
        writer.write_chunked_body(&payload).await.unwrap();

        assert!(writer.get_mut().write_data.starts_with(b"1a\r\n"));
    }

    #[tokio::test]
    async fn empty_chunk_is_a_payload_no_op() {
        let mut writer = mock_writer();
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();
        writer.get_mut().write_data.clear();

        let written = writer.write_chunked_body(b"").await.unwrap();

        assert_eq!(written, 0);
        assert!(writer.get_mut().write_data.is_empty());
    }

    #[tokio::test]
    async fn trailers_require_terminated_chunk_stream() {
        let mut writer = mock_writer();
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();

        let mut trailers = Headers::new();
        trailers.set("x-content-length", "0");

        let early = writer.write_trailers(&trailers).await;
        assert!(matches!(early, Err(SendError::TrailersBeforeLastChunk)));

        writer.write_chunked_body_done().await.unwrap();
        writer.get_mut().write_data.clear();
        writer.write_trailers(&trailers).await.unwrap();

        assert_eq!(writer.get_mut().write_data, b"x-content-length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn chunk_after_terminator_is_rejected() {
        let mut writer = mock_writer();
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();
        writer.write_chunked_body_done().await.unwrap();

        let result = writer.write_chunked_body(b"late").await;

        assert!(matches!(result, Err(SendError::ChunkedBodyTerminated)));
    }

    #[tokio::test]
    async fn default_headers_are_overridable() {
        let mut headers = default_headers(42);
        assert_eq!(headers.get("content-length"), Some("42"));
        assert_eq!(headers.get("connection"), Some("close"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));

        headers.replace("content-type", "text/html");
        headers.remove("content-length");

        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("content-length"), None);
    }
}
