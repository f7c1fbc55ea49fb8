//! HTTP request decoder.
//!
//! [`RequestDecoder`] adapts the [`Request`] parse state machine to the
//! [`Decoder`] trait so it can be driven by `FramedRead` (or fed by hand in
//! tests). Each `decode` call runs the state machine over whatever bytes the
//! transport has buffered so far and advances the buffer past what was
//! consumed; `Ok(None)` means more data is needed.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::ensure;
use crate::protocol::{ParseError, ParseState, Request};

/// A decoder producing one complete [`Request`] per connection.
///
/// The partially-parsed request is held across calls, so the decoder must
/// not be reused after it has produced its item.
#[derive(Debug)]
pub struct RequestDecoder {
    request: Option<Request>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { request: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Attempts to decode a request from the buffered bytes.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: the message is complete
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: a fatal parse fault, the connection is unusable
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let request = self.request.get_or_insert_with(Request::new);

        let consumed = request.parse(&src[..])?;
        src.advance(consumed);

        if request.state() == ParseState::Done {
            Ok(self.request.take())
        } else {
            Ok(None)
        }
    }

    /// Called when the transport reaches end of stream.
    ///
    /// A request that is mid-parse at that point is truncated and rejected
    /// with [`ParseError::UnexpectedEof`]; an idle connection that never sent
    /// a byte ends cleanly with `Ok(None)`.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }

        let mid_parse =
            !src.is_empty() || self.request.as_ref().is_some_and(|r| r.state() != ParseState::Initialized);
        ensure!(!mid_parse, ParseError::UnexpectedEof);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const REQUEST: &str = indoc! {"
        POST /api/reports HTTP/1.1\r
        Host: localhost:42069\r
        User-Agent: curl/7.81.0\r
        Accept: */*\r
        Content-Length: 13\r
        \r
        partial=false"};

    fn decode_in_fragments(input: &[u8], fragment_size: usize) -> Request {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::new();

        for fragment in input.chunks(fragment_size) {
            buffer.extend_from_slice(fragment);
            if let Some(request) = decoder.decode(&mut buffer).unwrap() {
                assert!(buffer.is_empty(), "decoder left unconsumed bytes");
                return request;
            }
        }
        panic!("input ended before the request was complete");
    }

    #[test]
    fn split_reads_decode_identically() {
        let whole = decode_in_fragments(REQUEST.as_bytes(), REQUEST.len());

        for fragment_size in [1, 2, 3, 7, 16, 64] {
            let fragmented = decode_in_fragments(REQUEST.as_bytes(), fragment_size);
            assert_eq!(fragmented, whole, "fragment size {fragment_size} changed the result");
        }

        assert_eq!(whole.request_line.method, "POST");
        assert_eq!(whole.request_line.request_target, "/api/reports");
        assert_eq!(whole.headers.get("content-length"), Some("13"));
        assert_eq!(whole.body, b"partial=false");
    }

    #[test]
    fn needs_more_data_until_complete() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: x\r\n"[..]);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"\r\n");
        let request = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(request.request_line.method, "GET");
    }

    #[test]
    fn eof_mid_parse_is_truncation() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: x\r\n"[..]);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        let result = decoder.decode_eof(&mut buffer);

        assert!(matches!(result, Err(ParseError::UnexpectedEof)));
    }

    #[test]
    fn eof_without_any_bytes_is_clean() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::new();

        assert!(decoder.decode_eof(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn parse_error_surfaces_through_decode() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::from(&b"get / HTTP/1.1\r\n"[..]);

        let result = decoder.decode(&mut buffer);

        assert!(matches!(result, Err(ParseError::InvalidMethod { .. })));
    }
}
