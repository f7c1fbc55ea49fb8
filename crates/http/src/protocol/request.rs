//! HTTP request parsing.
//!
//! A [`Request`] is built incrementally: [`Request::parse`] accepts whatever
//! prefix of the message has arrived so far, consumes as much of it as the
//! current [`ParseState`] allows, and reports how many bytes it took. The
//! transport never has to align reads with protocol boundaries; a request
//! split into single-byte reads parses identically to one delivered whole.
//!
//! [`Request::from_reader`] is the transport-facing driving loop: it reads
//! from an [`AsyncRead`] into an accumulation buffer and feeds the parser
//! until the request is complete.

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::RequestDecoder;
use crate::ensure;
use crate::protocol::{Headers, ParseError, find_crlf};

/// Initial capacity of the per-connection accumulation buffer. It grows as
/// needed, so this bounds nothing.
const INIT_BUFFER_SIZE: usize = 1024;

/// The parser's position within the message.
///
/// Transitions are monotonic: `Initialized` to `ParsingHeaders` to
/// `ParsingBody` to `Done`, and no state is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    /// No bytes consumed yet.
    #[default]
    Initialized,
    /// Request line consumed, accumulating header lines.
    ParsingHeaders,
    /// Header section terminated, accumulating body bytes.
    ParsingBody,
    /// Message complete. Parsing further data is an error.
    Done,
}

/// The first line of a request: method, target and version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// Uppercase-letters-only token, e.g. `GET`.
    pub method: String,
    /// Opaque path plus query string, stored verbatim.
    pub request_target: String,
    /// Always `1.1`; any other version is rejected during parsing.
    pub http_version: String,
}

/// A single parsed HTTP request on one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
    state: ParseState,
}

impl Request {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Reads one complete request from `reader`.
    ///
    /// Bytes are accumulated in a growable buffer and run through the parse
    /// state machine after every read; consumed bytes are shifted out so the
    /// transport may fragment the message arbitrarily.
    ///
    /// # Errors
    ///
    /// Any parse fault aborts with the corresponding [`ParseError`]. End of
    /// stream before the message is complete is a fatal
    /// [`ParseError::UnexpectedEof`]: a truncated request is never silently
    /// accepted as a complete one.
    pub async fn from_reader<R>(reader: &mut R) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut framed = FramedRead::with_capacity(reader, RequestDecoder::new(), INIT_BUFFER_SIZE);
        match framed.next().await {
            Some(Ok(request)) => Ok(request),
            Some(Err(e)) => Err(e),
            // the stream ended before a single request byte arrived
            None => Err(ParseError::UnexpectedEof),
        }
    }

    /// Runs the state machine against `data`, stepping until a step consumes
    /// nothing (more input is needed) or the message is complete.
    ///
    /// Returns the total number of bytes consumed; the caller must not feed
    /// them again.
    ///
    /// # Errors
    ///
    /// Calling this on a request that is already [`ParseState::Done`] is a
    /// usage fault reported as [`ParseError::ParseAfterDone`].
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        ensure!(self.state != ParseState::Done, ParseError::ParseAfterDone);

        let mut consumed = 0;
        while self.state != ParseState::Done {
            let n = self.parse_single(&data[consumed..])?;
            consumed += n;
            if n == 0 {
                break;
            }
        }
        Ok(consumed)
    }

    /// One state-machine step over the unconsumed prefix.
    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParseState::Initialized => {
                let Some((request_line, consumed)) = parse_request_line(data)? else {
                    return Ok(0);
                };
                self.request_line = request_line;
                self.state = ParseState::ParsingHeaders;
                Ok(consumed)
            }

            ParseState::ParsingHeaders => {
                let (consumed, section_done) = self.headers.parse_line(data)?;
                if section_done {
                    self.state = ParseState::ParsingBody;
                }
                Ok(consumed)
            }

            ParseState::ParsingBody => {
                let Some(declared) = self.headers.get("content-length") else {
                    // no declared body: the message is complete as-is, do
                    // not wait for end of stream
                    self.state = ParseState::Done;
                    return Ok(0);
                };
                let declared = declared
                    .parse::<usize>()
                    .map_err(|_| ParseError::invalid_content_length(format!("value {declared:?} is not a non-negative integer")))?;

                self.body.extend_from_slice(data);
                ensure!(
                    self.body.len() <= declared,
                    ParseError::BodyOverrun { declared, received: self.body.len() }
                );
                if self.body.len() == declared {
                    self.state = ParseState::Done;
                }
                // the body step always claims the whole input it was given
                Ok(data.len())
            }

            ParseState::Done => Err(ParseError::ParseAfterDone),
        }
    }
}

/// Parses the request line, returning `None` when no full line has arrived.
fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(line_end) = find_crlf(data) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&data[..line_end])
        .map_err(|_| ParseError::invalid_request_line("request line is not valid utf-8"))?;

    let parts = line.split(' ').collect::<Vec<_>>();
    ensure!(
        parts.len() == 3,
        ParseError::invalid_request_line(format!("expected 3 space-separated parts, got {}", parts.len()))
    );
    let (method, target, version) = (parts[0], parts[1], parts[2]);

    ensure!(
        !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase()),
        ParseError::InvalidMethod { method: method.to_string() }
    );
    ensure!(version == "HTTP/1.1", ParseError::InvalidVersion { version: version.to_string() });

    let request_line = RequestLine {
        method: method.to_string(),
        request_target: target.to_string(),
        http_version: "1.1".to_string(),
    };
    Ok(Some((request_line, line_end + 2)))
}
