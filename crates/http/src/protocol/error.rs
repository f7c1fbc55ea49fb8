use crate::response::WriteState;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Errors produced while parsing a request from the wire.
///
/// All of these are fatal for the current request: parsing aborts and no
/// request is returned.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("invalid http method: {method:?}")]
    InvalidMethod { method: String },

    #[error("invalid http version: {version:?}")]
    InvalidVersion { version: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body length {received} exceeds declared content-length {declared}")]
    BodyOverrun { declared: usize, received: usize },

    #[error("unexpected end of stream while parsing request")]
    UnexpectedEof,

    #[error("parse called after request was complete")]
    ParseAfterDone,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors produced while writing a response to the wire.
///
/// Sequencing faults are usage errors returned to the immediate caller; no
/// bytes are written for them.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("{operation} called in state {state:?}")]
    OutOfOrder { operation: &'static str, state: WriteState },

    #[error("chunked body already terminated")]
    ChunkedBodyTerminated,

    #[error("trailers written before the chunked body was terminated")]
    TrailersBeforeLastChunk,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn out_of_order(operation: &'static str, state: WriteState) -> Self {
        Self::OutOfOrder { operation, state }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
