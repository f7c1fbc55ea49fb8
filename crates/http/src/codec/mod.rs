//! Incremental decoding of HTTP requests from byte buffers.

mod request_decoder;

pub use request_decoder::RequestDecoder;
