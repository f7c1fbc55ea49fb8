//! Response construction: status codes and the ordered response writer.

mod status;
mod writer;

pub use status::StatusCode;
pub use writer::{ResponseWriter, WriteState, default_headers};
