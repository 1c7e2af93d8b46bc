//! Length-prefixed text wire protocol: requests are framed as an inline
//! array of bulk strings (the convention widely deployed by RESP-style
//! caches), replies as one of three single-line shapes.

mod reader;
mod reply;

pub use reader::{read_request, ProtocolError, Request};
pub use reply::Reply;
