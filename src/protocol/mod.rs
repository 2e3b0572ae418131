//! The HTTP surface observed by clients
//!
//! One response per connection: a `multipart/x-mixed-replace` preamble
//! written immediately on accept, followed by an unbounded sequence of JPEG
//! parts. The client's request is never read or parsed; sessions discard
//! inbound bytes as they arrive.

pub mod response;

pub use response::{part_header, BOUNDARY, PART_TRAILER, RESPONSE_PREAMBLE};
