//! Body decoders, one per framing a message head can select.
//!
//! - [`PayloadDecoder`]: picks the strategy from a [`PayloadSize`](crate::protocol::PayloadSize)
//! - `ChunkedDecoder`: chunked transfer coding
//! - `LengthDecoder`: `Content-Length` bodies
//!
//! All of them yield [`PayloadItem`](crate::protocol::PayloadItem)s as soon as
//! bytes are available, so a body is usually reported in several pieces.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use payload_decoder::PayloadDecoder;
