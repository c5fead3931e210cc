//! Start line and header block decoding.
//!
//! [`HeadDecoder`] parses a complete head with `httparse`, enforces the size
//! limits and works out how the body that follows is framed.

mod head_decoder;

pub use head_decoder::{HeadDecoder, ParsedHead};
