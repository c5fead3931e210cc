//! Byte level recognition of HTTP/1.x messages.
//!
//! The codec layer turns raw bytes into [`Token`]s for the
//! [`Parser`](crate::parser::Parser):
//!
//! - [`Recognizer`]: the token contract any grammar recognizer fulfils
//! - [`H1Recognizer`]: the built-in recognizer
//!   - head parsing via the `header` module (`httparse` underneath)
//!   - body framing via the `body` module (length, chunked, until end of input)
//! - [`DecodeError`]: why a byte stream was rejected
//!
//! # Example
//!
//! ```
//! use micro_http_parser::codec::{H1Recognizer, Recognizer, Token};
//!
//! let mut recognizer = H1Recognizer::request();
//! let mut tokens = Vec::new();
//! recognizer.recognize(b"GET / HTTP/1.1\r\n\r\n", &mut tokens);
//!
//! assert_eq!(tokens.first(), Some(&Token::MessageStart));
//! assert_eq!(tokens.last(), Some(&Token::MessageComplete));
//! ```

mod body;
mod error;
mod header;
mod recognizer;
mod token;

pub use body::PayloadDecoder;
pub use error::DecodeError;
pub use header::{HeadDecoder, ParsedHead};
pub use recognizer::H1Recognizer;
pub use token::{Head, Recognizer, Token, UriPart};
