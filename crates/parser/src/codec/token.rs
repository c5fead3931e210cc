//! The low-level token contract between a grammar recognizer and the parser.
//!
//! A recognizer turns raw bytes into a flat sequence of [`Token`]s. Data tokens
//! are fragments: a single header name, value, URI component or body may be
//! reported through any number of consecutive tokens of the same kind, and the
//! consumer must concatenate them.

use bytes::Bytes;
use http::{Method, Version};

use crate::protocol::MessageKind;

/// Which component of a request target a [`Token::Uri`] fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriPart {
    /// The target up to `?` or `#`.
    Path,
    /// Between `?` and `#`.
    QueryString,
    /// After `#`.
    Fragment,
    /// The whole target without its fragment.
    Uri,
}

/// Everything the start line and header block say about a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// Request method, `None` for responses.
    pub method: Option<Method>,
    /// Response status code, `None` for requests.
    pub status_code: Option<u16>,
    pub version: Version,
    pub keep_alive: bool,
    pub chunked: bool,
    /// The declared `Content-Length`, if any.
    pub content_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    MessageStart,
    Uri(UriPart, Bytes),
    HeaderField(Bytes),
    HeaderValue(Bytes),
    HeadersComplete(Head),
    Body(Bytes),
    MessageComplete,
    /// The stream is malformed. `position` is the stream offset of the first
    /// byte the recognizer could not accept.
    Error { position: u64, reason: String },
}

impl Token {
    pub fn error<S: ToString>(position: u64, reason: S) -> Self {
        Token::Error { position, reason: reason.to_string() }
    }
}

/// A byte-grammar recognizer for HTTP/1.x messages.
///
/// Implementations keep whatever state they need between calls; every call
/// appends the tokens recognized so far to `tokens`. After pushing a
/// [`Token::Error`] a recognizer must not produce further tokens except
/// another error.
pub trait Recognizer {
    /// Whether requests or responses are recognized.
    fn kind(&self) -> MessageKind;

    /// Consumes `input`, appending recognized tokens.
    fn recognize(&mut self, input: &[u8], tokens: &mut Vec<Token>);

    /// Signals the end of input.
    fn finish(&mut self, tokens: &mut Vec<Token>);

    /// Drops all buffered input and state.
    fn reset(&mut self);
}
