use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// The error type a callback returns to abort parsing of the current chunk.
pub type CallbackError = Box<dyn StdError + Send + Sync>;

/// The result type every event handler returns.
pub type CallbackResult = Result<(), CallbackError>;

/// A captured callback failure, shared between the parser and the returned error.
pub type CallbackException = Arc<dyn StdError + Send + Sync>;

/// The wrapped failure returned by [`Parser::feed`](crate::parser::Parser::feed) and friends.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failure during parsing of chunk: callback failed: {source}")]
    Callback { source: CallbackException },

    #[error("failure during parsing of chunk: {reason} at byte {position}")]
    Protocol { position: u64, reason: String },

    #[error("parser has failed before and must be discarded")]
    Terminated,

    #[error("parser fed from inside one of its own callbacks")]
    Reentrant,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn callback(source: CallbackException) -> Self {
        Self::Callback { source }
    }

    pub fn protocol<S: ToString>(position: u64, reason: S) -> Self {
        Self::Protocol { position, reason: reason.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if the byte stream itself was rejected, as opposed to a
    /// callback failing while the stream was being processed.
    pub fn is_internal_parser_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Returns true if an application callback failed.
    pub fn is_callback_error(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("buffer size must be a number greater than 0, got: {value}")]
    InvalidChunkSize { value: String },
}

impl ConfigError {
    pub fn invalid_chunk_size<S: ToString>(value: S) -> Self {
        Self::InvalidChunkSize { value: value.to_string() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeadersError {
    #[error("odd number of arguments for headers: {len}")]
    OddArguments { len: usize },
}

/// Raised by the assemblers when the events they receive break the
/// field/value alternation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("invalid state for parsing header {token}s")]
    InvalidHeaderState { token: &'static str },
}

impl AssemblyError {
    pub fn invalid_header_state(token: &'static str) -> Self {
        Self::InvalidHeaderState { token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_failures_share_the_chunk_message() {
        let protocol = ParseError::protocol(0, "invalid method");
        assert!(protocol.is_internal_parser_error());
        assert!(protocol.to_string().starts_with("failure during parsing of chunk"));

        let source: CallbackException = Arc::from(CallbackError::from("boom"));
        let callback = ParseError::callback(source);
        assert!(!callback.is_internal_parser_error());
        assert!(callback.is_callback_error());
        assert!(callback.to_string().starts_with("failure during parsing of chunk"));
        assert!(callback.to_string().contains("boom"));
    }

    #[test]
    fn chunk_size_message() {
        let e = ConfigError::invalid_chunk_size("s");
        assert!(e.to_string().contains("buffer size must be a number greater than 0"));
    }
}
