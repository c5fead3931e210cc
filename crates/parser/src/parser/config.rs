//! Parser configuration.
//!
//! The only tunable is the chunk size used by the streaming helpers
//! ([`Parser::parse_reader`](crate::parser::Parser::parse_reader) and friends).
//! A process wide default applies to every parser that has no override of its
//! own; it starts at [`DEFAULT_CHUNK_SIZE`].

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ensure;
use crate::protocol::ConfigError;

/// The chunk size used until [`ChunkSize::set_global_default`] is called.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

static GLOBAL_CHUNK_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_CHUNK_SIZE);

/// Number of bytes read from a source before they are fed to the parser.
///
/// Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    pub const DEFAULT: ChunkSize = match NonZeroUsize::new(DEFAULT_CHUNK_SIZE) {
        Some(size) => ChunkSize(size),
        None => panic!("default chunk size must not be zero"),
    };

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChunkSize`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(size).map(ChunkSize).ok_or_else(|| ConfigError::invalid_chunk_size(size))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// The chunk size used by parsers without an override.
    pub fn global_default() -> Self {
        NonZeroUsize::new(GLOBAL_CHUNK_SIZE.load(Ordering::Relaxed)).map_or(Self::DEFAULT, ChunkSize)
    }

    /// Changes the chunk size of every parser without an override, including
    /// ones that already exist.
    pub fn set_global_default(size: ChunkSize) {
        GLOBAL_CHUNK_SIZE.store(size.get(), Ordering::Relaxed);
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self::global_default()
    }
}

impl TryFrom<usize> for ChunkSize {
    type Error = ConfigError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<ChunkSize> for usize {
    fn from(size: ChunkSize) -> Self {
        size.get()
    }
}

/// Accepts any decimal number of at least one, surrounding whitespace is
/// ignored and a fraction is truncated: `"1.5"` is a chunk size of 1.
impl FromStr for ChunkSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().ok().ok_or_else(|| ConfigError::invalid_chunk_size(s))?;
        ensure!(value.is_finite() && value >= 1.0, ConfigError::invalid_chunk_size(s));

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "finite and at least one, truncation is the parsing rule"
        )]
        let size = value.trunc() as usize;
        Self::new(size)
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per parser settings.
///
/// ```
/// use micro_http_parser::parser::{ChunkSize, ParserConfig};
///
/// let config = ParserConfig::new().chunk_size(ChunkSize::new(1024).unwrap());
/// assert_eq!(config.effective_chunk_size().get(), 1024);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    chunk_size: Option<ChunkSize>,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: ChunkSize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Drops the override so the process wide default applies again.
    #[must_use]
    pub fn global_chunk_size(mut self) -> Self {
        self.chunk_size = None;
        self
    }

    /// The override, if one was set.
    pub fn chunk_size_override(&self) -> Option<ChunkSize> {
        self.chunk_size
    }

    pub fn effective_chunk_size(&self) -> ChunkSize {
        self.chunk_size.unwrap_or_else(ChunkSize::global_default)
    }
}
