//! Error types for modelcache

use thiserror::Error;

/// Result type alias for modelcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
///
/// An unsupported payload shape is not an error: it is logged and the entry
/// simply never validates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// `retrieve` was called for a key that is not in the store
    #[error("Key not found in model cache")]
    KeyNotFound,

    /// Capacity must be at least one entry
    #[error("Invalid cache capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// An argument could not be encoded into a cache key
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Malformed configuration document
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
