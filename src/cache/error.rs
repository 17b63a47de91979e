//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// None of these reach an HTTP caller: the resolver logs them and treats
/// the lookup as a miss (or skips the write).
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid cache location: {0}")]
    InvalidLocation(String),
}

impl CacheError {
    /// Short machine-readable label, logged as `error_kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Operation(_) => "operation",
            CacheError::Connection(_) => "connection",
            CacheError::Serialization(_) => "serialization",
            CacheError::InvalidLocation(_) => "invalid_location",
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        CacheError::Operation(error.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Serialization(error.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            CacheError::Connection(error.to_string())
        } else {
            CacheError::Operation(error.to_string())
        }
    }
}
