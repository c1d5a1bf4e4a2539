//! Error types for callcache

use std::fmt;

/// Result type alias for callcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store, conversion and lifecycle failures
///
/// A missing key is not an error: lookups return `Ok(None)`.
#[derive(Debug)]
pub enum Error {
    /// Redis client or server error
    Redis(redis::RedisError),

    /// Other backend failure
    Backend(String),

    /// Command issued against a key holding the wrong kind of value
    WrongType {
        /// Offending key
        key: String,
    },

    /// INCR on a value that is not an integer
    NotAnInteger {
        /// Offending key
        key: String,
    },

    /// Stored bytes could not be converted to the requested type
    Conversion(String),

    /// Store handle is closed
    Closed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Redis(e) => write!(f, "Redis error: {}", e),
            Error::Backend(msg) => write!(f, "Backend error: {}", msg),
            Error::WrongType { key } => {
                write!(f, "Wrong type: key '{}' holds the wrong kind of value", key)
            }
            Error::NotAnInteger { key } => {
                write!(f, "Value at key '{}' is not an integer", key)
            }
            Error::Conversion(msg) => write!(f, "Conversion error: {}", msg),
            Error::Closed => write!(f, "Store is closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Redis(e) => Some(e),
            _ => None,
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Redis(err)
    }
}
