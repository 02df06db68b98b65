//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Absence of a key is never an error: lookups return `Option` and
/// deletions return `bool`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Invalid construction arguments
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A write carried a TTL that is zero or negative
    #[error("Invalid TTL: {0}ms (must be greater than 0)")]
    InvalidTtl(i64),

    /// The key is not tracked by the cache
    #[error("Key not found")]
    KeyNotFound,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CacheError::InvalidConfig("max_items must be at least 1".to_string()).to_string(),
            "Invalid configuration: max_items must be at least 1"
        );
        assert_eq!(
            CacheError::InvalidTtl(-5).to_string(),
            "Invalid TTL: -5ms (must be greater than 0)"
        );
        assert_eq!(CacheError::KeyNotFound.to_string(), "Key not found");
    }
}
