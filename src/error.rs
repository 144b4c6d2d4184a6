//! Error types for the cache subsystem
//!
//! Provides unified error handling using thiserror. A cache miss is not an
//! error: reads report misses as `Ok(None)`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for drivers, caches and the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key absent or expired where an existing entry was required
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Remote backend could not be reached or did not answer in time
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Remote backend answered with an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Negative or zero TTL that is not the no-expiry sentinel
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Unsupported or incomplete drive configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CacheError {
    /// Returns true if the backend could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::BackendUnavailable(_))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
            CacheError::BackendUnavailable(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(CacheError::from(err), CacheError::Serialization(_)));
    }

    #[test]
    fn test_is_unavailable() {
        assert!(CacheError::BackendUnavailable("down".into()).is_unavailable());
        assert!(!CacheError::NotFound("k".into()).is_unavailable());
    }

    #[test]
    fn test_display_names_the_setting() {
        let err = CacheError::Configuration("base.cache_drive: unsupported drive 'mongo'".into());
        assert!(err.to_string().contains("base.cache_drive"));
    }
}
