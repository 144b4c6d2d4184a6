//! Time-To-Live Module
//!
//! Per-write expiry policy, including the no-expiry sentinel.

use std::time::Duration;

use crate::error::{CacheError, Result};

/// Configuration value meaning "never expires".
pub const NO_EXPIRY: i64 = -1;

/// Longest accepted TTL (100 years). Anything longer should use `Ttl::Never`.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

// == Ttl ==
/// Expiry applied to an entry at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entry expires once the duration has elapsed
    Expires(Duration),
    /// Entry persists until explicitly deleted
    Never,
}

impl Ttl {
    /// Creates an expiring TTL, rejecting zero and anything above `MAX_TTL`.
    pub fn new(duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(CacheError::InvalidTtl("TTL must be positive".to_string()));
        }
        if duration > MAX_TTL {
            return Err(CacheError::InvalidTtl(format!(
                "{:?} exceeds the maximum of {}s (use {} for no expiry)",
                duration,
                MAX_TTL.as_secs(),
                NO_EXPIRY
            )));
        }
        Ok(Ttl::Expires(duration))
    }

    /// Parses a TTL expressed in seconds, as found in configuration.
    ///
    /// `-1` is the no-expiry sentinel; zero, other negative values and
    /// values above `MAX_TTL` are rejected.
    pub fn from_secs(secs: i64) -> Result<Self> {
        match secs {
            NO_EXPIRY => Ok(Ttl::Never),
            s if s > 0 => Ttl::new(Duration::from_secs(s as u64)),
            s => Err(CacheError::InvalidTtl(format!(
                "{} seconds (use {} for no expiry)",
                s, NO_EXPIRY
            ))),
        }
    }

    /// Returns the duration, or None for the no-expiry sentinel.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Ttl::Expires(d) => Some(*d),
            Ttl::Never => None,
        }
    }
}
