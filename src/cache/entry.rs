//! Cache Entry Module
//!
//! Defines the structure stored by the in-memory driver for each key.

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::cache::Ttl;

// == Cache Entry ==
/// A serialized value with its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The serialized value
    pub value: Vec<u8>,
    /// Wall-clock creation time
    pub created_at: DateTime<Utc>,
    /// Monotonic expiry deadline, None = no expiration
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry whose expiry starts now.
    pub fn new(value: Vec<u8>, ttl: Ttl) -> Self {
        Self {
            value,
            created_at: Utc::now(),
            expires_at: deadline(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal
    /// to its deadline. Entries without a deadline never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a fixed instant, so a scan uses one clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Re-arm ==
    /// Replaces the expiry deadline without touching the value.
    pub fn rearm(&mut self, ttl: Ttl) {
        self.expires_at = deadline(ttl);
    }
}

/// A deadline past what the clock can represent is treated as no deadline.
fn deadline(ttl: Ttl) -> Option<Instant> {
    ttl.duration().and_then(|d| Instant::now().checked_add(d))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_no_expiry() {
        let entry = CacheEntry::new(b"v".to_vec(), Ttl::Never);

        assert_eq!(entry.value, b"v");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(b"v".to_vec(), Ttl::Expires(Duration::from_millis(50)));
        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_rearm_extends_deadline() {
        let mut entry = CacheEntry::new(b"v".to_vec(), Ttl::Expires(Duration::from_millis(50)));
        entry.rearm(Ttl::from_secs(60).unwrap());

        sleep(Duration::from_millis(80));

        assert!(!entry.is_expired());
        assert!(entry.expires_at.unwrap() > Instant::now() + Duration::from_secs(50));
    }

    #[test]
    fn test_unrepresentable_deadline_does_not_panic() {
        let mut entry = CacheEntry::new(b"v".to_vec(), Ttl::Expires(Duration::MAX));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());

        entry.rearm(Ttl::Expires(Duration::MAX));
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_rearm_to_never() {
        let mut entry = CacheEntry::new(b"v".to_vec(), Ttl::from_secs(1).unwrap());
        entry.rearm(Ttl::Never);
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry {
            value: b"v".to_vec(),
            created_at: Utc::now(),
            expires_at: Some(now),
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
    }
}
