//! In-Memory Driver
//!
//! Process-local key-value table with per-entry expiry. Sharded through
//! `DashMap`, so a sweep only ever holds one shard lock at a time.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::cache::{CacheEntry, Ttl};

// == Memory Driver ==
/// Shared in-process table. Cloning yields another handle to the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryDriver {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a value, replacing any previous entry and resetting its TTL.
    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Ttl) {
        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Returns a copy of the value if present and unexpired.
    ///
    /// An expired entry met here is removed, unless a writer replaced it
    /// in the meantime.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired_at(now) {
                return Some(entry.value.clone());
            }
        }
        self.remove_if_expired(key);
        None
    }

    // == Delete ==
    /// Removes the key. Absent keys are ignored.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes the key only if it still holds `expected`. True if removed.
    pub fn delete_if_eq(&self, key: &str, expected: &[u8]) -> bool {
        self.entries
            .remove_if(key, |_, entry| entry.value == expected)
            .is_some()
    }

    // == Exists ==
    /// Returns true if the key is present and unexpired.
    pub fn exists(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Take ==
    /// Atomically removes and returns the value if present and unexpired.
    ///
    /// Of several concurrent callers on one key, at most one gets the value.
    pub fn take(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        match self.entries.remove(key) {
            Some((_, entry)) if !entry.is_expired_at(now) => Some(entry.value),
            _ => None,
        }
    }

    // == Expire ==
    /// Re-arms the expiry of a live entry. Returns false if absent or expired.
    pub fn expire(&self, key: &str, ttl: Ttl) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.rearm(ttl);
                true
            }
            _ => false,
        }
    }

    // == Sweep ==
    /// Physically removes every expired entry and returns how many went.
    ///
    /// Expiry is evaluated under each shard's write lock, so an entry that a
    /// writer refreshed before the shard was reached is kept.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries physically held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_if_expired(&self, key: &str) {
        self.entries.remove_if(key, |_, entry| entry.is_expired());
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn short() -> Ttl {
        Ttl::Expires(Duration::from_millis(50))
    }

    #[test]
    fn test_set_and_get() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v1".to_vec(), Ttl::from_secs(60).unwrap());

        assert_eq!(driver.get("k"), Some(b"v1".to_vec()));
        assert!(driver.exists("k"));
        assert_eq!(driver.len(), 1);
    }

    #[test]
    fn test_overwrite_resets_value() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v1".to_vec(), short());
        driver.set("k", b"v2".to_vec(), Ttl::from_secs(60).unwrap());

        sleep(Duration::from_millis(80));

        assert_eq!(driver.get("k"), Some(b"v2".to_vec()));
        assert_eq!(driver.len(), 1);
    }

    #[test]
    fn test_get_expired_removes_entry() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v".to_vec(), short());

        sleep(Duration::from_millis(80));

        assert!(!driver.exists("k"));
        assert_eq!(driver.len(), 1, "exists must not mutate");
        assert_eq!(driver.get("k"), None);
        assert_eq!(driver.len(), 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v".to_vec(), Ttl::Never);
        driver.delete("k");
        driver.delete("k");

        assert!(driver.is_empty());
    }

    #[test]
    fn test_take_once() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v".to_vec(), Ttl::from_secs(60).unwrap());

        assert_eq!(driver.take("k"), Some(b"v".to_vec()));
        assert_eq!(driver.take("k"), None);
    }

    #[test]
    fn test_take_expired_returns_none() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v".to_vec(), short());

        sleep(Duration::from_millis(80));

        assert_eq!(driver.take("k"), None);
        assert!(driver.is_empty());
    }

    #[test]
    fn test_expire_absent_and_expired() {
        let driver = MemoryDriver::new();
        assert!(!driver.expire("missing", Ttl::from_secs(10).unwrap()));

        driver.set("k", b"v".to_vec(), short());
        sleep(Duration::from_millis(80));
        assert!(!driver.expire("k", Ttl::from_secs(10).unwrap()));
    }

    #[test]
    fn test_expire_extends_live_entry() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v".to_vec(), short());
        assert!(driver.expire("k", Ttl::from_secs(60).unwrap()));

        sleep(Duration::from_millis(80));

        assert_eq!(driver.get("k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let driver = MemoryDriver::new();
        driver.set("gone", b"1".to_vec(), short());
        driver.set("kept", b"2".to_vec(), Ttl::from_secs(60).unwrap());
        driver.set("forever", b"3".to_vec(), Ttl::Never);

        sleep(Duration::from_millis(80));

        assert_eq!(driver.sweep(), 1);
        assert_eq!(driver.len(), 2);
        assert!(driver.exists("kept"));
        assert!(driver.exists("forever"));
    }

    #[test]
    fn test_delete_if_eq_keeps_replaced_value() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v1".to_vec(), Ttl::Never);
        driver.set("k", b"v2".to_vec(), Ttl::Never);

        assert!(!driver.delete_if_eq("k", b"v1"));
        assert_eq!(driver.get("k"), Some(b"v2".to_vec()));

        assert!(driver.delete_if_eq("k", b"v2"));
        assert!(driver.is_empty());
        assert!(!driver.delete_if_eq("k", b"v2"));
    }

    #[test]
    fn test_sweep_spares_rewritten_entry() {
        let driver = MemoryDriver::new();
        driver.set("k", b"old".to_vec(), short());

        sleep(Duration::from_millis(80));
        driver.set("k", b"new".to_vec(), Ttl::from_secs(60).unwrap());

        assert_eq!(driver.sweep(), 0);
        assert_eq!(driver.get("k"), Some(b"new".to_vec()));
    }

    #[test]
    fn test_set_with_huge_ttl_does_not_panic() {
        let driver = MemoryDriver::new();
        driver.set("k", b"v".to_vec(), Ttl::Expires(Duration::MAX));

        assert_eq!(driver.get("k"), Some(b"v".to_vec()));
        assert!(driver.expire("k", Ttl::Expires(Duration::MAX)));
        assert_eq!(driver.sweep(), 0);
    }

    #[test]
    fn test_clones_share_table() {
        let a = MemoryDriver::new();
        let b = a.clone();
        a.set("k", b"v".to_vec(), Ttl::Never);

        assert_eq!(b.get("k"), Some(b"v".to_vec()));
    }
}
