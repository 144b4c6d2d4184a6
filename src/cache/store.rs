//! Expiring Cache Module
//!
//! Typed, namespaced cache over a `BackendDriver`. Values are serialized
//! with serde_json before they reach the driver.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheStats, Ttl};
use crate::driver::BackendDriver;
use crate::error::{CacheError, Result};

// == Expiring Cache ==
/// A named cache holding values of type `T` with a default TTL.
///
/// Every key is stored as `"{name}:{key}"`, so caches sharing one driver
/// never see each other's entries. Cloning is cheap and clones share
/// statistics.
pub struct ExpiringCache<T> {
    name: Arc<str>,
    default_ttl: Ttl,
    driver: BackendDriver,
    stats: Arc<StatsCounters>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for ExpiringCache<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            default_ttl: self.default_ttl,
            driver: self.driver.clone(),
            stats: Arc::clone(&self.stats),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ExpiringCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("name", &self.name)
            .field("default_ttl", &self.default_ttl)
            .field("driver", &self.driver.kind())
            .finish()
    }
}

impl<T> ExpiringCache<T>
where
    T: Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates a cache named `name` over `driver`.
    pub fn new(name: impl Into<Arc<str>>, default_ttl: Ttl, driver: BackendDriver) -> Self {
        Self {
            name: name.into(),
            default_ttl,
            driver,
            stats: Arc::new(StatsCounters::default()),
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_ttl(&self) -> Ttl {
        self.default_ttl
    }

    /// Current hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Uses `ttl` if given, otherwise the cache's default TTL.
    pub async fn put(&self, key: &str, value: &T, ttl: Option<Ttl>) -> Result<()> {
        let full_key = self.namespaced(key);
        let bytes = serde_json::to_vec(value)?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.driver.set(&full_key, bytes, ttl).await
    }

    // == Get ==
    /// Returns the value for `key`, or None if absent or expired.
    ///
    /// An entry that cannot be decoded is deleted and reported as a miss.
    /// The delete only applies while the stored bytes are still the ones
    /// that failed to decode, so a concurrent `put` is never lost.
    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        let full_key = self.namespaced(key);
        let Some(bytes) = self.driver.get(&full_key).await? else {
            self.stats.record_miss();
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            Err(e) => {
                warn!(cache = %self.name, key, reason = %e, "Dropping undecodable cache entry");
                self.stats.record_corrupt();
                self.stats.record_miss();
                if !self.driver.delete_if_eq(&full_key, &bytes).await? {
                    debug!(cache = %self.name, key, "Undecodable entry already replaced");
                }
                Ok(None)
            }
        }
    }

    /// Like `get`, but surfaces an undecodable entry as `Serialization`
    /// and leaves it in place.
    pub async fn get_strict(&self, key: &str) -> Result<Option<T>> {
        let full_key = self.namespaced(key);
        match self.driver.get(&full_key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)?;
                self.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Get And Delete ==
    /// Atomically removes and returns the value for `key`.
    ///
    /// When several callers race on one key, exactly one receives the value.
    pub async fn get_and_delete(&self, key: &str) -> Result<Option<T>> {
        let full_key = self.namespaced(key);
        match self.driver.take(&full_key).await? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.stats.record_hit();
                    Ok(Some(value))
                }
                Err(e) => {
                    warn!(cache = %self.name, key, reason = %e, "Consumed undecodable cache entry");
                    self.stats.record_corrupt();
                    self.stats.record_miss();
                    Ok(None)
                }
            },
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Delete ==
    /// Removes `key`. Absent keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.namespaced(key);
        self.driver.delete(&full_key).await
    }

    /// Returns true if `key` holds a live entry.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let full_key = self.namespaced(key);
        self.driver.exists(&full_key).await
    }

    // == Touch ==
    /// Sets a new expiry for an existing entry without rewriting its value.
    ///
    /// # Errors
    /// `NotFound` if the key is absent or already expired.
    pub async fn touch(&self, key: &str, ttl: Ttl) -> Result<()> {
        let full_key = self.namespaced(key);
        if self.driver.expire(&full_key, ttl).await? {
            debug!(cache = %self.name, key, ?ttl, "Entry expiry re-armed");
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.name, key)
    }
}
