//! System Monitor Cache
//!
//! Latest sampled metrics (CPU, memory, disk ...), overwritten by the
//! sampling collector. TTL is configurable; `-1` keeps samples forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{ExpiringCache, Ttl};
use crate::driver::BackendDriver;
use crate::error::Result;

pub const SYSTEM_MONITOR_CACHE: &str = "system_monitor";

// == Monitor Snapshot ==
/// One sampled metric value and when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub sampled_at: DateTime<Utc>,
    pub data: Value,
}

impl MonitorSnapshot {
    /// A snapshot of `data` stamped with the current time.
    pub fn now(data: Value) -> Self {
        Self {
            sampled_at: Utc::now(),
            data,
        }
    }
}

// == Monitor Cache ==
#[derive(Debug, Clone)]
pub struct MonitorCache {
    cache: ExpiringCache<MonitorSnapshot>,
}

impl MonitorCache {
    pub fn new(ttl: Ttl, driver: BackendDriver) -> Self {
        Self {
            cache: ExpiringCache::new(SYSTEM_MONITOR_CACHE, ttl, driver),
        }
    }

    /// Stores a fresh sample for `metric`, replacing the previous one.
    pub async fn record(&self, metric: &str, data: Value) -> Result<MonitorSnapshot> {
        let snapshot = MonitorSnapshot::now(data);
        self.cache.put(metric, &snapshot, None).await?;
        Ok(snapshot)
    }

    /// The most recent sample for `metric`, if still live.
    pub async fn latest(&self, metric: &str) -> Result<Option<MonitorSnapshot>> {
        self.cache.get(metric).await
    }

    pub async fn clear(&self, metric: &str) -> Result<()> {
        self.cache.delete(metric).await
    }

    pub fn cache(&self) -> &ExpiringCache<MonitorSnapshot> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_overwrites_latest() {
        let monitor = MonitorCache::new(Ttl::Never, BackendDriver::from(MemoryDriver::new()));

        monitor.record("cpu", json!({"usage": 12.5})).await.unwrap();
        let second = monitor.record("cpu", json!({"usage": 40.0})).await.unwrap();

        let latest = monitor.latest("cpu").await.unwrap().unwrap();
        assert_eq!(latest, second);
        assert_eq!(latest.data["usage"], json!(40.0));
    }

    #[tokio::test]
    async fn test_clear() {
        let monitor = MonitorCache::new(Ttl::from_secs(60).unwrap(), BackendDriver::from(MemoryDriver::new()));

        monitor.record("disk", json!([{"mount": "/"}])).await.unwrap();
        monitor.clear("disk").await.unwrap();

        assert_eq!(monitor.latest("disk").await.unwrap(), None);
    }
}
