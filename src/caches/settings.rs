//! System Settings Mirror
//!
//! Read-through copy of the persisted system settings. Entries never
//! expire; the settings service rewrites or invalidates them on change.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::cache::{ExpiringCache, Ttl};
use crate::driver::BackendDriver;
use crate::error::Result;

pub const SYSTEM_SETTING_CACHE: &str = "system_setting";

// == Settings Mirror ==
#[derive(Debug, Clone)]
pub struct SettingsMirror {
    cache: ExpiringCache<Value>,
}

impl SettingsMirror {
    pub fn new(driver: BackendDriver) -> Self {
        Self {
            cache: ExpiringCache::new(SYSTEM_SETTING_CACHE, Ttl::Never, driver),
        }
    }

    /// Returns the mirrored value of a setting, decoded as `T`.
    ///
    /// A value that no longer matches `T` counts as a miss.
    pub async fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.cache.get(name).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(typed) => Ok(Some(typed)),
                Err(e) => {
                    warn!(setting = name, error = %e, "Mirrored setting has unexpected shape");
                    self.cache.delete(name).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Mirrors a setting after it was written to the persisted store.
    pub async fn set<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.cache.put(name, &value, None).await
    }

    /// Drops the mirrored copy; the next read goes to the persisted store.
    pub async fn invalidate(&self, name: &str) -> Result<()> {
        self.cache.delete(name).await
    }

    /// Returns the mirrored setting, loading and mirroring it on a miss.
    ///
    /// If the cache backend is unreachable the loader is used directly and
    /// the failure is only logged. Loader errors are returned as-is.
    pub async fn get_or_load<T, F, Fut, E>(&self, name: &str, load: F) -> std::result::Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, E>>,
    {
        match self.get::<T>(name).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(e) => warn!(setting = name, error = %e, "Settings mirror read failed, using store"),
        }

        let loaded = load().await?;
        if let Some(value) = &loaded {
            if let Err(e) = self.set(name, value).await {
                warn!(setting = name, error = %e, "Settings mirror write failed");
            }
        }
        Ok(loaded)
    }

    pub fn cache(&self) -> &ExpiringCache<Value> {
        &self.cache
    }
}
