//! Backend Driver Module
//!
//! Raw byte storage with per-key expiry. Drivers know nothing of cache
//! semantics; TTL policy and namespacing live in `ExpiringCache`.
//!
//! ```text
//! BackendDriver (enum)       <- picked once at startup, no vtable
//!   ├── Memory(MemoryDriver) <- sharded in-process table, swept periodically
//!   └── Redis(RedisDriver)   <- remote service, expiry enforced server-side
//! ```

mod memory;
mod redis;

pub use self::memory::MemoryDriver;
pub use self::redis::{RedisDriver, RedisOptions};

use crate::cache::Ttl;
use crate::error::Result;

// == Backend Driver ==
/// Storage backend shared by every cache built over it.
#[derive(Debug, Clone)]
pub enum BackendDriver {
    Memory(MemoryDriver),
    Redis(RedisDriver),
}

impl BackendDriver {
    /// Short name of the variant, as used in configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendDriver::Memory(_) => "memory",
            BackendDriver::Redis(_) => "redis",
        }
    }

    /// Stores a value, replacing any previous one. `Ttl::Never` persists it.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Ttl) -> Result<()> {
        match self {
            BackendDriver::Memory(m) => {
                m.set(key, value, ttl);
                Ok(())
            }
            BackendDriver::Redis(r) => r.set(key, value, ttl).await,
        }
    }

    /// Returns the value, or None if absent or expired.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self {
            BackendDriver::Memory(m) => Ok(m.get(key)),
            BackendDriver::Redis(r) => r.get(key).await,
        }
    }

    /// Removes the key. Absent keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        match self {
            BackendDriver::Memory(m) => {
                m.delete(key);
                Ok(())
            }
            BackendDriver::Redis(r) => r.delete(key).await,
        }
    }

    /// Removes the key only while it still holds `expected`. True if removed.
    pub async fn delete_if_eq(&self, key: &str, expected: &[u8]) -> Result<bool> {
        match self {
            BackendDriver::Memory(m) => Ok(m.delete_if_eq(key, expected)),
            BackendDriver::Redis(r) => r.delete_if_eq(key, expected).await,
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self {
            BackendDriver::Memory(m) => Ok(m.exists(key)),
            BackendDriver::Redis(r) => r.exists(key).await,
        }
    }

    /// Atomically removes and returns the value.
    pub async fn take(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self {
            BackendDriver::Memory(m) => Ok(m.take(key)),
            BackendDriver::Redis(r) => r.take(key).await,
        }
    }

    /// Re-arms the expiry of a live key without rewriting it. False if absent.
    pub async fn expire(&self, key: &str, ttl: Ttl) -> Result<bool> {
        match self {
            BackendDriver::Memory(m) => Ok(m.expire(key, ttl)),
            BackendDriver::Redis(r) => r.expire(key, ttl).await,
        }
    }

    /// The in-process table, if this is the memory variant.
    pub fn as_memory(&self) -> Option<&MemoryDriver> {
        match self {
            BackendDriver::Memory(m) => Some(m),
            BackendDriver::Redis(_) => None,
        }
    }
}

impl From<MemoryDriver> for BackendDriver {
    fn from(driver: MemoryDriver) -> Self {
        BackendDriver::Memory(driver)
    }
}

impl From<RedisDriver> for BackendDriver {
    fn from(driver: RedisDriver) -> Self {
        BackendDriver::Redis(driver)
    }
}
