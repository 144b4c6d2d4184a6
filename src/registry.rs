//! Cache Registry
//!
//! Selects the backend driver from configuration once at startup and
//! builds every specialized cache over it. The returned `Caches` bundle is
//! the only way application code reaches the cache layer.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::cache::Ttl;
use crate::caches::{
    MonitorCache, SessionStore, SettingsMirror, VerifyCodePool, CLIENT_USER_TOKEN_CACHE,
    USER_TOKEN_CACHE,
};
use crate::config::Config;
use crate::driver::{BackendDriver, MemoryDriver, RedisDriver, RedisOptions};
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweep_task, SweepHandle};

// == Drive ==
/// Backend kind selectable through `base.cache_drive` / `base.queue_drive`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Drive {
    #[default]
    Memory,
    Redis,
}

impl FromStr for Drive {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "memory" => Ok(Drive::Memory),
            "redis" => Ok(Drive::Redis),
            other => Err(format!(
                "unsupported drive '{}' (expected \"memory\" or \"redis\")",
                other
            )),
        }
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drive::Memory => write!(f, "memory"),
            Drive::Redis => write!(f, "redis"),
        }
    }
}

fn parse_drive(setting: &str, value: &str) -> Result<Drive> {
    value
        .parse()
        .map_err(|reason| CacheError::Configuration(format!("{}: {}", setting, reason)))
}

fn parse_ttl(setting: &str, secs: i64) -> Result<Ttl> {
    Ttl::from_secs(secs).map_err(|e| CacheError::Configuration(format!("{}: {}", setting, e)))
}

fn redis_options(config: &Config) -> Result<RedisOptions> {
    let address = config.redis_address.clone().ok_or_else(|| {
        CacheError::Configuration(
            "redis.address: required when a drive is set to \"redis\"".to_string(),
        )
    })?;

    Ok(RedisOptions {
        address,
        password: config.redis_password.clone(),
        db: config.redis_db,
        timeout: Duration::from_millis(config.redis_timeout_ms.max(1)),
    })
}

// == Caches ==
/// Process-wide cache handles. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct Caches {
    /// Primary user session tokens
    pub users: SessionStore,
    /// Client-user session tokens
    pub client_users: SessionStore,
    /// Single-use verification codes
    pub verify_codes: VerifyCodePool,
    /// System settings mirror
    pub settings: SettingsMirror,
    /// System monitor samples
    pub monitor: MonitorCache,
    /// Drive selected for the queue layer
    pub queue_drive: Drive,
    driver: BackendDriver,
    redis: Option<RedisDriver>,
}

impl Caches {
    /// Builds the five caches over an already constructed driver.
    pub fn with_driver(config: &Config, driver: BackendDriver) -> Result<Self> {
        Ok(Self {
            users: SessionStore::new(
                USER_TOKEN_CACHE,
                parse_ttl("session_ttl", config.session_ttl)?,
                driver.clone(),
            ),
            client_users: SessionStore::new(
                CLIENT_USER_TOKEN_CACHE,
                parse_ttl("client_session_ttl", config.client_session_ttl)?,
                driver.clone(),
            ),
            verify_codes: VerifyCodePool::new(
                parse_ttl("verify_code_ttl", config.verify_code_ttl)?,
                driver.clone(),
            ),
            settings: SettingsMirror::new(driver.clone()),
            monitor: MonitorCache::new(parse_ttl("monitor_ttl", config.monitor_ttl)?, driver.clone()),
            queue_drive: parse_drive("base.queue_drive", &config.queue_drive)?,
            redis: match &driver {
                BackendDriver::Redis(r) => Some(r.clone()),
                BackendDriver::Memory(_) => None,
            },
            driver,
        })
    }

    /// The driver every cache in this bundle is built on.
    pub fn driver(&self) -> &BackendDriver {
        &self.driver
    }

    /// The Redis connection, if either drive selected Redis.
    pub fn redis(&self) -> Option<&RedisDriver> {
        self.redis.as_ref()
    }
}

// == Cache Runtime ==
/// The cache bundle together with the background work it owns.
#[derive(Debug)]
pub struct CacheRuntime {
    pub caches: Caches,
    sweep: Option<SweepHandle>,
}

impl CacheRuntime {
    /// Stops the expiry sweep, if one is running, and waits for it.
    pub async fn shutdown(self) {
        if let Some(sweep) = self.sweep {
            sweep.shutdown().await;
        }
        info!("Cache subsystem stopped");
    }
}

// == Init ==
/// Reads the drive settings, builds the driver and all caches.
///
/// # Errors
/// - `Configuration` for an unsupported drive name, a missing Redis address
///   or an invalid TTL
/// - `BackendUnavailable` if Redis was selected but does not answer
pub async fn init_caches(config: &Config) -> Result<CacheRuntime> {
    let cache_drive = parse_drive("base.cache_drive", &config.cache_drive)?;
    let queue_drive = parse_drive("base.queue_drive", &config.queue_drive)?;

    let redis = if cache_drive == Drive::Redis || queue_drive == Drive::Redis {
        Some(RedisDriver::connect(&redis_options(config)?).await?)
    } else {
        None
    };

    let (driver, memory) = match (cache_drive, redis.clone()) {
        (Drive::Redis, Some(r)) => (BackendDriver::Redis(r), None),
        _ => {
            let memory = MemoryDriver::new();
            (BackendDriver::Memory(memory.clone()), Some(memory))
        }
    };

    let mut caches = Caches::with_driver(config, driver)?;
    caches.redis = redis;

    let sweep = memory.map(|memory| {
        let every = Duration::from_secs(config.cleanup_interval.max(1));
        spawn_sweep_task(memory, every)
    });

    info!(%cache_drive, %queue_drive, "Cache subsystem initialized");
    Ok(CacheRuntime { caches, sweep })
}
