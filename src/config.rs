//! Configuration Module
//!
//! Loads cache driver selection, Redis connection parameters and cache
//! TTLs from environment variables.

use std::env;
use std::str::FromStr;

/// Cache subsystem configuration.
///
/// All values can be configured via environment variables with sensible
/// defaults. Drive names are kept as raw strings here and validated by
/// the registry, so an unsupported value is reported against its setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `base.cache_drive`: "memory" or "redis"
    pub cache_drive: String,
    /// `base.queue_drive`: "memory" or "redis"
    pub queue_drive: String,
    /// `redis.address` as `host:port`
    pub redis_address: Option<String>,
    /// `redis.password`
    pub redis_password: Option<String>,
    /// `redis.db`
    pub redis_db: i64,
    /// Per-command Redis timeout in milliseconds
    pub redis_timeout_ms: u64,
    /// In-memory sweep interval in seconds
    pub cleanup_interval: u64,
    /// Primary session token TTL in seconds
    pub session_ttl: i64,
    /// Client session token TTL in seconds
    pub client_session_ttl: i64,
    /// Verification code TTL in seconds
    pub verify_code_ttl: i64,
    /// System monitor TTL in seconds, -1 for no expiry
    pub monitor_ttl: i64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `BASE_CACHE_DRIVE` - Cache backend (default: memory)
    /// - `BASE_QUEUE_DRIVE` - Queue backend (default: memory)
    /// - `REDIS_ADDRESS` - Redis `host:port` (no default)
    /// - `REDIS_PASSWORD` - Redis password (default: none)
    /// - `REDIS_DB` - Redis database index (default: 0)
    /// - `REDIS_TIMEOUT_MS` - Redis command timeout (default: 2000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `SESSION_TTL` - Primary session TTL in seconds (default: 86400)
    /// - `CLIENT_SESSION_TTL` - Client session TTL in seconds (default: 86400)
    /// - `VERIFY_CODE_TTL` - Verification code TTL in seconds (default: 600)
    /// - `MONITOR_TTL` - Monitor TTL in seconds, -1 = never (default: 18000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_drive: string_var("BASE_CACHE_DRIVE").unwrap_or(defaults.cache_drive),
            queue_drive: string_var("BASE_QUEUE_DRIVE").unwrap_or(defaults.queue_drive),
            redis_address: string_var("REDIS_ADDRESS"),
            redis_password: string_var("REDIS_PASSWORD"),
            redis_db: parsed_var("REDIS_DB").unwrap_or(defaults.redis_db),
            redis_timeout_ms: parsed_var("REDIS_TIMEOUT_MS").unwrap_or(defaults.redis_timeout_ms),
            cleanup_interval: parsed_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            session_ttl: parsed_var("SESSION_TTL").unwrap_or(defaults.session_ttl),
            client_session_ttl: parsed_var("CLIENT_SESSION_TTL")
                .unwrap_or(defaults.client_session_ttl),
            verify_code_ttl: parsed_var("VERIFY_CODE_TTL").unwrap_or(defaults.verify_code_ttl),
            monitor_ttl: parsed_var("MONITOR_TTL").unwrap_or(defaults.monitor_ttl),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_drive: "memory".to_string(),
            queue_drive: "memory".to_string(),
            redis_address: None,
            redis_password: None,
            redis_db: 0,
            redis_timeout_ms: 2000,
            cleanup_interval: 60,
            session_ttl: 24 * 3600,
            client_session_ttl: 24 * 3600,
            verify_code_ttl: 600,
            monitor_ttl: 5 * 3600,
        }
    }
}

fn string_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_drive, "memory");
        assert_eq!(config.queue_drive, "memory");
        assert_eq!(config.redis_address, None);
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.verify_code_ttl, 600);
        assert_eq!(config.monitor_ttl, 18_000);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touching the environment, so no cross-test races.
        env::remove_var("BASE_CACHE_DRIVE");
        env::set_var("BASE_QUEUE_DRIVE", "redis");
        env::set_var("REDIS_ADDRESS", "127.0.0.1:6379");
        env::set_var("REDIS_DB", "3");
        env::set_var("MONITOR_TTL", "-1");
        env::set_var("CLEANUP_INTERVAL", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.cache_drive, "memory");
        assert_eq!(config.queue_drive, "redis");
        assert_eq!(config.redis_address.as_deref(), Some("127.0.0.1:6379"));
        assert_eq!(config.redis_db, 3);
        assert_eq!(config.monitor_ttl, -1);
        assert_eq!(config.cleanup_interval, 60);

        for var in [
            "BASE_QUEUE_DRIVE",
            "REDIS_ADDRESS",
            "REDIS_DB",
            "MONITOR_TTL",
            "CLEANUP_INTERVAL",
        ] {
            env::remove_var(var);
        }
    }
}
