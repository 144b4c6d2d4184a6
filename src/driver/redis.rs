//! Redis Driver
//!
//! Remote key-value backend. Expiry is delegated to Redis (`PX`, `PEXPIRE`,
//! `PERSIST`), and every command is bounded by a timeout so a stalled
//! server surfaces as `BackendUnavailable` instead of hanging the caller.

use std::future::Future;
use std::net::Ipv6Addr;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{info, warn};

use crate::cache::Ttl;
use crate::error::{CacheError, Result};

const DEFAULT_PORT: u16 = 6379;

const DELETE_IF_EQ_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

// == Redis Options ==
/// Connection parameters for the remote backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisOptions {
    /// `host:port` of the server
    pub address: String,
    /// Optional AUTH password
    pub password: Option<String>,
    /// Logical database index
    pub db: i64,
    /// Upper bound for a single command, including connecting
    pub timeout: Duration,
}

impl RedisOptions {
    /// Accepts `host`, `host:port`, `[v6]`, `[v6]:port` and a bare IPv6 literal.
    fn connection_info(&self) -> Result<ConnectionInfo> {
        let address = self.address.trim();
        let (host, port) = if let Some(rest) = address.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                CacheError::Configuration(format!(
                    "redis.address: unclosed '[' in '{}'",
                    self.address
                ))
            })?;
            match tail {
                "" => (host, DEFAULT_PORT),
                _ => match tail.strip_prefix(':') {
                    Some(port) => (host, self.parse_port(port)?),
                    None => {
                        return Err(CacheError::Configuration(format!(
                            "redis.address: unexpected '{}' after ']'",
                            tail
                        )))
                    }
                },
            }
        } else if address.parse::<Ipv6Addr>().is_ok() {
            (address, DEFAULT_PORT)
        } else {
            match address.rsplit_once(':') {
                Some((host, port)) => (host, self.parse_port(port)?),
                None => (address, DEFAULT_PORT),
            }
        };
        let host = host.to_string();

        if host.is_empty() {
            return Err(CacheError::Configuration(
                "redis.address: host is empty".to_string(),
            ));
        }

        Ok(ConnectionInfo {
            addr: ConnectionAddr::Tcp(host, port),
            redis: RedisConnectionInfo {
                db: self.db,
                password: self.password.clone().filter(|p| !p.is_empty()),
                ..Default::default()
            },
        })
    }

    fn parse_port(&self, port: &str) -> Result<u16> {
        port.parse::<u16>().map_err(|_| {
            CacheError::Configuration(format!(
                "redis.address: invalid port in '{}'",
                self.address
            ))
        })
    }
}

// == Redis Driver ==
/// Handle to a Redis server. Cloning shares the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisDriver {
    conn: ConnectionManager,
    timeout: Duration,
}

impl std::fmt::Debug for RedisDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDriver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisDriver {
    // == Connect ==
    /// Opens a connection and verifies it with `PING`.
    ///
    /// # Errors
    /// - `Configuration` if the address cannot be parsed
    /// - `BackendUnavailable` if the server cannot be reached in time
    pub async fn connect(options: &RedisOptions) -> Result<Self> {
        let client = redis::Client::open(options.connection_info()?)
            .map_err(|e| CacheError::Configuration(format!("redis: {}", e)))?;

        let conn = bounded(options.timeout, "connect", ConnectionManager::new(client)).await?;
        let driver = Self {
            conn,
            timeout: options.timeout,
        };
        driver.ping().await?;

        info!(address = %options.address, db = options.db, "Connected to Redis");
        Ok(driver)
    }

    /// Round-trips a `PING`.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = self
            .run("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    // == Set ==
    /// Stores a value with server-side expiry.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Ttl) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(d) = ttl.duration() {
            cmd.arg("PX").arg(millis(d));
        }
        let _: () = self.run("SET", cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    // == Get ==
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        self.run("GET", conn.get(key)).await
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = self.run("DEL", conn.del(key)).await?;
        Ok(())
    }

    // == Delete If Equal ==
    /// Compare-and-delete in one server-side script. True if the key was removed.
    pub async fn delete_if_eq(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let mut conn = self.conn.clone();
        let script = redis::Script::new(DELETE_IF_EQ_SCRIPT);
        let removed: i64 = self
            .run(
                "DELETE_IF_EQ",
                script.key(key).arg(expected).invoke_async(&mut conn),
            )
            .await?;
        Ok(removed == 1)
    }

    // == Exists ==
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        self.run("EXISTS", conn.exists(key)).await
    }

    // == Take ==
    /// Atomic get-and-delete via `GETDEL` (Redis 6.2+).
    pub async fn take(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        self.run("GETDEL", redis::cmd("GETDEL").arg(key).query_async(&mut conn))
            .await
    }

    // == Expire ==
    /// Re-arms the expiry of an existing key. Returns false if absent.
    pub async fn expire(&self, key: &str, ttl: Ttl) -> Result<bool> {
        let mut conn = self.conn.clone();
        match ttl.duration() {
            Some(d) => {
                let updated: i64 = self
                    .run(
                        "PEXPIRE",
                        redis::cmd("PEXPIRE")
                            .arg(key)
                            .arg(millis(d))
                            .query_async(&mut conn),
                    )
                    .await?;
                Ok(updated == 1)
            }
            None => {
                // PERSIST answers 0 both for a missing key and for one without a TTL.
                let (exists, _): (i64, i64) = self
                    .run(
                        "PERSIST",
                        redis::pipe()
                            .atomic()
                            .cmd("EXISTS")
                            .arg(key)
                            .cmd("PERSIST")
                            .arg(key)
                            .query_async(&mut conn),
                    )
                    .await?;
                Ok(exists == 1)
            }
        }
    }

    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        bounded(self.timeout, op, fut).await
    }
}

async fn bounded<T, F>(timeout: Duration, op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            let err = CacheError::from(e);
            if err.is_unavailable() {
                warn!(op, error = %err, "Redis unreachable");
            }
            Err(err)
        }
        Err(_) => {
            warn!(op, timeout_ms = timeout.as_millis() as u64, "Redis command timed out");
            Err(CacheError::BackendUnavailable(format!(
                "{} timed out after {:?}",
                op, timeout
            )))
        }
    }
}

/// Whole milliseconds for `PX`/`PEXPIRE`, at least 1 and at most `i64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis())
        .unwrap_or(u64::MAX)
        .clamp(1, i64::MAX as u64)
}
