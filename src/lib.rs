//! Panel Cache - expiring key-value caches for an admin dashboard backend
//!
//! Session tokens, verification codes and mirrored system state, stored
//! in process memory or in Redis with per-entry TTL.

pub mod cache;
pub mod caches;
pub mod config;
pub mod driver;
pub mod error;
pub mod registry;
pub mod tasks;

pub use cache::{ExpiringCache, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};
pub use registry::{init_caches, CacheRuntime, Caches, Drive};
