//! Cache Module
//!
//! Generic expiring cache engine: typed values, per-write TTL and key
//! namespacing over a pluggable backend driver.

mod entry;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::ExpiringCache;
pub use ttl::{Ttl, MAX_TTL, NO_EXPIRY};
