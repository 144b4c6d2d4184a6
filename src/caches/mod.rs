//! Specialized Caches
//!
//! Thin typed wrappers over `ExpiringCache`, one per concern, each with its
//! own namespace and default TTL.

mod monitor;
mod session;
mod settings;
mod verify_code;

pub use monitor::{MonitorCache, MonitorSnapshot, SYSTEM_MONITOR_CACHE};
pub use session::{SessionStore, UserIdentity, CLIENT_USER_TOKEN_CACHE, USER_TOKEN_CACHE};
pub use settings::{SettingsMirror, SYSTEM_SETTING_CACHE};
pub use verify_code::{VerifyCodeIntent, VerifyCodePool, CODE_LENGTH, VERIFY_CODE_CACHE};
