//! Session Token Store
//!
//! Maps opaque login tokens to the authenticated user. One store per client
//! role; the stores are namespaced apart, so a token issued for one role
//! never authenticates against the other.

use serde::{Deserialize, Serialize};

use crate::cache::{ExpiringCache, Ttl};
use crate::driver::BackendDriver;
use crate::error::Result;

/// Cache name of the primary (admin panel) user sessions.
pub const USER_TOKEN_CACHE: &str = "user_token";
/// Cache name of the secondary client-user sessions.
pub const CLIENT_USER_TOKEN_CACHE: &str = "client_user_token";

// == User Identity ==
/// Who a session token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: i32,
}

impl UserIdentity {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            username: String::new(),
            role: 0,
        }
    }
}

// == Session Store ==
#[derive(Debug, Clone)]
pub struct SessionStore {
    cache: ExpiringCache<UserIdentity>,
}

impl SessionStore {
    pub fn new(name: &str, ttl: Ttl, driver: BackendDriver) -> Self {
        Self {
            cache: ExpiringCache::new(name, ttl, driver),
        }
    }

    /// Records a new login session.
    pub async fn insert(&self, token: &str, user: &UserIdentity) -> Result<()> {
        self.cache.put(token, user, None).await
    }

    /// Records a session with a lifetime other than the default, e.g. "remember me".
    pub async fn insert_with_ttl(&self, token: &str, user: &UserIdentity, ttl: Ttl) -> Result<()> {
        self.cache.put(token, user, Some(ttl)).await
    }

    /// Resolves a token to its user, None if unknown or expired.
    pub async fn lookup(&self, token: &str) -> Result<Option<UserIdentity>> {
        self.cache.get(token).await
    }

    /// Restarts the session's lifetime from now.
    ///
    /// # Errors
    /// `NotFound` if the session no longer exists.
    pub async fn refresh(&self, token: &str) -> Result<()> {
        self.cache.touch(token, self.cache.default_ttl()).await
    }

    /// Ends the session (logout).
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.cache.delete(token).await
    }

    /// The underlying typed cache.
    pub fn cache(&self) -> &ExpiringCache<UserIdentity> {
        &self.cache
    }
}
