//! Verification Code Pool
//!
//! Short-lived, single-use codes (email confirmation, password reset).
//! Consumption goes through an atomic get-and-delete, so a code verifies
//! at most once even when two requests race.

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{ExpiringCache, Ttl};
use crate::driver::BackendDriver;
use crate::error::Result;

pub const VERIFY_CODE_CACHE: &str = "verify_code";

/// Length of generated codes.
pub const CODE_LENGTH: usize = 6;

// == Verify Code Intent ==
/// What a code authorizes, and for whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyCodeIntent {
    /// Account the code was sent to, e.g. an email address
    pub target: String,
    /// Action being confirmed, e.g. "register"
    #[serde(default)]
    pub action: String,
}

impl VerifyCodeIntent {
    pub fn new(target: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            action: action.into(),
        }
    }
}

// == Verify Code Pool ==
#[derive(Debug, Clone)]
pub struct VerifyCodePool {
    cache: ExpiringCache<VerifyCodeIntent>,
}

impl VerifyCodePool {
    pub fn new(ttl: Ttl, driver: BackendDriver) -> Self {
        Self {
            cache: ExpiringCache::new(VERIFY_CODE_CACHE, ttl, driver),
        }
    }

    /// Generates a fresh alphanumeric code, stores it and returns it.
    pub async fn issue(&self, intent: &VerifyCodeIntent) -> Result<String> {
        let code: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(CODE_LENGTH)
            .map(char::from)
            .collect::<String>()
            .to_uppercase();
        self.store(&code, intent).await?;
        debug!(action = %intent.action, "Verification code issued");
        Ok(code)
    }

    /// Stores a caller-chosen code.
    pub async fn store(&self, code: &str, intent: &VerifyCodeIntent) -> Result<()> {
        self.cache.put(code, intent, None).await
    }

    /// Redeems a code. Returns its intent on the first call only.
    pub async fn consume(&self, code: &str) -> Result<Option<VerifyCodeIntent>> {
        self.cache.get_and_delete(code).await
    }

    /// Redeems a code only if it was issued for `target` and `action`.
    ///
    /// A code presented for the wrong target is still burned, so it cannot
    /// be retried against other targets.
    pub async fn verify(&self, code: &str, target: &str, action: &str) -> Result<bool> {
        Ok(self
            .consume(code)
            .await?
            .map(|intent| intent.target == target && intent.action == action)
            .unwrap_or(false))
    }

    /// Reads a code without redeeming it.
    pub async fn peek(&self, code: &str) -> Result<Option<VerifyCodeIntent>> {
        self.cache.get(code).await
    }

    pub fn cache(&self) -> &ExpiringCache<VerifyCodeIntent> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;
    use std::time::Duration;

    fn pool(ttl: Ttl) -> VerifyCodePool {
        VerifyCodePool::new(ttl, BackendDriver::from(MemoryDriver::new()))
    }

    #[tokio::test]
    async fn test_issue_then_consume_once() {
        let pool = pool(Ttl::from_secs(300).unwrap());
        let intent = VerifyCodeIntent::new("email@x", "register");

        let code = pool.issue(&intent).await.unwrap();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));

        assert_eq!(pool.peek(&code).await.unwrap(), Some(intent.clone()));
        assert_eq!(pool.consume(&code).await.unwrap(), Some(intent));
        assert_eq!(pool.consume(&code).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_verify_checks_target_and_burns_code() {
        let pool = pool(Ttl::from_secs(300).unwrap());
        pool.store("ABC123", &VerifyCodeIntent::new("a@x", "reset"))
            .await
            .unwrap();

        assert!(!pool.verify("ABC123", "b@x", "reset").await.unwrap());
        assert!(!pool.verify("ABC123", "a@x", "reset").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_success() {
        let pool = pool(Ttl::from_secs(300).unwrap());
        pool.store("ABC123", &VerifyCodeIntent::new("a@x", "reset"))
            .await
            .unwrap();

        assert!(pool.verify("ABC123", "a@x", "reset").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let pool = pool(Ttl::Expires(Duration::from_millis(50)));
        pool.store("OLD", &VerifyCodeIntent::new("a@x", "reset"))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(pool.consume("OLD").await.unwrap(), None);
    }
}
