//! Fixed-window login rate limiting.

use std::sync::Arc;

use super::error::AuthError;
use crate::store::CredentialStore;

const COUNTER_PREFIX: &str = "rl:login:";

/// Outcome of a rate-limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: i64 },
}

/// Counts login attempts per client identifier inside a fixed window.
///
/// The counter is incremented before the limit is evaluated, so a rejected
/// attempt still consumes a slot and counts are never rolled back. Bursts at
/// window boundaries can admit up to twice the limit across the boundary;
/// that approximation is accepted.
#[derive(Clone)]
pub struct LoginRateLimiter {
    store: Arc<dyn CredentialStore>,
    limit: i64,
    window_seconds: i64,
}

impl LoginRateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, limit: i64, window_seconds: i64) -> Self {
        Self {
            store,
            limit,
            window_seconds,
        }
    }

    /// Record an attempt for `client_id` and decide whether it may proceed.
    ///
    /// # Errors
    /// Returns [`AuthError::Transient`] if the store is unreachable.
    pub async fn check(&self, client_id: &str) -> Result<RateLimitDecision, AuthError> {
        let key = format!("{COUNTER_PREFIX}{client_id}");
        let count = self.store.incr(&key).await?;
        if count == 1 {
            // First attempt in the window; the counter self-expires.
            self.store.expire(&key, self.window_seconds).await?;
        }
        if count > self.limit {
            let retry_after = self.store.ttl(&key).await?.max(1);
            return Ok(RateLimitDecision::Limited { retry_after });
        }
        Ok(RateLimitDecision::Allowed)
    }
}
