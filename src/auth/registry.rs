//! Refresh-token session registry.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

use super::error::AuthError;
use crate::store::CredentialStore;

const REFRESH_PREFIX: &str = "refresh:";
const SESSIONS_PREFIX: &str = "sessions:";

fn refresh_key(token: &str) -> String {
    format!("{REFRESH_PREFIX}{token}")
}

fn sessions_key(subject: &str) -> String {
    format!("{SESSIONS_PREFIX}{subject}")
}

/// Generate a high-entropy opaque refresh token (256 bits, url-safe base64).
fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Transient(err.into()))?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Owns the refresh-token lifecycle: issuance, single-use rotation, and
/// revocation against the per-subject session index.
///
/// Only the `refresh:<token>` mapping is authoritative for validity; the
/// `sessions:<subject>` index exists for bulk revocation and may be
/// transiently stale under concurrent issue/revoke.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn CredentialStore>,
    refresh_ttl_seconds: i64,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, refresh_ttl_seconds: i64) -> Self {
        Self {
            store,
            refresh_ttl_seconds,
        }
    }

    /// Issue a fresh refresh token for `subject` and record it in the
    /// subject's session index, refreshing the index TTL.
    ///
    /// # Errors
    /// Returns [`AuthError::Transient`] if the store is unreachable.
    pub async fn issue(&self, subject: &str) -> Result<String, AuthError> {
        let token = generate_refresh_token()?;
        self.store
            .set_ex(&refresh_key(&token), subject, self.refresh_ttl_seconds)
            .await?;
        let index = sessions_key(subject);
        self.store.sadd(&index, &token).await?;
        self.store.expire(&index, self.refresh_ttl_seconds).await?;
        Ok(token)
    }

    /// Redeem a refresh token, consuming it.
    ///
    /// `Ok(None)` covers never-issued, already-rotated, and expired tokens
    /// alike. On success the mapping is already gone before this returns, so
    /// a concurrent redemption of the same token observes `None`.
    ///
    /// # Errors
    /// Returns [`AuthError::Transient`] if the store is unreachable; a store
    /// timeout is never reported as `None`.
    pub async fn redeem(&self, token: &str) -> Result<Option<String>, AuthError> {
        let Some(subject) = self.store.take(&refresh_key(token)).await? else {
            return Ok(None);
        };
        self.store.srem(&sessions_key(&subject), token).await?;
        Ok(Some(subject))
    }

    /// Revoke a single refresh token; a no-op if it does not exist.
    ///
    /// # Errors
    /// Returns [`AuthError::Transient`] if the store is unreachable.
    pub async fn revoke_one(&self, token: &str) -> Result<(), AuthError> {
        self.redeem(token).await.map(|_| ())
    }

    /// Revoke every live refresh token of `subject` and drop the index.
    ///
    /// Tolerates an empty or already-expired index.
    ///
    /// # Errors
    /// Returns [`AuthError::Transient`] if the store is unreachable.
    pub async fn revoke_all(&self, subject: &str) -> Result<(), AuthError> {
        let index = sessions_key(subject);
        let tokens = self.store.smembers(&index).await?;
        if !tokens.is_empty() {
            let keys: Vec<String> = tokens.iter().map(|token| refresh_key(token)).collect();
            self.store.del(&keys).await?;
        }
        self.store.del(std::slice::from_ref(&index)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(MemoryStore::new()), 3600)
    }

    #[tokio::test]
    async fn issue_then_redeem_returns_the_subject() -> Result<(), AuthError> {
        let registry = registry();
        let token = registry.issue("alice").await?;
        assert_eq!(registry.redeem(&token).await?.as_deref(), Some("alice"));
        Ok(())
    }

    #[tokio::test]
    async fn redeemed_token_is_never_redeemable_again() -> Result<(), AuthError> {
        let registry = registry();
        let token = registry.issue("alice").await?;
        assert!(registry.redeem(&token).await?.is_some());
        assert!(registry.redeem(&token).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_redeems_to_none() -> Result<(), AuthError> {
        assert!(registry().redeem("never-issued").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_redemption_yields_exactly_one_success() -> Result<(), AuthError> {
        let registry = registry();
        let token = registry.issue("alice").await?;

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let registry = registry.clone();
            let token = token.clone();
            tasks.spawn(async move { registry.redeem(&token).await });
        }

        let mut successes = 0;
        while let Some(result) = tasks.join_next().await {
            if result.expect("redeem task panicked")?.is_some() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        Ok(())
    }

    #[tokio::test]
    async fn revoke_all_invalidates_every_live_token() -> Result<(), AuthError> {
        let registry = registry();
        let first = registry.issue("alice").await?;
        let second = registry.issue("alice").await?;
        let other = registry.issue("bob").await?;

        registry.revoke_all("alice").await?;

        assert!(registry.redeem(&first).await?.is_none());
        assert!(registry.redeem(&second).await?.is_none());
        assert_eq!(registry.redeem(&other).await?.as_deref(), Some("bob"));
        Ok(())
    }

    #[tokio::test]
    async fn revoke_all_tolerates_an_empty_index() -> Result<(), AuthError> {
        registry().revoke_all("nobody").await
    }

    #[tokio::test]
    async fn revoke_one_is_idempotent() -> Result<(), AuthError> {
        let registry = registry();
        let token = registry.issue("alice").await?;
        registry.revoke_one(&token).await?;
        registry.revoke_one(&token).await?;
        assert!(registry.redeem(&token).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn tokens_are_unique_and_high_entropy() -> Result<(), AuthError> {
        let registry = registry();
        let first = registry.issue("alice").await?;
        let second = registry.issue("alice").await?;
        assert_ne!(first, second);
        // 32 random bytes encode to 43 characters of unpadded base64.
        assert_eq!(first.len(), 43);
        Ok(())
    }
}
