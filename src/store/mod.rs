//! Credential store abstraction.
//!
//! A narrow key-value capability set (counters with TTL, expiring string
//! entries, set membership) backed by Redis in production and by an
//! in-memory map in tests. Absence of a key is always reported as a
//! definitive `None`/`0`; connectivity failures and timeouts surface as
//! [`StoreError`] and are never conflated with absence.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

/// The store is unreachable or timed out.
///
/// Callers must treat this as a transient infrastructure failure, not as a
/// negative lookup.
#[derive(Debug, Error)]
#[error("credential store unavailable")]
pub struct StoreError(#[source] anyhow::Error);

impl StoreError {
    pub(crate) fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(err.into())
    }
}

/// Key-value operations required by the session registry and rate limiter.
///
/// All operations must be safe under concurrent invocation from multiple
/// request handlers; per-key atomicity of `take` is the serialization point
/// for refresh-token rotation.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Atomically increment a counter, creating it at zero first.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Set a key's time to live in seconds.
    async fn expire(&self, key: &str, seconds: i64) -> Result<(), StoreError>;

    /// Remaining time to live in seconds, `-1` without expiry, `-2` if absent.
    async fn ttl(&self, key: &str) -> Result<i64, StoreError>;

    /// Store a string value with a TTL in seconds.
    async fn set_ex(&self, key: &str, value: &str, seconds: i64) -> Result<(), StoreError>;

    /// Fetch a string value.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Atomically delete a key and return its prior value, if any.
    ///
    /// Two concurrent calls on the same key observe at most one `Some`.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Delete keys; missing keys are ignored.
    async fn del(&self, keys: &[String]) -> Result<(), StoreError>;

    /// Add a member to a set.
    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Remove a member from a set; a no-op if absent.
    async fn srem(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// All members of a set; empty if the set is absent.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;
}
