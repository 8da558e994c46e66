//! Redis-backed credential store.

use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use std::time::Duration;

use super::{CredentialStore, StoreError};

/// Credential store backed by a Redis server.
///
/// The connection manager reconnects on its own; every command carries the
/// response timeout so a slow store surfaces as [`StoreError`] instead of
/// hanging the enclosing request.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to the store at `url` (e.g. `redis://localhost:6379`).
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the initial connection fails.
    pub async fn connect(url: &str, response_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::open(url)?;
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(response_timeout)
            .set_response_timeout(response_timeout);
        let connection = ConnectionManager::new_with_config(client, config).await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut connection = self.connection.clone();
        connection.incr(key, 1).await.map_err(StoreError::new)
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection.expire(key, seconds).await.map_err(StoreError::new)
    }

    async fn ttl(&self, key: &str) -> Result<i64, StoreError> {
        let mut connection = self.connection.clone();
        connection.ttl(key).await.map_err(StoreError::new)
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: i64) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection
            .set_ex(key, value, u64::try_from(seconds).unwrap_or(1))
            .await
            .map_err(StoreError::new)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        connection.get(key).await.map_err(StoreError::new)
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        // GETDEL deletes and returns in one round trip; this is the atomic
        // delete-if-present that rotation correctness relies on.
        let mut connection = self.connection.clone();
        redis::cmd("GETDEL")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(StoreError::new)
    }

    async fn del(&self, keys: &[String]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        connection.del(keys).await.map_err(StoreError::new)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection.sadd(key, member).await.map_err(StoreError::new)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection.srem(key, member).await.map_err(StoreError::new)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut connection = self.connection.clone();
        connection.smembers(key).await.map_err(StoreError::new)
    }
}
