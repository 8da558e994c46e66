//! In-memory credential store for tests and embedded deployments.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{CredentialStore, StoreError};

enum Value {
    Counter(i64),
    Text(String),
    Set(HashSet<String>),
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Credential store held in process memory.
///
/// Implements the same TTL and atomicity contract as [`RedisStore`]: expired
/// entries are dropped on access, and `take` is serialized by the inner lock.
///
/// [`RedisStore`]: super::RedisStore
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::new(anyhow::anyhow!("store lock poisoned")))
    }
}

fn drop_if_expired(entries: &mut HashMap<String, Entry>, key: &str) {
    if entries.get(key).is_some_and(Entry::expired) {
        entries.remove(key);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            value: Value::Counter(0),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Counter(count) => {
                *count += 1;
                Ok(*count)
            }
            _ => Err(StoreError::new(anyhow::anyhow!(
                "key holds a non-counter value"
            ))),
        }
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        if let Some(entry) = entries.get_mut(key) {
            let seconds = u64::try_from(seconds).unwrap_or(0);
            entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        match entries.get(key) {
            None => Ok(-2),
            Some(Entry {
                expires_at: None, ..
            }) => Ok(-1),
            Some(Entry {
                expires_at: Some(deadline),
                ..
            }) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                // Clamped so a live key never reports a zero TTL.
                Ok(i64::try_from(remaining.as_secs()).unwrap_or(i64::MAX).max(1))
            }
        }
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: i64) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        let seconds = u64::try_from(seconds).unwrap_or(0);
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + Duration::from_secs(seconds)),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        match entries.get(key) {
            Some(Entry {
                value: Value::Text(value),
                ..
            }) => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        match entries.remove(key) {
            Some(Entry {
                value: Value::Text(value),
                ..
            }) => Ok(Some(value)),
            Some(entry) => {
                entries.insert(key.to_string(), entry);
                Err(StoreError::new(anyhow::anyhow!(
                    "key holds a non-text value"
                )))
            }
            None => Ok(None),
        }
    }

    async fn del(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            value: Value::Set(HashSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            _ => Err(StoreError::new(anyhow::anyhow!(
                "key holds a non-set value"
            ))),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        if let Some(Entry {
            value: Value::Set(members),
            ..
        }) = entries.get_mut(key)
        {
            members.remove(member);
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut entries = self.lock()?;
        drop_if_expired(&mut entries, key);
        match entries.get(key) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.iter().cloned().collect()),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn incr_counts_from_one() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        assert_eq!(store.incr("counter").await?, 1);
        assert_eq!(store.incr("counter").await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn set_ex_expires_entries() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.set_ex("key", "value", 1).await?;
        assert_eq!(store.get("key").await?.as_deref(), Some("value"));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(store.get("key").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn take_removes_the_entry() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.set_ex("key", "value", 60).await?;
        assert_eq!(store.take("key").await?.as_deref(), Some("value"));
        assert_eq!(store.take("key").await?, None);
        assert_eq!(store.get("key").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn ttl_reports_absence_and_remaining_time() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        assert_eq!(store.ttl("missing").await?, -2);
        store.incr("counter").await?;
        assert_eq!(store.ttl("counter").await?, -1);
        store.expire("counter", 30).await?;
        let remaining = store.ttl("counter").await?;
        assert!(remaining > 0 && remaining <= 30);
        Ok(())
    }

    #[tokio::test]
    async fn set_membership_round_trip() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.sadd("set", "a").await?;
        store.sadd("set", "b").await?;
        store.srem("set", "a").await?;
        assert_eq!(store.smembers("set").await?, vec!["b".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn expired_counter_restarts_window() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.incr("counter").await?;
        store.expire("counter", 1).await?;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(store.incr("counter").await?, 1);
        Ok(())
    }
}
