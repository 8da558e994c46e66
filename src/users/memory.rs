//! In-memory user store for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{UserRecord, UserStore, UserStoreError};
use crate::auth::Role;

/// User store held in process memory; mirrors the Postgres contract.
#[derive(Default)]
pub struct MemoryUserStore {
    records: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, UserRecord>>, UserStoreError>
    {
        self.records
            .lock()
            .map_err(|_| UserStoreError::Unavailable(anyhow::anyhow!("user store lock poisoned")))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(self.lock()?.get(subject).cloned())
    }

    async fn create(
        &self,
        subject: &str,
        secret_hash: &str,
        role: Role,
    ) -> Result<(), UserStoreError> {
        let mut records = self.lock()?;
        if records.contains_key(subject) {
            return Err(UserStoreError::Conflict);
        }
        records.insert(
            subject.to_string(),
            UserRecord {
                subject: subject.to_string(),
                secret_hash: secret_hash.to_string(),
                role,
            },
        );
        Ok(())
    }

    async fn update_secret_hash(
        &self,
        subject: &str,
        new_hash: &str,
    ) -> Result<(), UserStoreError> {
        if let Some(record) = self.lock()?.get_mut(subject) {
            record.secret_hash = new_hash.to_string();
        }
        Ok(())
    }
}
