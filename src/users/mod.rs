//! User records and the external user-record store boundary.
//!
//! The lifecycle engine never owns principal identity; it consumes records
//! from this interface at authentication time and re-embeds subject and role
//! in every token it issues.

pub mod memory;
pub mod postgres;

pub use self::memory::MemoryUserStore;
pub use self::postgres::PgUserStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Role;

/// A principal as persisted by the user store.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub subject: String,
    pub secret_hash: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum UserStoreError {
    /// A record with the same subject already exists.
    #[error("subject already registered")]
    Conflict,
    /// A persisted role tag is not part of the closed role set.
    #[error("unknown role {0:?}")]
    UnknownRole(String),
    /// Connectivity failure, distinct from "not found".
    #[error("user store unavailable")]
    Unavailable(#[source] anyhow::Error),
}

/// Persistence operations for principal records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a record; `Ok(None)` only on a definitive negative lookup.
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, UserStoreError>;

    /// Create a record; fails with [`UserStoreError::Conflict`] on duplicates.
    async fn create(
        &self,
        subject: &str,
        secret_hash: &str,
        role: Role,
    ) -> Result<(), UserStoreError>;

    /// Replace the stored secret hash for a subject.
    async fn update_secret_hash(
        &self,
        subject: &str,
        new_hash: &str,
    ) -> Result<(), UserStoreError>;
}
