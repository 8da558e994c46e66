//! Postgres-backed user store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::{UserRecord, UserStore, UserStoreError};
use crate::auth::Role;

/// User store backed by the `users` table (see `sql/schema.sql`).
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn unavailable(err: sqlx::Error) -> UserStoreError {
    UserStoreError::Unavailable(err.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let query = "SELECT subject, secret_hash, role FROM users WHERE subject = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(subject)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(unavailable)?;

        let Some(row) = row else {
            return Ok(None);
        };

        // An unrecognized role tag fails here instead of propagating silently.
        let role: String = row.get("role");
        let role = role
            .parse::<Role>()
            .map_err(|()| UserStoreError::UnknownRole(role))?;

        Ok(Some(UserRecord {
            subject: row.get("subject"),
            secret_hash: row.get("secret_hash"),
            role,
        }))
    }

    async fn create(
        &self,
        subject: &str,
        secret_hash: &str,
        role: Role,
    ) -> Result<(), UserStoreError> {
        let query = "INSERT INTO users (subject, secret_hash, role) VALUES ($1, $2, $3)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(subject)
            .bind(secret_hash)
            .bind(role.as_str())
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(UserStoreError::Conflict),
            Err(err) => Err(unavailable(err)),
        }
    }

    async fn update_secret_hash(
        &self,
        subject: &str,
        new_hash: &str,
    ) -> Result<(), UserStoreError> {
        let query = "UPDATE users SET secret_hash = $2, updated_at = NOW() WHERE subject = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(subject)
            .bind(new_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
