//! Error taxonomy for the lifecycle engine.

use thiserror::Error;

use crate::store::StoreError;
use crate::users::UserStoreError;

/// Terminal outcome categories for auth flows.
///
/// Bad secrets and unknown subjects merge into `InvalidCredentials`;
/// malformed, expired, and revoked tokens merge into `InvalidToken`. Callers
/// only ever see the category, never which branch produced it.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid subject or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("too many login attempts, try again in {retry_after}s")]
    RateLimited { retry_after: i64 },
    #[error("forbidden")]
    Forbidden,
    #[error("subject already registered")]
    Conflict,
    /// Infrastructure failure; never mapped to an auth denial.
    #[error("service unavailable")]
    Transient(#[source] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Transient(err.into())
    }
}

impl From<UserStoreError> for AuthError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::Conflict => Self::Conflict,
            other => Self::Transient(other.into()),
        }
    }
}
