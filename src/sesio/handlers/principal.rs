//! Authenticated principal extraction and authorization helpers.
//!
//! Flow Overview: read the bearer token from the request metadata, verify it
//! with the codec, and return a principal that downstream handlers can use.

use axum::http::HeaderMap;

use super::extract_bearer_token;
use crate::auth::{AuthError, AuthState, Role};

/// Authenticated context derived from a verified access token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
}

/// Resolve the bearer token into a principal.
///
/// # Errors
/// Returns [`AuthError::InvalidToken`] for a missing, malformed, expired, or
/// tampered token; the branches are indistinguishable to the caller.
pub fn require_auth(headers: &HeaderMap, state: &AuthState) -> Result<Principal, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::InvalidToken)?;
    let claims = state.codec().parse(&token)?;
    Ok(Principal {
        subject: claims.sub,
        role: claims.role,
    })
}

/// Require the principal to hold `role`.
///
/// # Errors
/// Returns [`AuthError::Forbidden`] on a role mismatch.
pub fn require_role(principal: &Principal, role: Role) -> Result<(), AuthError> {
    if principal.role == role {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
