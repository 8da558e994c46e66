pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

pub mod refresh;
pub use self::refresh::refresh;

pub mod logout;
pub use self::logout::logout;

pub mod password;
pub use self::password::change_password;

pub mod me;
pub use self::me::{admin, me};

pub mod principal;
pub mod types;

#[cfg(test)]
mod tests;

// common functions for the handlers
use axum::{
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::error;

use crate::auth::AuthError;

pub fn valid_subject(subject: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_.@-]{3,64}$").is_ok_and(|re| re.is_match(subject))
}

pub fn valid_password(password: &str) -> bool {
    !password.is_empty() && password.len() <= 128
}

/// Extract a client identifier for rate limiting from common proxy headers.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Map an engine error onto the response surface.
///
/// Responses carry only the category; which branch failed (unknown subject
/// vs. bad secret, expired vs. tampered token) is never revealed.
pub(crate) fn error_response(err: &AuthError) -> Response {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken => {
            (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
        }
        AuthError::RateLimited { retry_after } => {
            let mut response = (StatusCode::TOO_MANY_REQUESTS, err.to_string()).into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
        AuthError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()).into_response(),
        AuthError::Conflict => (StatusCode::CONFLICT, err.to_string()).into_response(),
        AuthError::Transient(source) => {
            error!("transient failure: {source:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            )
                .into_response()
        }
    }
}
