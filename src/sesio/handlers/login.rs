//! Login endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{
    error_response, extract_client_ip,
    types::{LoginRequest, TokenPairResponse},
};
use crate::auth::{password::verify_secret, AuthError, AuthState, RateLimitDecision};

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPairResponse),
        (status = 401, description = "Invalid subject or password", body = String),
        (status = 429, description = "Rate limited", body = String),
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // The attempt is counted before the secret is checked, unknown subjects
    // included, so the limiter itself cannot confirm account existence.
    let client_ip = extract_client_ip(&headers);
    match state
        .limiter()
        .check(client_ip.as_deref().unwrap_or("unknown"))
        .await
    {
        Ok(RateLimitDecision::Allowed) => {}
        Ok(RateLimitDecision::Limited { retry_after }) => {
            return error_response(&AuthError::RateLimited { retry_after });
        }
        Err(err) => return error_response(&err),
    }

    let record = match state.users().find_by_subject(&request.subject).await {
        Ok(record) => record,
        Err(err) => return error_response(&AuthError::from(err)),
    };

    // Unknown subject and wrong password collapse into one response.
    let Some(record) = record else {
        return error_response(&AuthError::InvalidCredentials);
    };
    if !verify_secret(&request.password, &record.secret_hash) {
        return error_response(&AuthError::InvalidCredentials);
    }

    let access_token = match state.codec().issue(&record.subject, record.role) {
        Ok(token) => token,
        Err(err) => return error_response(&err),
    };
    let refresh_token = match state.registry().issue(&record.subject).await {
        Ok(token) => token,
        Err(err) => return error_response(&err),
    };

    (
        StatusCode::OK,
        Json(TokenPairResponse::bearer(access_token, refresh_token)),
    )
        .into_response()
}
