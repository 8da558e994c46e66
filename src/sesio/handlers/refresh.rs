//! Refresh endpoint with token rotation.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use super::{
    error_response,
    types::{RefreshRequest, TokenPairResponse},
};
use crate::auth::{AuthError, AuthState};

#[utoipa::path(
    post,
    path = "/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPairResponse),
        (status = 401, description = "Invalid refresh token", body = String),
    ),
    tag = "auth"
)]
pub async fn refresh(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let request: RefreshRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Redemption consumes the token; a replay lands in the None branch.
    let subject = match state.registry().redeem(&request.refresh_token).await {
        Ok(Some(subject)) => subject,
        Ok(None) => return error_response(&AuthError::InvalidToken),
        Err(err) => return error_response(&err),
    };

    // The role is re-fetched rather than carried over from the old token, so
    // a role change takes effect on the next refresh.
    let record = match state.users().find_by_subject(&subject).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(&AuthError::InvalidToken),
        Err(err) => return error_response(&AuthError::from(err)),
    };

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
