//! Password change endpoint with global session revocation.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{
    error_response,
    principal::require_auth,
    types::{ChangePasswordRequest, MessageResponse},
    valid_password,
};
use crate::auth::{
    password::{hash_secret, verify_secret},
    AuthError, AuthState,
};

#[utoipa::path(
    post,
    path = "/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated, all sessions revoked", body = MessageResponse),
        (status = 401, description = "Invalid token or wrong current password", body = String),
    ),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &state) {
        Ok(principal) => principal,
        Err(err) => return error_response(&err),
    };

    let request: ChangePasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if !valid_password(&request.new_password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    let record = match state.users().find_by_subject(&principal.subject).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(&AuthError::InvalidCredentials),
        Err(err) => return error_response(&AuthError::from(err)),
    };

    if !verify_secret(&request.current_password, &record.secret_hash) {
        return error_response(&AuthError::InvalidCredentials);
    }

    let new_hash = match hash_secret(&request.new_password) {
        Ok(hash) => hash,
        Err(err) => return error_response(&err),
    };
    if let Err(err) = state
        .users()
        .update_secret_hash(&record.subject, &new_hash)
        .await
    {
        return error_response(&AuthError::from(err));
    }

    // Sessions die only after the new secret is committed; a failed update
    // must not leave the subject logged out everywhere with the old password.
    if let Err(err) = state.registry().revoke_all(&record.subject).await {
        return error_response(&err);
    }

    (
        StatusCode::OK,
        Json(MessageResponse::new(
            "Password updated, all sessions revoked",
        )),
    )
        .into_response()
}
