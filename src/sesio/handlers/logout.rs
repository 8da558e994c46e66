//! Logout endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::error;

use super::types::{LogoutRequest, MessageResponse};
use crate::auth::AuthState;

#[utoipa::path(
    post,
    path = "/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn logout(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LogoutRequest>>,
) -> impl IntoResponse {
    let request: LogoutRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Always acknowledge, whether or not the token existed; a different
    // answer here would confirm token validity to an attacker.
    if let Err(err) = state.registry().revoke_one(&request.refresh_token).await {
        error!("Failed to revoke refresh token: {err}");
    }

    (
        StatusCode::OK,
        Json(MessageResponse::new("Logout successful")),
    )
        .into_response()
}
