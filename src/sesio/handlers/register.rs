//! Registration endpoint.

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, Json,
};
use std::sync::Arc;

use super::{error_response, types::{MessageResponse, RegisterRequest}, valid_password, valid_subject};
use crate::auth::{password::hash_secret, AuthError, AuthState};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = MessageResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 409, description = "Subject already registered", body = String),
    ),
    tag = "auth"
)]
pub async fn register(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if !valid_subject(&request.subject) {
        return (StatusCode::BAD_REQUEST, "Invalid subject".to_string()).into_response();
    }
    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    let secret_hash = match hash_secret(&request.password) {
        Ok(hash) => hash,
        Err(err) => return error_response(&err),
    };

    match state
        .users()
        .create(&request.subject, &secret_hash, request.role)
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(MessageResponse::new("Registration successful")),
        )
            .into_response(),
        Err(err) => error_response(&AuthError::from(err)),
    }
}
