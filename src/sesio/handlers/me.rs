//! Role-gated introspection endpoints.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{
    error_response,
    principal::{require_auth, require_role},
    types::{AdminResponse, PrincipalResponse},
};
use crate::auth::{AuthState, Role};

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Resolved principal", body = PrincipalResponse),
        (status = 401, description = "Invalid token", body = String),
    ),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    match require_auth(&headers, &state) {
        Ok(principal) => (
            StatusCode::OK,
            Json(PrincipalResponse {
                subject: principal.subject,
                role: principal.role,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin access granted", body = AdminResponse),
        (status = 401, description = "Invalid token", body = String),
        (status = 403, description = "Insufficient role", body = String),
    ),
    tag = "auth"
)]
pub async fn admin(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let principal = match require_auth(&headers, &state) {
        Ok(principal) => principal,
        Err(err) => return error_response(&err),
    };
    if let Err(err) = require_role(&principal, Role::Admin) {
        return error_response(&err);
    }

    (
        StatusCode::OK,
        Json(AdminResponse {
            message: "Admin only".to_string(),
            subject: principal.subject,
        }),
    )
        .into_response()
}
