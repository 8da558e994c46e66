//! Endpoint tests driven against in-memory stores.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::auth::{AuthConfig, AuthState, TokenCodec};
use crate::sesio::router;
use crate::store::MemoryStore;
use crate::users::MemoryUserStore;

const TEST_SECRET: &str = "test-master-secret";

fn state_with(config: AuthConfig) -> Arc<AuthState> {
    let codec = TokenCodec::new(TEST_SECRET, config.access_ttl_seconds());
    Arc::new(AuthState::new(
        config,
        codec,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryUserStore::new()),
    ))
}

fn state() -> Arc<AuthState> {
    // Generous limit; the rate-limit tests pick their own.
    state_with(AuthConfig::new().with_login_limit(100))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

async fn send(state: &Arc<AuthState>, request: Request<Body>) -> Response {
    router(state.clone())
        .oneshot(request)
        .await
        .expect("infallible")
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn register(state: &Arc<AuthState>, subject: &str, password: &str, role: &str) {
    let response = send(
        state,
        post_json(
            "/register",
            &json!({"subject": subject, "password": password, "role": role}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Returns `(access_token, refresh_token)`.
async fn login(state: &Arc<AuthState>, subject: &str, password: &str) -> (String, String) {
    let response = send(
        state,
        post_json("/login", &json!({"subject": subject, "password": password})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    (
        body["access_token"].as_str().expect("access").to_string(),
        body["refresh_token"].as_str().expect("refresh").to_string(),
    )
}

#[tokio::test]
async fn login_then_me_yields_the_registered_role() {
    let state = state();
    register(&state, "alice", "pw1", "admin").await;
    let (access, _) = login(&state, "alice", "pw1").await;

    let response = send(&state, get_bearer("/me", &access)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subject"], "alice");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn unknown_subject_and_wrong_password_are_indistinguishable() {
    let state = state();
    register(&state, "alice", "pw1", "user").await;

    let wrong = send(
        &state,
        post_json("/login", &json!({"subject": "alice", "password": "nope"})),
    )
    .await;
    let unknown = send(
        &state,
        post_json("/login", &json!({"subject": "nobody", "password": "nope"})),
    )
    .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let wrong = to_bytes(wrong.into_body(), usize::MAX).await.expect("body");
    let unknown = to_bytes(unknown.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let state = state();
    register(&state, "alice", "pw1", "user").await;
    let response = send(
        &state,
        post_json(
            "/register",
            &json!({"subject": "alice", "password": "pw2", "role": "user"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn refresh_rotates_and_invalidates_the_old_token() {
    let state = state();
    register(&state, "alice", "pw1", "user").await;
    let (_, refresh1) = login(&state, "alice", "pw1").await;

    let response = send(&state, post_json("/refresh", &json!({"refresh_token": refresh1}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let refresh2 = body["refresh_token"].as_str().expect("refresh").to_string();
    assert_ne!(refresh1, refresh2);

    // The redeemed token is gone; replaying it must not resurrect access.
    let replay = send(&state, post_json("/refresh", &json!({"refresh_token": refresh1}))).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let rotated = send(&state, post_json("/refresh", &json!({"refresh_token": refresh2}))).await;
    assert_eq!(rotated.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_with_a_never_issued_token_is_unauthorized() {
    let state = state();
    let response = send(
        &state,
        post_json("/refresh", &json!({"refresh_token": "never-issued"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_re_reads_the_subject_from_the_user_store() {
    let state = state();

    // A live session whose subject has no user record anymore must not be
    // refreshable; the role is re-fetched on every rotation.
    let orphaned = state.registry().issue("ghost").await.expect("issue");
    let response = send(
        &state,
        post_json("/refresh", &json!({"refresh_token": orphaned})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_always_acknowledges() {
    let state = state();
    register(&state, "alice", "pw1", "user").await;
    let (_, refresh) = login(&state, "alice", "pw1").await;

    let response = send(&state, post_json("/logout", &json!({"refresh_token": refresh}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Same acknowledgment for a token that no longer (or never did) exist.
    let replay = send(&state, post_json("/logout", &json!({"refresh_token": refresh}))).await;
    assert_eq!(replay.status(), StatusCode::OK);
    let unknown = send(
        &state,
        post_json("/logout", &json!({"refresh_token": "never-issued"})),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::OK);
}

#[tokio::test]
async fn change_password_revokes_every_session() {
    let state = state();
    register(&state, "alice", "pw1", "user").await;
    let (_, refresh1) = login(&state, "alice", "pw1").await;
    let (access2, refresh2) = login(&state, "alice", "pw1").await;

    let response = send(
        &state,
        Request::builder()
            .method("POST")
            .uri("/change-password")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {access2}"))
            .body(Body::from(
                json!({"current_password": "pw1", "new_password": "pw2"}).to_string(),
            ))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    for refresh in [refresh1, refresh2] {
        let replay = send(&state, post_json("/refresh", &json!({"refresh_token": refresh}))).await;
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    }

    let old = send(
        &state,
        post_json("/login", &json!({"subject": "alice", "password": "pw1"})),
    )
    .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
    login(&state, "alice", "pw2").await;
}

#[tokio::test]
async fn login_attempts_beyond_the_limit_are_rejected() {
    let state = state_with(
        AuthConfig::new()
            .with_login_limit(2)
            .with_login_window_seconds(60),
    );
    register(&state, "alice", "pw1", "user").await;

    // Exactly `limit` attempts pass through to the credential check.
    for _ in 0..2 {
        let response = send(
            &state,
            post_json("/login", &json!({"subject": "alice", "password": "nope"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The next attempt is limited even with the correct password.
    let limited = send(
        &state,
        post_json("/login", &json!({"subject": "alice", "password": "pw1"})),
    )
    .await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: i64 = limited
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .expect("retry-after header");
    assert!(retry_after > 0);
}

#[tokio::test]
async fn rate_limit_counts_clients_separately() {
    let state = state_with(
        AuthConfig::new()
            .with_login_limit(1)
            .with_login_window_seconds(60),
    );
    register(&state, "alice", "pw1", "user").await;

    for ip in ["1.2.3.4", "5.6.7.8"] {
        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", ip)
                .body(Body::from(
                    json!({"subject": "alice", "password": "pw1"}).to_string(),
                ))
                .expect("request"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn rate_limit_window_elapses_and_resets() {
    let state = state_with(
        AuthConfig::new()
            .with_login_limit(1)
            .with_login_window_seconds(1),
    );
    register(&state, "alice", "pw1", "user").await;

    login(&state, "alice", "pw1").await;
    let limited = send(
        &state,
        post_json("/login", &json!({"subject": "alice", "password": "pw1"})),
    )
    .await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    login(&state, "alice", "pw1").await;
}

#[tokio::test]
async fn expired_access_token_is_rejected_without_detail() {
    let state = state();
    let expired = state
        .codec()
        .issue_at(
            "alice",
            crate::auth::Role::User,
            jsonwebtoken::get_current_timestamp() - 7200,
        )
        .expect("token");

    let response = send(&state, get_bearer("/me", &expired)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(bytes.as_ref(), b"invalid or expired token");
}

#[tokio::test]
async fn admin_route_requires_the_admin_role() {
    let state = state();
    register(&state, "alice", "pw1", "user").await;
    register(&state, "root", "pw2", "admin").await;

    let (user_access, _) = login(&state, "alice", "pw1").await;
    let (admin_access, _) = login(&state, "root", "pw2").await;

    let forbidden = send(&state, get_bearer("/admin", &user_access)).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let granted = send(&state, get_bearer("/admin", &admin_access)).await;
    assert_eq!(granted.status(), StatusCode::OK);
    let body = body_json(granted).await;
    assert_eq!(body["subject"], "root");

    let anonymous = send(
        &state,
        Request::builder()
            .method("GET")
            .uri("/admin")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_payload_is_a_bad_request() {
    let state = state();
    for uri in ["/register", "/login", "/refresh", "/logout"] {
        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn invalid_subjects_are_rejected_at_registration() {
    let state = state();
    let too_long = "x".repeat(100);
    for subject in ["", "ab", "has space", too_long.as_str()] {
        let response = send(
            &state,
            post_json(
                "/register",
                &json!({"subject": subject, "password": "pw1", "role": "user"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{subject:?}");
    }
}

#[tokio::test]
async fn full_lifecycle_for_a_single_subject() {
    let state = state();
    register(&state, "alice", "pw1", "user").await;

    let (access1, refresh1) = login(&state, "alice", "pw1").await;
    let me = send(&state, get_bearer("/me", &access1)).await;
    assert_eq!(me.status(), StatusCode::OK);

    let rotated = send(&state, post_json("/refresh", &json!({"refresh_token": refresh1}))).await;
    assert_eq!(rotated.status(), StatusCode::OK);
    let body = body_json(rotated).await;
    let refresh2 = body["refresh_token"].as_str().expect("refresh").to_string();

    let replay = send(&state, post_json("/refresh", &json!({"refresh_token": refresh1}))).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let logout = send(&state, post_json("/logout", &json!({"refresh_token": refresh2}))).await;
    assert_eq!(logout.status(), StatusCode::OK);

    let after_logout =
        send(&state, post_json("/refresh", &json!({"refresh_token": refresh2}))).await;
    assert_eq!(after_logout.status(), StatusCode::UNAUTHORIZED);
}
