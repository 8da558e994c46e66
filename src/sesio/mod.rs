//! HTTP service wiring around the lifecycle engine.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthConfig, AuthState, Role, TokenCodec};
use crate::cli::globals::GlobalArgs;
use crate::store::RedisStore;
use crate::users::PgUserStore;

pub mod handlers;

use self::handlers::types;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

const STORE_RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::login::login,
        handlers::refresh::refresh,
        handlers::logout::logout,
        handlers::password::change_password,
        handlers::me::me,
        handlers::me::admin,
    ),
    components(schemas(
        types::RegisterRequest,
        types::LoginRequest,
        types::RefreshRequest,
        types::LogoutRequest,
        types::ChangePasswordRequest,
        types::TokenPairResponse,
        types::MessageResponse,
        types::PrincipalResponse,
        types::AdminResponse,
        Role,
    )),
    tags((name = "auth", description = "Session and credential lifecycle"))
)]
pub struct ApiDoc;

/// Build the API router over shared state.
///
/// Kept separate from [`new`] so tests can drive the routes in-process
/// against in-memory stores.
#[must_use]
pub fn router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .route("/change-password", post(handlers::change_password))
        .route("/me", get(handlers::me))
        .route("/admin", get(handlers::admin))
        .layer(Extension(state))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    store_url: String,
    globals: &GlobalArgs,
    config: AuthConfig,
) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let store = RedisStore::connect(&store_url, STORE_RESPONSE_TIMEOUT)
        .await
        .context("Failed to connect to credential store")?;

    let codec = TokenCodec::new(
        globals.master_secret.expose_secret(),
        config.access_ttl_seconds(),
    );
    let state = Arc::new(AuthState::new(
        config,
        codec,
        Arc::new(store),
        Arc::new(PgUserStore::new(pool)),
    ));

    let app = router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
