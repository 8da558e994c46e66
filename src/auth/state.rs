//! Auth configuration and shared request state.

use std::sync::Arc;

use super::{
    codec::TokenCodec,
    rate_limit::LoginRateLimiter,
    registry::SessionRegistry,
};
use crate::store::CredentialStore;
use crate::users::UserStore;

const DEFAULT_ACCESS_TTL_SECONDS: u64 = 30 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_LOGIN_LIMIT: i64 = 5;
const DEFAULT_LOGIN_WINDOW_SECONDS: i64 = 60;

/// Tunables for the lifecycle engine.
///
/// Constructed once at startup and passed by handle into each component;
/// tests inject distinct configurations per case.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_ttl_seconds: u64,
    refresh_ttl_seconds: i64,
    login_limit: i64,
    login_window_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            login_limit: DEFAULT_LOGIN_LIMIT,
            login_window_seconds: DEFAULT_LOGIN_WINDOW_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: u64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_limit(mut self, limit: i64) -> Self {
        self.login_limit = limit;
        self
    }

    #[must_use]
    pub fn with_login_window_seconds(mut self, seconds: i64) -> Self {
        self.login_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn login_limit(&self) -> i64 {
        self.login_limit
    }

    #[must_use]
    pub fn login_window_seconds(&self) -> i64 {
        self.login_window_seconds
    }
}

/// Shared, read-only state injected into every request handler.
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
    registry: SessionRegistry,
    limiter: LoginRateLimiter,
    users: Arc<dyn UserStore>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        codec: TokenCodec,
        store: Arc<dyn CredentialStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let registry = SessionRegistry::new(store.clone(), config.refresh_ttl_seconds());
        let limiter = LoginRateLimiter::new(
            store,
            config.login_limit(),
            config.login_window_seconds(),
        );
        Self {
            config,
            codec,
            registry,
            limiter,
            users,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new();

        assert_eq!(config.access_ttl_seconds(), super::DEFAULT_ACCESS_TTL_SECONDS);
        assert_eq!(
            config.refresh_ttl_seconds(),
            super::DEFAULT_REFRESH_TTL_SECONDS
        );
        assert_eq!(config.login_limit(), super::DEFAULT_LOGIN_LIMIT);
        assert_eq!(
            config.login_window_seconds(),
            super::DEFAULT_LOGIN_WINDOW_SECONDS
        );

        let config = config
            .with_access_ttl_seconds(60)
            .with_refresh_ttl_seconds(120)
            .with_login_limit(2)
            .with_login_window_seconds(1);

        assert_eq!(config.access_ttl_seconds(), 60);
        assert_eq!(config.refresh_ttl_seconds(), 120);
        assert_eq!(config.login_limit(), 2);
        assert_eq!(config.login_window_seconds(), 1);
    }
}
