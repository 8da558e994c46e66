//! Session and token lifecycle engine.
//!
//! This module coordinates credential issuance, refresh-token rotation,
//! login rate limiting, and mass session revocation.
//!
//! ## Refresh rotation
//!
//! A refresh token is redeemable at most once: redemption atomically removes
//! the `refresh:<token>` mapping before a replacement is issued, so a
//! replayed token is indistinguishable from one that never existed.
//!
//! ## Crash window
//!
//! Rotation is two store operations composed by the handlers (redeem, then
//! issue). A crash between them strands the subject without a valid refresh
//! token until the next login; this is accepted rather than hidden behind a
//! cross-key transaction the store does not offer.

pub mod codec;
pub mod error;
pub mod password;
pub mod rate_limit;
pub mod registry;
pub mod role;
pub mod state;

pub use codec::{TokenClaims, TokenCodec};
pub use error::AuthError;
pub use rate_limit::{LoginRateLimiter, RateLimitDecision};
pub use registry::SessionRegistry;
pub use role::Role;
pub use state::{AuthConfig, AuthState};
