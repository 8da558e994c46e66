//! Session and credential lifecycle service.
//!
//! The service authenticates principals by secret, issues short-lived bearer
//! tokens plus rotating refresh tokens, enforces per-client login attempt
//! limits, and supports mass session revocation on credential change.

pub mod auth;
pub mod cli;
pub mod sesio;
pub mod store;
pub mod users;
