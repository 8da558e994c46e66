//! Secret hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::warn;

use super::error::AuthError;

/// Hash a secret into a PHC string for storage.
///
/// # Errors
/// Returns [`AuthError::Transient`] if hashing fails.
pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Transient(anyhow::anyhow!("hashing failed: {err}")))
}

/// Verify a secret against a stored PHC string.
///
/// A malformed stored hash counts as a failed verification.
#[must_use]
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("stored secret hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() -> Result<(), AuthError> {
        let hash = hash_secret("pw1")?;
        assert!(verify_secret("pw1", &hash));
        assert!(!verify_secret("pw2", &hash));
        Ok(())
    }

    #[test]
    fn malformed_stored_hash_fails_closed() {
        assert!(!verify_secret("pw1", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() -> Result<(), AuthError> {
        assert_ne!(hash_secret("pw1")?, hash_secret("pw1")?);
        Ok(())
    }
}
