//! Signed access-token codec.

use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use super::{error::AuthError, role::Role};

/// Claim set carried by an access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// Encodes and decodes signed, time-boxed access tokens.
///
/// Tokens are stateless: validity is determined purely by signature and
/// expiry at presentation time. Revoking a subject's sessions does not
/// invalidate access tokens already in flight.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl_seconds: u64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(master_secret: &str, access_ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token expired by one second is already invalid.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(master_secret.as_bytes()),
            decoding: DecodingKey::from_secret(master_secret.as_bytes()),
            validation,
            access_ttl_seconds,
        }
    }

    /// Issue a token for `subject` expiring `access_ttl_seconds` from now.
    ///
    /// # Errors
    /// Returns [`AuthError::Transient`] if signing fails.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        self.issue_at(subject, role, get_current_timestamp())
    }

    /// Issue a token with an explicit issue time (unix seconds).
    ///
    /// # Errors
    /// Returns [`AuthError::Transient`] if signing fails.
    pub fn issue_at(&self, subject: &str, role: Role, issued_at: u64) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            role,
            iat: issued_at,
            exp: issued_at + self.access_ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| AuthError::Transient(err.into()))
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    /// Any failure (bad signature, malformed structure, expired) collapses to
    /// [`AuthError::InvalidToken`]; callers cannot distinguish the cause.
    pub fn parse(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
