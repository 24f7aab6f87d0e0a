//! JWT token codec
//!
//! Issues and verifies HMAC-signed tokens carrying a username and role list.
//! Expiry is checked against a caller-supplied clock with zero leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token claims for Petfolio
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Roles granted at issue time
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token verification error
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("bad token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

/// Token issuer and verifier
pub struct TokenCodec {
    /// Secret key for signing/verifying
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,

    /// Token lifetime
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with the default one-hour token lifetime
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::hours(1))
    }

    /// Create a codec with an explicit token lifetime
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for a subject with the given roles, expiring at `now + ttl`.
    ///
    /// Duplicate roles are dropped; first-appearance order is preserved.
    pub fn issue(
        &self,
        subject: &str,
        roles: &[String],
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let mut deduped: Vec<String> = Vec::with_capacity(roles.len());
        for role in roles {
            if !deduped.contains(role) {
                deduped.push(role.clone());
            }
        }

        let claims = Claims {
            sub: subject.to_string(),
            roles: deduped,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| TokenError::Malformed)
    }

    /// Verify a token against the caller-supplied clock and return its claims.
    ///
    /// The token is expired exactly when `now >= exp`; there is no leeway.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        // Expiry is validated manually below so `now` is authoritative;
        // the library default would use the system clock with 60s leeway.
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })?;

        let claims = token_data.claims;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
