//! Bearer token issuing and validation.
//!
//! Tokens are HS256 JWTs over [`Claims`]. The key is loaded once at startup and
//! handed to [`TokenAuthority::new`]; nothing else in the process holds it.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use geopost_types::api::Claims;

pub const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        self.issue_at(username, Utc::now())
    }

    /// Sign claims for `username` expiring `ttl` after `now`.
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            username: username.to_string(),
            exp: (now + self.ttl).timestamp().max(0) as u64,
        };
        Ok(encode(&Header::new(ALGORITHM), &claims, &self.encoding)?)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Verify signature and algorithm, then reject tokens whose expiry is at or
    /// before `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against `now`, with no leeway; `exp` stays required.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.exp as i64 <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
