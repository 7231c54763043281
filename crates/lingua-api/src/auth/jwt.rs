//! JWT access token generation and validation
//!
//! Access tokens are HS256-signed JWTs carrying the user's email as subject
//! and the role as a claim. They are verified purely from the token bytes and
//! the shared key; no store lookup is involved.

use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lingua_core::AuthConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimum decoded signing key length in bytes (256 bits)
pub const MIN_KEY_BYTES: usize = 32;

/// JWT Claims structure
///
/// These claims are embedded in the access token and extracted during validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user's email address
    pub sub: String,
    /// User's role (e.g. STUDENT, TEACHER)
    pub role: String,
    /// JWT ID - makes every issued token unique
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

/// Issues and verifies access tokens with a fixed HMAC key
///
/// The key is decoded and turned into encoding/decoding keys once, at
/// construction.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: u64,
}

impl AccessTokenCodec {
    /// Build a codec from a base64-encoded secret
    pub fn new(secret_b64: &str, issuer: impl Into<String>, ttl_secs: u64) -> Result<Self, JwtError> {
        let key = base64::engine::general_purpose::STANDARD
            .decode(secret_b64.trim())
            .map_err(|e| JwtError::InvalidKey(format!("signing key is not base64: {e}")))?;

        if key.len() < MIN_KEY_BYTES {
            return Err(JwtError::InvalidKey(format!(
                "signing key must be at least {} bits, got {}",
                MIN_KEY_BYTES * 8,
                key.len() * 8
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            issuer: issuer.into(),
            ttl_secs,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, JwtError> {
        Self::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.access_token_ttl_secs,
        )
    }

    /// Issue a token for `subject` carrying `role`, valid from now for the
    /// configured TTL
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lingua_api::auth::jwt::AccessTokenCodec;
    ///
    /// let codec = AccessTokenCodec::new(
    ///     "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=",
    ///     "lingua-api",
    ///     900,
    /// )
    /// .unwrap();
    /// let token = codec.issue("alice@example.com", "STUDENT").unwrap();
    /// let claims = codec.verify(&token).unwrap();
    /// assert_eq!(claims.sub, "alice@example.com");
    /// ```
    pub fn issue(&self, subject: &str, role: &str) -> Result<String, JwtError> {
        self.issue_at(subject, role, now_secs())
    }

    /// Verify signature first, then expiry, and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, now_secs())
    }

    pub(crate) fn issue_at(&self, subject: &str, role: &str, now: u64) -> Result<String, JwtError> {
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            role: role.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(token)
    }

    pub(crate) fn verify_at(&self, token: &str, now: u64) -> Result<Claims, JwtError> {
        // Expiry is checked by hand below: the library treats `exp == now` as
        // still valid and applies leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            }
        })?;

        if now >= token_data.claims.exp {
            return Err(JwtError::ExpiredToken);
        }

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
