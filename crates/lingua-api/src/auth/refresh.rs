//! Refresh token management
//!
//! Refresh tokens are opaque random secrets. The server keeps only
//! `base64(SHA-256(secret))` plus an expiry; the raw secret lives in the
//! client's cookie and in memory for the duration of one call.
//! Issuing a token for a user replaces every token that user had, so each
//! user has at most one live session.

use super::error::AuthError;
use super::models::RefreshToken;
use super::repository::RefreshTokenStore;
use base64::Engine;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound that keeps `now + ttl` representable
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
    ttl: Duration,
}

impl RefreshTokenManager {
    pub fn new(store: Arc<dyn RefreshTokenStore>, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    /// Refresh token lifetime in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Create a new session for `user_id`, dropping any previous one, and
    /// return the raw secret
    pub async fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        tracing::debug!(%user_id, "Creating new refresh token");

        let raw = generate_secret();
        let token = RefreshToken::new(user_id, hash_secret(&raw), Utc::now() + self.ttl);
        self.store.replace_for_user(token).await?;

        tracing::info!(%user_id, "Stored refresh token hash");
        Ok(raw)
    }

    /// Find the stored token for a raw secret
    pub async fn lookup(&self, raw: &str) -> Result<Option<RefreshToken>, AuthError> {
        tracing::debug!("Looking up refresh token by hash");
        Ok(self.store.find_by_hash(&hash_secret(raw)).await?)
    }

    /// Return the token unchanged if still valid. An expired token is deleted
    /// and reported as `SessionExpired`.
    pub async fn check_not_expired(&self, token: RefreshToken) -> Result<RefreshToken, AuthError> {
        if token.is_expired_at(Utc::now()) {
            tracing::warn!(user_id = %token.user_id, "Refresh token expired, deleting");
            self.store.delete(token.id).await?;
            return Err(AuthError::SessionExpired);
        }
        Ok(token)
    }

    /// Delete the session behind a raw secret. Unknown secrets are ignored.
    pub async fn revoke(&self, raw: &str) -> Result<(), AuthError> {
        if let Some(token) = self.lookup(raw).await? {
            self.store.delete(token.id).await?;
            tracing::info!(user_id = %token.user_id, "Refresh token revoked");
        }
        Ok(())
    }
}

/// Two v4 UUIDs joined with `-`: 244 random bits
fn generate_secret() -> String {
    format!("{}-{}", Uuid::new_v4(), Uuid::new_v4())
}

/// Storage form of a refresh secret: standard base64 of its SHA-256 digest
pub fn hash_secret(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(digest)
}
