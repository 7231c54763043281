//! Storage models for authentication
//!
//! - User: account record owned by the credential store
//! - RefreshToken: hashed long-lived session token owned by the refresh token manager

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to public registrations when nothing else is allowed
pub const DEFAULT_ROLE: &str = "STUDENT";

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Unique, used as the access token subject
    pub email: String,

    /// Argon2id PHC string. Never serialized in API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub name: String,

    /// Free-form role string, e.g. "STUDENT" or "TEACHER"
    pub role: String,

    pub last_login: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String, name: String, role: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name,
            role,
            last_login: None,
            created_at: Utc::now(),
        }
    }
}

/// Persisted refresh token
///
/// Only the SHA-256 hash of the opaque secret is stored; the secret itself
/// cannot be recovered from this record.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Base64 SHA-256 of the raw secret
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(user_id: Uuid, token_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Expired once the expiry instant is strictly in the past
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
