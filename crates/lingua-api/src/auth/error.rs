//! Authentication error taxonomy
//!
//! Every failure the auth subsystem can produce. Translation into
//! client-safe HTTP responses happens in [`crate::error`].

use super::jwt::JwtError;
use super::repository::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Deliberately does not say which.
    #[error("Invalid email and/or password")]
    InvalidCredentials,

    #[error("This email already exists")]
    EmailAlreadyExists,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Access token has expired")]
    TokenExpired,

    #[error("Access token signature is invalid")]
    TokenInvalidSignature,

    #[error("Access token is malformed")]
    InvalidToken,

    #[error("Missing refresh token")]
    MissingRefreshToken,

    /// Refresh token found but past its expiry; the row has been deleted.
    #[error("Session expired")]
    SessionExpired,

    /// Refresh secret does not resolve to any stored hash.
    #[error("Invalid session")]
    InvalidSession,

    /// A stored session points at a user that no longer exists.
    #[error("User not found for session")]
    UserNotFound,

    #[error("Cryptographic primitive unavailable: {0}")]
    CryptoUnavailable(String),

    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::ExpiredToken => AuthError::TokenExpired,
            JwtError::InvalidSignature => AuthError::TokenInvalidSignature,
            JwtError::InvalidToken => AuthError::InvalidToken,
            JwtError::EncodingError(e) => AuthError::Internal(format!("Failed to sign token: {e}")),
            JwtError::InvalidKey(msg) => AuthError::CryptoUnavailable(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{field}: {message}")
                })
            })
            .collect();
        messages.sort();
        AuthError::Validation(messages.join(", "))
    }
}
