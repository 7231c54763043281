//! API error handling
//!
//! Turns [`AuthError`] into client-safe responses. Internal failures are
//! logged here and reach the client only as a generic 500.

use crate::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Authentication required")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Validation(String),
    InvalidCredentials,
    Unauthorized,
    /// Logged, never shown to the client
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", "Invalid request").with_details(details),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("INVALID_CREDENTIALS", "Invalid email and/or password!"),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ApiError::unauthorized()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal_error())
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::EmailAlreadyExists => {
                AppError::BadRequest("This email already exists!".to_string())
            }
            AuthError::Validation(details) => AppError::Validation(details),
            AuthError::MissingRefreshToken => {
                AppError::BadRequest("Missing refresh token, please login again.".to_string())
            }
            AuthError::SessionExpired => {
                AppError::BadRequest("Session expired, please log in again.".to_string())
            }
            AuthError::InvalidSession => {
                AppError::BadRequest("Invalid session, please log in again.".to_string())
            }
            AuthError::TokenExpired | AuthError::TokenInvalidSignature | AuthError::InvalidToken => {
                AppError::Unauthorized
            }
            e @ (AuthError::UserNotFound
            | AuthError::CryptoUnavailable(_)
            | AuthError::Repository(_)
            | AuthError::Internal(_)) => AppError::Internal(e.to_string()),
        }
    }
}
