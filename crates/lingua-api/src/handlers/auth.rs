//! Authentication API handlers
//!
//! The access token travels in the JSON body; the refresh secret only in the
//! `refreshToken` cookie.

use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::auth::{
    clear_refresh_cookie, read_cookie, refresh_cookie, AuthError, AuthResult, AuthenticatedUser,
    CookieLifetime, LoginRequest, RegisterRequest, REFRESH_COOKIE_NAME,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Logout response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Unwrap a JSON body, turning any rejection into a 400 validation error
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected request body");
            let details = match rejection {
                JsonRejection::JsonDataError(_) => {
                    "body: a required field is missing or has the wrong type"
                }
                JsonRejection::JsonSyntaxError(_) => "body: malformed JSON",
                JsonRejection::MissingJsonContentType(_) => {
                    "content-type: expected application/json"
                }
                _ => "body: could not be read",
            };
            Err(AppError::Validation(details.to_string()))
        }
    }
}

fn with_cookie(cookie: HeaderValue, result: AuthResult) -> impl IntoResponse {
    ([(header::SET_COOKIE, cookie)], Json(result.response))
}

/// Register a new account
///
/// New accounts get the STUDENT role unless the requested role is on the
/// server's allow-list. Opens a session right away.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered; refresh cookie set", body = AuthResponse),
        (status = 400, description = "Invalid input or email already exists", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(body)?;
    let context = RequestContext::from_headers(&headers);
    let email = request.email.clone();

    let result = match state.auth.register(request).await {
        Ok(result) => result,
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                email,
                reason: e.to_string(),
                context,
            });
            return Err(e.into());
        }
    };

    audit_log(&AuditEvent::RegistrationSuccess {
        user_id: result.response.user_id,
        email: result.response.email.clone(),
        role: result.response.role.clone(),
        context,
    });

    let cookie = refresh_cookie(
        &result.refresh_token,
        CookieLifetime::Persistent(state.auth.refresh_ttl_secs()),
        state.config.auth.cookie_secure,
    );
    Ok(with_cookie(cookie, result))
}

/// Login with email and password
///
/// `rememberMe` makes the refresh cookie persistent; otherwise it lasts for
/// the browser session. Logging in ends any other session of the account.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; refresh cookie set", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(body)?;
    let context = RequestContext::from_headers(&headers);
    let email = request.email.clone();
    let lifetime = if request.remember_me {
        CookieLifetime::Persistent(state.auth.refresh_ttl_secs())
    } else {
        CookieLifetime::Session
    };

    let result = match state.auth.login(request).await {
        Ok(result) => result,
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                email,
                reason: e.to_string(),
                context,
            });
            return Err(e.into());
        }
    };

    audit_log(&AuditEvent::LoginSuccess {
        user_id: result.response.user_id,
        email: result.response.email.clone(),
        context,
    });

    let cookie = refresh_cookie(
        &result.refresh_token,
        lifetime,
        state.config.auth.cookie_secure,
    );
    Ok(with_cookie(cookie, result))
}

/// Exchange the refresh cookie for a new access token
///
/// The refresh cookie itself is not rotated.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "New access token issued", body = AuthResponse),
        (status = 400, description = "Missing, invalid or expired session", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let context = RequestContext::from_headers(&headers);
    let raw = read_cookie(&headers, REFRESH_COOKIE_NAME).unwrap_or_default();

    match state.auth.refresh(&raw).await {
        Ok(response) => {
            audit_log(&AuditEvent::TokenRefresh {
                user_id: response.user_id,
                context,
            });
            Ok(Json(response))
        }
        Err(e) => {
            if matches!(e, AuthError::SessionExpired) {
                audit_log(&AuditEvent::SessionExpired { context });
            }
            Err(e.into())
        }
    }
}

/// End the session behind the refresh cookie
///
/// Succeeds whether or not the cookie names a live session, and always
/// clears the cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out; refresh cookie cleared", body = LogoutResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let raw = read_cookie(&headers, REFRESH_COOKIE_NAME);
    state.auth.logout(raw.as_deref()).await?;

    audit_log(&AuditEvent::Logout {
        context: RequestContext::from_headers(&headers),
    });

    Ok((
        [(
            header::SET_COOKIE,
            clear_refresh_cookie(state.config.auth.cookie_secure),
        )],
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// Current principal
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated principal", body = AuthenticatedUser),
        (status = 401, description = "No valid bearer token", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me_handler(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}
