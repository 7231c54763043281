/// Bearer token authentication middleware
///
/// Runs on every request. A valid `Authorization: Bearer <token>` header
/// attaches an [`AuthenticatedUser`] to the request extensions; anything else
/// leaves the request anonymous. The middleware never rejects a request
/// itself: protected handlers ask for [`AuthenticatedUser`] as an extractor
/// and that extractor answers 401 when no principal is attached.
use super::error::AuthError;
use super::service::AuthService;
use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Principal resolved from the credential store for the current request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Token from an `Authorization: Bearer <token>` header, if present
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the token, then load the user named by its subject
async fn resolve_principal(auth: &AuthService, token: &str) -> Result<AuthenticatedUser, AuthError> {
    let claims = auth.codec().verify(token)?;
    let user = auth
        .find_user_by_email(&claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    })
}

/// Attach the bearer token's principal, or continue anonymously
///
/// ```ignore
/// let app = Router::new()
///     .route("/me", get(me_handler))
///     .layer(middleware::from_fn_with_state(auth.clone(), authenticate));
/// ```
pub async fn authenticate(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request).map(str::to_owned) else {
        return next.run(request).await;
    };

    match resolve_principal(&auth, &token).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.user_id, "Authenticated request");
            request.extensions_mut().insert(user);
        }
        Err(AuthError::TokenExpired) => {
            tracing::info!("Access token expired, continuing unauthenticated");
        }
        Err(e @ (AuthError::TokenInvalidSignature | AuthError::InvalidToken)) => {
            tracing::warn!(error = %e, "Rejected access token, continuing unauthenticated");
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                context: RequestContext::from_headers(request.headers()),
            });
        }
        Err(AuthError::UserNotFound) => {
            tracing::warn!("Access token subject no longer exists, continuing unauthenticated");
        }
        Err(e) => {
            tracing::error!(error = %e, "Authentication failed unexpectedly, continuing unauthenticated");
        }
    }

    next.run(request).await
}
