//! Security audit logging for session events
//!
//! Every event is emitted through `tracing` on the `"audit"` target so it can
//! be filtered and routed separately from application logs. Events carry the
//! client address and user agent when the request provides them. Raw
//! passwords and refresh secrets never appear in an event.
//!
//! ```ignore
//! use lingua_api::audit::{audit_log, AuditEvent, RequestContext};
//!
//! let ctx = RequestContext::from_headers(request.headers());
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     email: user.email.clone(),
//!     context: ctx,
//! });
//! ```

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Client metadata taken from request headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Session lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    RegistrationSuccess {
        user_id: Uuid,
        email: String,
        role: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    RegistrationFailure {
        email: String,
        reason: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    LoginSuccess {
        user_id: Uuid,
        email: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Reason is internal only; the client sees a generic message
    LoginFailure {
        email: String,
        reason: String,
        #[serde(flatten)]
        context: RequestContext,
    },

    TokenRefresh {
        user_id: Uuid,
        #[serde(flatten)]
        context: RequestContext,
    },

    SessionExpired {
        #[serde(flatten)]
        context: RequestContext,
    },

    Logout {
        #[serde(flatten)]
        context: RequestContext,
    },

    /// Bearer token rejected for a reason other than expiry
    InvalidToken {
        reason: String,
        #[serde(flatten)]
        context: RequestContext,
    },
}

impl AuditEvent {
    fn name(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::TokenRefresh { .. } => "Token refresh",
            AuditEvent::SessionExpired { .. } => "Session expired",
            AuditEvent::Logout { .. } => "Logout",
            AuditEvent::InvalidToken { .. } => "Invalid token",
        }
    }

    fn context(&self) -> &RequestContext {
        match self {
            AuditEvent::RegistrationSuccess { context, .. }
            | AuditEvent::RegistrationFailure { context, .. }
            | AuditEvent::LoginSuccess { context, .. }
            | AuditEvent::LoginFailure { context, .. }
            | AuditEvent::TokenRefresh { context, .. }
            | AuditEvent::SessionExpired { context }
            | AuditEvent::Logout { context }
            | AuditEvent::InvalidToken { context, .. } => context,
        }
    }

    fn is_failure(&self) -> bool {
        matches!(
            self,
            AuditEvent::RegistrationFailure { .. }
                | AuditEvent::LoginFailure { .. }
                | AuditEvent::InvalidToken { .. }
        )
    }
}

/// Emit an audit event on the `"audit"` target. Failures are logged at WARN,
/// everything else at INFO.
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));
    let ctx = event.context();

    if event.is_failure() {
        warn!(
            target: "audit",
            event = %event_json,
            ip_address = ?ctx.ip_address,
            user_agent = ?ctx.user_agent,
            "{}",
            event.name()
        );
    } else {
        info!(
            target: "audit",
            event = %event_json,
            ip_address = ?ctx.ip_address,
            user_agent = ?ctx.user_agent,
            "{}",
            event.name()
        );
    }
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(first) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(first.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
