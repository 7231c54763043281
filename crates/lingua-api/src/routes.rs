//! API route definitions

use crate::handlers::auth;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Routes mounted under `/api/auth`
///
/// None of them require a principal up front; `/me` rejects anonymous
/// callers through its extractor.
pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/refresh", post(auth::refresh_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/me", get(auth::me_handler))
}
