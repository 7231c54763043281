//! Authentication and session module
//!
//! - Password hashing with Argon2id
//! - Short-lived HS256 access tokens
//! - Opaque refresh tokens stored as SHA-256 hashes, one session per user
//! - Registration, login, refresh and logout orchestration
//! - Bearer token middleware that attaches the request principal
//! - In-memory and PostgreSQL stores

pub mod cookie;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod postgres;
pub mod refresh;
pub mod repository;
pub mod service;

pub use cookie::{clear_refresh_cookie, read_cookie, refresh_cookie, CookieLifetime, REFRESH_COOKIE_NAME};
pub use credentials::{CredentialVerifier, StoreCredentialVerifier};
pub use error::AuthError;
pub use jwt::{AccessTokenCodec, Claims, JwtError};
pub use middleware::{authenticate, AuthenticatedUser};
pub use models::{RefreshToken, User, DEFAULT_ROLE};
pub use password::{PasswordConfig, PasswordError, PasswordHasher};
pub use postgres::{PgRefreshTokenStore, PgUserStore};
pub use refresh::RefreshTokenManager;
pub use repository::{
    InMemoryRefreshTokenStore, InMemoryUserStore, RefreshTokenStore, RepositoryError, UserStore,
};
pub use service::{AuthResponse, AuthResult, AuthService, LoginRequest, RegisterRequest};
