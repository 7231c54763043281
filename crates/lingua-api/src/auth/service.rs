//! Authentication service layer
//!
//! Orchestrates registration, login, token refresh and logout on top of the
//! password hasher, the access token codec and the refresh token manager.
//! Every successful register/login yields an [`AuthResult`]: the public
//! response body plus the raw refresh secret destined for the cookie.

use super::credentials::{CredentialVerifier, StoreCredentialVerifier};
use super::error::AuthError;
use super::jwt::AccessTokenCodec;
use super::models::{User, DEFAULT_ROLE};
use super::password::{PasswordConfig, PasswordHasher};
use super::refresh::RefreshTokenManager;
use super::repository::{RefreshTokenStore, RepositoryError, UserStore};
use chrono::Utc;
use lingua_core::AuthConfig;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// User registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    /// Requested role. Honored only if the server allows it.
    #[serde(default)]
    pub role: Option<String>,
}

/// User login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    /// Persist the refresh cookie across browser restarts
    #[serde(default)]
    pub remember_me: bool,
}

/// Public part of a successful authentication
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Response body plus the raw refresh secret. The secret goes into the
/// cookie and never into the body.
pub struct AuthResult {
    pub response: AuthResponse,
    pub refresh_token: String,
}

impl std::fmt::Debug for AuthResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResult")
            .field("response", &self.response)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::from("must not be blank"));
        return Err(err);
    }
    Ok(())
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialVerifier>,
    hasher: PasswordHasher,
    codec: AccessTokenCodec,
    refresh_tokens: RefreshTokenManager,
    registration_roles: Vec<String>,
}

impl AuthService {
    /// Build the service from configuration and stores. Fails if the signing
    /// key or the hashing parameters are unusable.
    pub fn new(
        config: &AuthConfig,
        password_config: &PasswordConfig,
        users: Arc<dyn UserStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, AuthError> {
        let codec = AccessTokenCodec::from_config(config)?;
        let hasher = PasswordHasher::new(password_config)
            .map_err(|e| AuthError::CryptoUnavailable(e.to_string()))?;
        let credentials = Arc::new(StoreCredentialVerifier::new(users.clone(), hasher.clone()));

        Ok(Self {
            users,
            credentials,
            hasher,
            codec,
            refresh_tokens: RefreshTokenManager::new(refresh_store, config.refresh_token_ttl_secs),
            registration_roles: config
                .registration_roles
                .iter()
                .map(|r| r.trim().to_uppercase())
                .collect(),
        })
    }

    /// Swap the credential backend used by `login`
    pub fn with_credential_verifier(mut self, credentials: Arc<dyn CredentialVerifier>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// Refresh cookie lifetime in seconds
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_tokens.ttl_secs()
    }

    /// Register a new account and open its first session
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResult, AuthError> {
        request.validate()?;
        tracing::info!(email = %request.email, "Attempting to register user");

        if self.users.exists_by_email(&request.email).await? {
            tracing::warn!(email = %request.email, "Registration rejected, email already exists");
            return Err(AuthError::EmailAlreadyExists);
        }

        let role = self.registration_role(request.role.as_deref());
        let password_hash = self
            .hasher
            .hash(&request.password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = self
            .users
            .create(User::new(request.email, password_hash, request.name, role))
            .await
            .map_err(|e| match e {
                RepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        // An account without a session must not survive a failed registration
        match self.open_session(&user).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Opening first session failed, removing user");
                if let Err(cleanup) = self.users.delete(user.id).await {
                    tracing::error!(user_id = %user.id, error = %cleanup, "Failed to remove user after registration error");
                }
                Err(e)
            }
        }
    }

    /// Verify credentials, record the login and open a new session. Any
    /// previous session of the same user is revoked.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResult, AuthError> {
        request.validate()?;

        let user = match self.credentials.verify(&request.email, &request.password).await {
            Ok(user) => user,
            Err(AuthError::InvalidCredentials) => {
                tracing::warn!(email = %request.email, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        self.users.record_login(user.id, Utc::now()).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        self.open_session(&user).await
    }

    /// Exchange a refresh secret for a new access token. The refresh token
    /// itself is left in place.
    pub async fn refresh(&self, raw: &str) -> Result<AuthResponse, AuthError> {
        if raw.trim().is_empty() {
            return Err(AuthError::MissingRefreshToken);
        }

        let token = self
            .refresh_tokens
            .lookup(raw)
            .await?
            .ok_or(AuthError::InvalidSession)?;
        let token = self.refresh_tokens.check_not_expired(token).await?;

        let Some(user) = self.users.find_by_id(token.user_id).await? else {
            tracing::error!(user_id = %token.user_id, "Refresh token belongs to a missing user");
            return Err(AuthError::UserNotFound);
        };

        tracing::debug!(user_id = %user.id, "Issuing access token from refresh token");
        self.auth_response(&user)
    }

    /// Revoke the session behind `raw`, if any
    pub async fn logout(&self, raw: Option<&str>) -> Result<(), AuthError> {
        match raw.map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => self.refresh_tokens.revoke(raw).await,
            None => Ok(()),
        }
    }

    /// Load the account named by an access token subject
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.find_by_email(email).await?)
    }

    fn registration_role(&self, requested: Option<&str>) -> String {
        requested
            .map(|r| r.trim().to_uppercase())
            .filter(|r| self.registration_roles.contains(r))
            .unwrap_or_else(|| DEFAULT_ROLE.to_string())
    }

    async fn open_session(&self, user: &User) -> Result<AuthResult, AuthError> {
        let response = self.auth_response(user)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;
        Ok(AuthResult {
            response,
            refresh_token,
        })
    }

    fn auth_response(&self, user: &User) -> Result<AuthResponse, AuthError> {
        Ok(AuthResponse {
            access_token: self.codec.issue(&user.email, &user.role)?,
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        })
    }
}
