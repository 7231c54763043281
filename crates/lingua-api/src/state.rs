//! Application state management

use crate::auth::{
    postgres, AuthError, AuthService, InMemoryRefreshTokenStore, InMemoryUserStore,
    PasswordConfig, PgRefreshTokenStore, PgUserStore, RefreshTokenStore, UserStore,
};
use lingua_core::config::AppConfig;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Registration, login and session handling
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: AppConfig, auth: Arc<AuthService>) -> Self {
        Self { config, auth }
    }

    /// State backed by PostgreSQL when a database URL is configured, and by
    /// in-memory stores otherwise
    pub async fn from_config(config: AppConfig) -> Result<Self, AuthError> {
        let Some(url) = config.database.postgres_url.clone() else {
            tracing::warn!("No DATABASE_URL configured, users and sessions are kept in memory");
            return Self::in_memory(config, &PasswordConfig::default());
        };

        let pool = postgres::connect(&url, config.database.postgres_pool_size).await?;
        postgres::ensure_schema(&pool).await?;
        tracing::info!("Connected to PostgreSQL");

        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let tokens: Arc<dyn RefreshTokenStore> = Arc::new(PgRefreshTokenStore::new(pool));
        Self::with_stores(config, &PasswordConfig::default(), users, tokens)
    }

    /// State backed by in-memory stores
    pub fn in_memory(config: AppConfig, password_config: &PasswordConfig) -> Result<Self, AuthError> {
        Self::with_stores(
            config,
            password_config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryRefreshTokenStore::new()),
        )
    }

    fn with_stores(
        config: AppConfig,
        password_config: &PasswordConfig,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, AuthError> {
        let auth = AuthService::new(&config.auth, password_config, users, tokens)?;
        Ok(Self::new(config, Arc::new(auth)))
    }
}
