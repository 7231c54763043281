//! Storage abstractions for authentication
//!
//! - `UserStore`: the credential store (external collaborator)
//! - `RefreshTokenStore`: hashed refresh tokens, written only by the refresh token manager
//!
//! In-memory implementations live here; the PostgreSQL ones are in
//! [`super::postgres`].

use super::models::{RefreshToken, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::DatabaseError(err.to_string())
    }
}

/// Lookup and persistence of user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Insert a new user. Fails with `EmailAlreadyExists` on a duplicate.
    async fn create(&self, user: User) -> Result<User, RepositoryError>;

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// Remove an account. Removing a missing account is not an error.
    async fn delete(&self, user_id: Uuid) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Persistence of hashed refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Atomically delete every token of `token.user_id` and insert `token`.
    /// Concurrent calls for the same user are serialized.
    async fn replace_for_user(&self, token: RefreshToken) -> Result<(), RepositoryError>;

    /// Exact match on the stored hash
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, RepositoryError>;

    /// Delete by id. Deleting a missing row is not an error.
    async fn delete(&self, token_id: Uuid) -> Result<(), RepositoryError>;

    async fn count_for_user(&self, user_id: Uuid) -> Result<u64, RepositoryError>;
}

/// In-memory user store keyed by id, with an email index
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserTable>,
}

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<Uuid, User>,
    id_by_email: HashMap<String, Uuid>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let table = self.inner.read().await;
        Ok(table
            .id_by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.inner.read().await.by_id.get(&user_id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.inner.read().await.id_by_email.contains_key(email))
    }

    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut table = self.inner.write().await;
        if table.id_by_email.contains_key(&user.email) {
            return Err(RepositoryError::EmailAlreadyExists);
        }
        table.id_by_email.insert(user.email.clone(), user.id);
        table.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut table = self.inner.write().await;
        let user = table
            .by_id
            .get_mut(&user_id)
            .ok_or(RepositoryError::UserNotFound)?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), RepositoryError> {
        let mut table = self.inner.write().await;
        if let Some(user) = table.by_id.remove(&user_id) {
            table.id_by_email.remove(&user.email);
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.inner.read().await.by_id.len() as u64)
    }
}

/// In-memory refresh token store
///
/// A single mutex guards the whole table, which makes `replace_for_user`
/// atomic with respect to every other operation.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Mutex<HashMap<Uuid, RefreshToken>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn replace_for_user(&self, token: RefreshToken) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.lock().await;
        tokens.retain(|_, existing| existing.user_id != token.user_id);
        tokens.insert(token.id, token);
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, RepositoryError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn delete(&self, token_id: Uuid) -> Result<(), RepositoryError> {
        self.tokens.lock().await.remove(&token_id);
        Ok(())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.values().filter(|t| t.user_id == user_id).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn user(email: &str) -> User {
        User::new(
            email.to_string(),
            "hash".to_string(),
            "Test".to_string(),
            "STUDENT".to_string(),
        )
    }

    #[tokio::test]
    async fn test_user_store_create_and_find() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("a@example.com")).await.unwrap();

        let by_email = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(store.exists_by_email("a@example.com").await.unwrap());
        assert!(!store.exists_by_email("b@example.com").await.unwrap());
        assert!(store.find_by_id(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_user_store_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.create(user("a@example.com")).await.unwrap();

        let result = store.create(user("a@example.com")).await;
        assert!(matches!(result, Err(RepositoryError::EmailAlreadyExists)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_login() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("a@example.com")).await.unwrap();
        let at = Utc::now();

        store.record_login(created.id, at).await.unwrap();
        let reloaded = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.last_login, Some(at));

        let missing = store.record_login(Uuid::new_v4(), at).await;
        assert!(matches!(missing, Err(RepositoryError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_user_store_delete_frees_email() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("a@example.com")).await.unwrap();

        store.delete(created.id).await.unwrap();
        store.delete(created.id).await.unwrap();

        assert!(!store.exists_by_email("a@example.com").await.unwrap());
        assert!(store.find_by_id(created.id).await.unwrap().is_none());
        store.create(user("a@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_for_user_keeps_single_token() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::new_v4();
        let other_user = Uuid::new_v4();
        let expires = Utc::now() + Duration::days(7);

        store
            .replace_for_user(RefreshToken::new(user_id, "h1".to_string(), expires))
            .await
            .unwrap();
        store
            .replace_for_user(RefreshToken::new(other_user, "h2".to_string(), expires))
            .await
            .unwrap();
        store
            .replace_for_user(RefreshToken::new(user_id, "h3".to_string(), expires))
            .await
            .unwrap();

        assert_eq!(store.count_for_user(user_id).await.unwrap(), 1);
        assert_eq!(store.count_for_user(other_user).await.unwrap(), 1);
        assert!(store.find_by_hash("h1").await.unwrap().is_none());
        assert!(store.find_by_hash("h3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_by_hash_is_exact() {
        let store = InMemoryRefreshTokenStore::new();
        let expires = Utc::now() + Duration::days(7);
        store
            .replace_for_user(RefreshToken::new(Uuid::new_v4(), "abcdef".to_string(), expires))
            .await
            .unwrap();

        assert!(store.find_by_hash("abc").await.unwrap().is_none());
        assert!(store.find_by_hash("abcdef0").await.unwrap().is_none());
        assert!(store.find_by_hash("abcdef").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_replace_leaves_one_token() {
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let user_id = Uuid::new_v4();
        let expires = Utc::now() + Duration::days(7);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .replace_for_user(RefreshToken::new(user_id, format!("h{i}"), expires))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.count_for_user(user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = InMemoryRefreshTokenStore::new();
        assert!(store.delete(Uuid::new_v4()).await.is_ok());
    }
}
