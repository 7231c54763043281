//! Pluggable credential verification
//!
//! The orchestrator only asks "do these credentials belong to someone?".
//! [`StoreCredentialVerifier`] answers it from a [`UserStore`] and a
//! [`PasswordHasher`]; other backends can implement [`CredentialVerifier`].

use super::error::AuthError;
use super::models::User;
use super::password::PasswordHasher;
use super::repository::UserStore;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Resolve the user owning `email` if `password` matches.
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    async fn verify(&self, email: &str, password: &str) -> Result<User, AuthError>;
}

pub struct StoreCredentialVerifier {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl StoreCredentialVerifier {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }
}

#[async_trait]
impl CredentialVerifier for StoreCredentialVerifier {
    async fn verify(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.hasher.verify_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Stored password digest is unusable");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordConfig;
    use crate::auth::repository::InMemoryUserStore;

    async fn setup() -> StoreCredentialVerifier {
        let hasher = PasswordHasher::new(&PasswordConfig {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        })
        .unwrap();
        let users = Arc::new(InMemoryUserStore::new());
        users
            .create(User::new(
                "alice@example.com".to_string(),
                hasher.hash("pw12345678").unwrap(),
                "Alice".to_string(),
                "STUDENT".to_string(),
            ))
            .await
            .unwrap();
        users
            .create(User::new(
                "broken@example.com".to_string(),
                "not-a-phc-string".to_string(),
                "Broken".to_string(),
                "STUDENT".to_string(),
            ))
            .await
            .unwrap();
        StoreCredentialVerifier::new(users, hasher)
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let verifier = setup().await;
        let user = verifier.verify("alice@example.com", "pw12345678").await.unwrap();
        assert_eq!(user.name, "Alice");
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_the_same() {
        let verifier = setup().await;

        let wrong_password = verifier.verify("alice@example.com", "nope").await.unwrap_err();
        let unknown_email = verifier.verify("bob@example.com", "pw12345678").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_corrupt_digest_is_rejected() {
        let verifier = setup().await;
        let result = verifier.verify("broken@example.com", "anything").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
