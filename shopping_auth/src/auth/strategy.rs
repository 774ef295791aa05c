//! Local username/password strategy.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{
    errors::{AuthError, AuthResult},
    hasher::CredentialHasher,
    models::{PasswordDigest, User},
};
use crate::db::UserDirectory;

/// Longest accepted username, in characters
pub const MAX_USERNAME_CHARS: usize = 64;

/// Longest accepted password, in bytes. Bounds the work handed to the KDF.
pub const MAX_PASSWORD_BYTES: usize = 1024;

/// Verifies a username/password pair.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve credentials to a user.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - malformed input, rejected before any lookup
    /// * `AuthError::InvalidCredentials` - unknown user or wrong password
    async fn authenticate(&self, username: &str, password: &str) -> AuthResult<User>;
}

/// Password checked for unknown usernames so both failures cost one derivation
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-users";

/// Username/password authentication against a [`UserDirectory`]
#[derive(Clone)]
pub struct LocalStrategy {
    users: Arc<dyn UserDirectory>,
    hasher: CredentialHasher,
    dummy_digest: Arc<OnceCell<PasswordDigest>>,
}

impl LocalStrategy {
    pub fn new(users: Arc<dyn UserDirectory>, hasher: CredentialHasher) -> Self {
        Self {
            users,
            hasher,
            dummy_digest: Arc::new(OnceCell::new()),
        }
    }

    /// Digest under this strategy's KDF parameters, made on first use.
    async fn dummy_digest(&self) -> AuthResult<&PasswordDigest> {
        self.dummy_digest
            .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
            .await
    }

    pub fn users(&self) -> &Arc<dyn UserDirectory> {
        &self.users
    }

    /// Register a new user
    ///
    /// The existence check only saves a hash computation in the common case;
    /// the directory's own uniqueness guarantee decides concurrent races.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - malformed input
    /// * `AuthError::UsernameTaken` - username already exists
    pub async fn register(&self, username: &str, password: &str) -> AuthResult<User> {
        validate_credentials(username, password)?;

        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let digest = self.hasher.hash(password).await?;
        let record = self.users.create_user(username, &digest).await?;
        log::debug!("Registered user {}", record.id);

        Ok(record.into_user())
    }
}

#[async_trait]
impl Authenticator for LocalStrategy {
    async fn authenticate(&self, username: &str, password: &str) -> AuthResult<User> {
        validate_credentials(username, password)?;

        let Some(record) = self.users.find_by_username(username).await? else {
            self.hasher.verify(password, self.dummy_digest().await?).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &record.password_digest).await {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(record.into_user())
    }
}

/// Validate username and password shape
pub fn validate_credentials(username: &str, password: &str) -> AuthResult<()> {
    if username.trim().is_empty() {
        return Err(AuthError::Validation("Username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AuthError::Validation(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(AuthError::Validation(
            "Username contains invalid characters".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::Validation("Password is too long".to_string()));
    }
    Ok(())
}
