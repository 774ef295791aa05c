//! Authentication error types.

use std::time::Duration;

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed username/password
    #[error("{0}")]
    Validation(String),

    /// Unknown user or wrong password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Username already exists
    #[error("User already exists")]
    UsernameTaken,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store did not answer in time
    #[error("Session or user store unavailable after {0:?}")]
    StoreUnavailable(Duration),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// OS random number generator failed
    #[error("Entropy source unavailable")]
    EntropyUnavailable,

    /// Session payload could not be encoded or decoded
    #[error("Session payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Infrastructure failures collapse into a generic message so the SQL,
    /// hashing and payload details stay server-side.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_)
            | AuthError::HashingFailed
            | AuthError::EntropyUnavailable
            | AuthError::Serialization(_) => "Internal server error".to_string(),
            AuthError::StoreUnavailable(_) => "Service unavailable".to_string(),
            _ => self.to_string(),
        }
    }

    /// True for failures of the backing store's connection rather than of a query.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            AuthError::StoreUnavailable(_)
                | AuthError::Database(sqlx::Error::PoolTimedOut)
                | AuthError::Database(sqlx::Error::PoolClosed)
        )
    }

    /// True for errors the caller caused (validation, credentials, conflicts).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::Validation(_) | AuthError::InvalidCredentials | AuthError::UsernameTaken
        )
    }
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => AuthError::StoreUnavailable(duration),
            TimeoutError::Database(e) => AuthError::Database(e),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_database_details() {
        let err = AuthError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_credential_failures_share_one_message() {
        assert_eq!(AuthError::InvalidCredentials.client_message(), "Invalid credentials");
        assert_eq!(AuthError::UsernameTaken.client_message(), "User already exists");
    }

    #[test]
    fn test_timeout_maps_to_unavailable() {
        let err: AuthError = TimeoutError::Timeout(Duration::from_secs(5)).into();
        assert!(err.is_unavailable());
        assert_eq!(err.client_message(), "Service unavailable");
    }

    #[test]
    fn test_pool_timeout_is_unavailable() {
        assert!(AuthError::Database(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(!AuthError::Database(sqlx::Error::RowNotFound).is_unavailable());
    }

    #[test]
    fn test_client_error_classes() {
        assert!(AuthError::Validation("x".into()).is_client_error());
        assert!(AuthError::InvalidCredentials.is_client_error());
        assert!(!AuthError::HashingFailed.is_client_error());
    }
}
