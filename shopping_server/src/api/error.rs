//! Mapping of failures to HTTP responses.
//!
//! Every error body is `{ "message": ... }`. Expected failures get stable
//! messages; infrastructure failures are logged here and reach the client
//! only as a generic message.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shopping_auth::auth::AuthError;

/// JSON body for errors and plain acknowledgements
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error returned by handlers and middleware
#[derive(Debug)]
pub enum ApiError {
    /// Failure from the auth core
    Auth(AuthError),
    /// No valid session on a guarded route
    Unauthorized,
    /// Body missing or not valid JSON
    BadRequest(String),
    /// Session store failed while logging out
    LogoutFailed(AuthError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            ApiError::Auth(err) | ApiError::LogoutFailed(err) if err.is_unavailable() => {
                (StatusCode::SERVICE_UNAVAILABLE, err.client_message())
            }
            ApiError::LogoutFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error logging out".to_string(),
            ),
            ApiError::Auth(err) => {
                let status = match err {
                    AuthError::Validation(_) | AuthError::UsernameTaken => StatusCode::BAD_REQUEST,
                    AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.client_message())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            match &self {
                ApiError::Auth(err) | ApiError::LogoutFailed(err) => {
                    tracing::error!(error = %err, status = status.as_u16(), "Request failed");
                }
                _ => tracing::error!(status = status.as_u16(), "Request failed"),
            }
        }
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_of(err: ApiError) -> (StatusCode, String) {
        err.status_and_message()
    }

    #[test]
    fn test_expected_failures() {
        assert_eq!(
            status_of(AuthError::InvalidCredentials.into()),
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        );
        assert_eq!(
            status_of(AuthError::UsernameTaken.into()),
            (StatusCode::BAD_REQUEST, "User already exists".to_string())
        );
        assert_eq!(
            status_of(AuthError::Validation("Username is required".into()).into()),
            (StatusCode::BAD_REQUEST, "Username is required".to_string())
        );
        assert_eq!(
            status_of(ApiError::Unauthorized),
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        );
    }

    #[test]
    fn test_infrastructure_failures_are_generic() {
        let (status, message) = status_of(AuthError::Database(sqlx::Error::RowNotFound).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn test_store_timeout_is_503() {
        let (status, _) = status_of(AuthError::StoreUnavailable(Duration::from_secs(5)).into());
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) =
            status_of(ApiError::LogoutFailed(AuthError::Database(sqlx::Error::PoolTimedOut)));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_logout_failure_message() {
        let (status, message) =
            status_of(ApiError::LogoutFailed(AuthError::Database(sqlx::Error::RowNotFound)));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Error logging out");
    }
}
