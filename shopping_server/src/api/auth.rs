//! Authentication API handlers.
//!
//! Register, login, logout and current-user endpoints. Successful register and
//! login responses set the signed session cookie; logout clears it.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -i -X POST http://localhost:5000/api/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "shopping", "password": "shopping123"}'
//! ```
//!
//! Fetch the current user with the cookie from the response above:
//! ```bash
//! curl -i http://localhost:5000/api/user --cookie "shopping.sid=..."
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use serde::Deserialize;
use shopping_auth::auth::{AuthError, Authenticator, Credentials, User};

use super::{
    AppState,
    error::{ApiError, MessageResponse},
    middleware::CurrentUser,
};
use crate::{logging::log_security_event, metrics};

/// Request body for register and login. Fields are optional so that a
/// missing field is reported as a validation error rather than a parse error.
#[derive(Debug, Deserialize)]
pub struct CredentialsPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<CredentialsPayload> for Credentials {
    type Error = AuthError;

    fn try_from(payload: CredentialsPayload) -> Result<Self, Self::Error> {
        let username = payload
            .username
            .ok_or_else(|| AuthError::Validation("Username is required".to_string()))?;
        let password = payload
            .password
            .ok_or_else(|| AuthError::Validation("Password is required".to_string()))?;
        Ok(Credentials { username, password })
    }
}

fn credentials(
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<Credentials, ApiError> {
    let Json(payload) = payload?;
    Ok(Credentials::try_from(payload)?)
}

/// Register a new user account and log them in.
///
/// # Request Body
///
/// ```json
/// { "username": "shopping", "password": "shopping123" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "id": 1, "username": "shopping" }` and a session cookie.
///
/// # Errors
///
/// - `400 Bad Request`: `{"message":"User already exists"}` or a validation message
/// - `500`/`503`: infrastructure failure
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = credentials(payload)?;

    let user = match state.strategy.register(&creds.username, &creds.password).await {
        Ok(user) => {
            metrics::registrations_total("created");
            user
        }
        Err(e) => {
            metrics::registrations_total(match e {
                AuthError::UsernameTaken => "taken",
                AuthError::Validation(_) => "invalid",
                _ => "error",
            });
            return Err(e.into());
        }
    };

    let set_cookie = start_session(&state, &headers, &user).await?;
    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, [(SET_COOKIE, set_cookie)], Json(user)))
}

/// Authenticate with username and password.
///
/// # Response
///
/// `200 OK` with `{ "id": 1, "username": "shopping" }` and a fresh session cookie.
///
/// # Errors
///
/// - `401 Unauthorized`: `{"message":"Invalid credentials"}`, whether the user
///   is unknown or the password is wrong
/// - `400 Bad Request`: malformed body
///
/// # Security
///
/// - Any session id presented with the request is discarded, and a new one issued
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = credentials(payload)?;

    let user = match state.strategy.authenticate(&creds.username, &creds.password).await {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                metrics::login_attempts_total(false);
                log_security_event(
                    "failed_login",
                    None,
                    Some(&creds.username),
                    "Invalid credentials",
                );
            }
            return Err(e.into());
        }
    };

    let set_cookie = start_session(&state, &headers, &user).await?;
    metrics::login_attempts_total(true);
    tracing::info!(user_id = user.id, "User logged in");

    Ok(([(SET_COOKIE, set_cookie)], Json(user)))
}

/// End the current session.
///
/// Always clears the cookie. Succeeds without a session, so repeated logouts
/// are harmless.
///
/// # Response
///
/// `200 OK` with `{"message":"Logged out successfully"}`
///
/// # Errors
///
/// - `500 Internal Server Error`: `{"message":"Error logging out"}`
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(session_id) = state.cookies.read(&headers) {
        state
            .sessions
            .logout(&session_id)
            .await
            .map_err(ApiError::LogoutFailed)?;
        metrics::logouts_total();
    }

    Ok((
        [(SET_COOKIE, state.cookies.clear())],
        Json(MessageResponse::new("Logged out successfully")),
    ))
}

/// The signed-in user. Mounted behind the route guard.
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn start_session(
    state: &AppState,
    headers: &HeaderMap,
    user: &User,
) -> Result<String, ApiError> {
    let previous = state.cookies.read(headers);
    let session = state.sessions.login(user, previous.as_deref()).await?;
    Ok(state.cookies.issue(&session.id))
}
