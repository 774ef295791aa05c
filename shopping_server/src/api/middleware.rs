//! Route guard for protected endpoints.
//!
//! [`require_auth`] resolves the session cookie to a user before the handler
//! runs. Requests without a live session get `401 {"message":"Unauthorized"}`
//! and never reach the handler.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! # use shopping_server::api::middleware::{CurrentUser, require_auth};
//! # use shopping_server::api::AppState;
//! # let state: AppState = unimplemented!();
//!
//! async fn whoami(CurrentUser(user): CurrentUser) -> String {
//!     format!("Signed in as {}", user.username)
//! }
//!
//! let protected: Router = Router::new()
//!     .route("/api/whoami", get(whoami))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
//!     .with_state(state);
//! # let _ = protected;
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use shopping_auth::auth::User;

use super::{AppState, error::ApiError};
use crate::metrics;

/// The authenticated principal for the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Admit requests carrying a live session; reject the rest with 401.
///
/// # Behavior
///
/// - **Valid session**: Injects [`CurrentUser`] into request extensions → Calls next handler.
///   Under a rolling policy the response re-issues the cookie with a fresh max-age.
/// - **Missing, unsigned or tampered cookie**: `401 Unauthorized`
/// - **Unknown, expired or stale session**: `401 Unauthorized`
/// - **Session store failure**: `500`/`503`, never a silent 401
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(session_id) = state.cookies.read(request.headers()) else {
        return Err(reject("no valid session cookie"));
    };

    match state.sessions.resolve(&session_id).await? {
        Some(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            let mut response = next.run(request).await;
            if state.sessions.policy().rolling {
                if let Ok(cookie) = HeaderValue::from_str(&state.cookies.issue(&session_id)) {
                    response.headers_mut().append(SET_COOKIE, cookie);
                }
            }
            Ok(response)
        }
        None => Err(reject("session not found or expired")),
    }
}

fn reject(reason: &'static str) -> ApiError {
    tracing::debug!(reason, "Rejected unauthenticated request");
    metrics::guard_rejections_total();
    ApiError::Unauthorized
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}
