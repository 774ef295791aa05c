//! HTTP API for the shopping assistant's account and session endpoints.
//!
//! # Modules
//!
//! - [`auth`]: register, login, logout and current-user handlers
//! - [`cookie`]: reading and issuing the signed session cookie
//! - [`middleware`]: route guard for protected endpoints
//! - [`error`]: mapping of failures to status codes and `{message}` bodies
//! - [`request_id`]: request correlation ids
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `POST /api/register` - Register and start a session
//! - `POST /api/login` - Login with credentials
//! - `POST /api/logout` - End the session
//!
//! ## Requires a session
//! - `GET /api/user` - The signed-in user
//!
//! ## Health Check
//! - `GET /health` - Session store health
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use shopping_server::api::{AppState, cookie::SessionCookie, create_router};
//! use shopping_auth::auth::{CredentialHasher, LocalStrategy, SessionManager, SessionPolicy};
//! use shopping_auth::db::memory::{MemorySessionStore, MemoryUserDirectory};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let users = Arc::new(MemoryUserDirectory::new());
//! let policy = SessionPolicy::default();
//! let state = AppState::new(
//!     LocalStrategy::new(users.clone(), CredentialHasher::new()),
//!     SessionManager::new(Arc::new(MemorySessionStore::new()), users, policy.clone()),
//!     SessionCookie::new("a-signing-secret-of-at-least-32-chars", false, policy.max_age),
//! );
//!
//! let app = create_router(state, None);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cookie;
pub mod error;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use shopping_auth::auth::{LocalStrategy, SessionManager};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use cookie::SessionCookie;

/// Application state shared across all handlers.
///
/// Cloned per request; every field sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub strategy: Arc<LocalStrategy>,
    pub sessions: Arc<SessionManager>,
    pub cookies: Arc<SessionCookie>,
}

impl AppState {
    pub fn new(strategy: LocalStrategy, sessions: SessionManager, cookies: SessionCookie) -> Self {
        Self {
            strategy: Arc::new(strategy),
            sessions: Arc::new(sessions),
            cookies: Arc::new(cookies),
        }
    }
}

/// Create the API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state
/// - `cors_origin`: Browser origin allowed to send credentialed requests; no
///   CORS headers are emitted when `None`
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health        - Health check (public)
/// POST /api/register  - Register user (public)
/// POST /api/login     - Login (public)
/// POST /api/logout    - Logout (public, idempotent)
/// GET  /api/user      - Current user (session required)
/// ```
pub fn create_router(state: AppState, cors_origin: Option<HeaderValue>) -> Router {
    let public_routes = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/health", get(health_check));

    let protected_routes = Router::new()
        .route("/api/user", get(auth::current_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state);

    match cors_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([CONTENT_TYPE])
                .allow_credentials(true),
        ),
        None => router,
    }
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the session store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"healthy","store":true,"timestamp":"2026-01-12T10:30:00Z","version":"0.1.0"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.sessions.store().health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Session store health check failed");
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
