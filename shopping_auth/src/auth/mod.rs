//! Authentication module: password hashing, the local strategy, and session
//! management.
//!
//! This module implements:
//! - Argon2id password digests in a `hex(key).hex(salt)` layout, verified in
//!   constant time
//! - A username/password [`Authenticator`] with registration
//! - Store-backed sessions with id regeneration on login
//! - HMAC-signed session cookie values
//! - The client-side route-guard decision
//!
//! ## Example
//!
//! ```no_run
//! use shopping_auth::auth::{CredentialHasher, LocalStrategy, SessionManager, SessionPolicy};
//! use shopping_auth::db::{Database, PgSessionStore, PgUserDirectory};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let users = Arc::new(PgUserDirectory::new(db.pool().clone()));
//!     let store = Arc::new(PgSessionStore::new(db.pool().clone()));
//!
//!     let strategy = LocalStrategy::new(users.clone(), CredentialHasher::new());
//!     let sessions = SessionManager::new(store, users, SessionPolicy::default());
//!
//!     let user = strategy.register("shopping", "shopping123").await?;
//!     let session = sessions.login(&user, None).await?;
//!     assert_eq!(sessions.resolve(&session.id).await?, Some(user));
//!     Ok(())
//! }
//! ```

pub mod cookie;
pub mod errors;
pub mod guard;
pub mod hasher;
pub mod models;
pub mod session;
pub mod strategy;

pub use cookie::CookieSigner;
pub use errors::{AuthError, AuthResult};
pub use guard::{AuthView, GuardDecision};
pub use hasher::CredentialHasher;
pub use models::{
    Credentials, PasswordDigest, Session, SessionData, SessionEvent, SessionState, User, UserId,
    UserRecord,
};
pub use session::{SessionManager, SessionPolicy, principal_to_token, token_to_principal};
pub use strategy::{Authenticator, LocalStrategy};
