//! # Shopping Auth
//!
//! Authentication and session core for the shopping assistant.
//!
//! The crate owns everything with security obligations behind the chat UI:
//! password hashing, credential verification, the session lifecycle and the
//! route-guard contract. Everything else in the application talks to it through
//! the current-user contract.
//!
//! ## Core Modules
//!
//! - [`auth`]: hasher, local strategy, session manager, cookie signing, guard
//! - [`db`]: connection pooling, schema, and the user/session stores
//!
//! ## Example
//!
//! ```no_run
//! use shopping_auth::auth::{Authenticator, CredentialHasher, LocalStrategy};
//! use shopping_auth::db::memory::MemoryUserDirectory;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), shopping_auth::auth::AuthError> {
//! let users = Arc::new(MemoryUserDirectory::new());
//! let strategy = LocalStrategy::new(users, CredentialHasher::new());
//!
//! strategy.register("shopping", "shopping123").await?;
//! let user = strategy.authenticate("shopping", "shopping123").await?;
//! assert_eq!(user.username, "shopping");
//! # Ok(())
//! # }
//! ```

/// Credentials, sessions, and route protection.
pub mod auth;

/// Persistence for users and sessions.
pub mod db;
