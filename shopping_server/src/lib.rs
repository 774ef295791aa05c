//! # Shopping Server
//!
//! HTTP surface of the shopping assistant's account and session endpoints,
//! built on axum over the [`shopping_auth`] core.
//!
//! - [`api`]: router, handlers, session cookie and route guard
//! - [`config`]: environment-driven configuration
//! - [`logging`]: tracing subscriber and security-event logging
//! - [`metrics`]: Prometheus counters

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
