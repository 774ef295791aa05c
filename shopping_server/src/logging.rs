//! Structured logging configuration.
//!
//! Everything goes through `tracing`; the auth library logs through the `log`
//! facade, which the subscriber picks up as well.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with quieter
/// database and HTTP internals.
///
/// # Example
///
/// ```no_run
/// use shopping_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `username` - Optional username as submitted
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use shopping_server::logging::log_security_event;
///
/// log_security_event("failed_login", None, Some("shopping"), "Invalid credentials");
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<i64>,
    username: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        username = username,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event("test_event", Some(1), Some("shopping"), "Test message");
        log_security_event("test_event", None, None, "Anonymous");
    }
}
