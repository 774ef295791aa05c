//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use axum::http::HeaderValue;
use shopping_auth::db::DatabaseConfig;
use std::net::SocketAddr;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Longest accepted session lifetime (ten years)
pub const MAX_SESSION_AGE_DAYS: i64 = 3650;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session and cookie configuration
    pub session: SessionConfig,
    /// Optional Prometheus scrape listener
    pub metrics_bind: Option<SocketAddr>,
    /// Browser origin allowed to call the API with credentials
    pub cors_origin: Option<HeaderValue>,
}

/// Session-related configuration
#[derive(Clone)]
pub struct SessionConfig {
    /// Cookie signing secret (required)
    pub secret: String,
    /// Mark the cookie `Secure` (encrypted transport deployments)
    pub secure_cookies: bool,
    /// Session lifetime in days
    pub max_age_days: i64,
    /// Slide expiry forward on every authenticated request
    pub rolling: bool,
    /// Seconds between expired-session sweeps
    pub prune_interval_secs: u64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("secure_cookies", &self.secure_cookies)
            .field("max_age_days", &self.max_age_days)
            .field("rolling", &self.rolling)
            .field("prune_interval_secs", &self.prune_interval_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND")?.unwrap_or_else(default_bind),
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let secret = std::env::var("SESSION_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "SESSION_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let production = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let session = SessionConfig {
            secret,
            secure_cookies: parse_env_or("COOKIE_SECURE", production),
            max_age_days: parse_env_or("SESSION_MAX_AGE_DAYS", 30),
            rolling: parse_env_or("SESSION_ROLLING", false),
            prune_interval_secs: parse_env_or("SESSION_PRUNE_INTERVAL_SECS", 900),
        };

        let config = ServerConfig {
            bind,
            database,
            session,
            metrics_bind: parse_addr("METRICS_BIND")?,
            cors_origin: parse_origin("CORS_ORIGIN")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "SESSION_SECRET".to_string(),
                reason: "Must be at least 32 characters".to_string(),
            });
        }

        if !(1..=MAX_SESSION_AGE_DAYS).contains(&self.session.max_age_days) {
            return Err(ConfigError::Invalid {
                var: "SESSION_MAX_AGE_DAYS".to_string(),
                reason: format!("Must be between 1 and {MAX_SESSION_AGE_DAYS}"),
            });
        }

        if self.session.prune_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_PRUNE_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    DEFAULT_BIND.parse().expect("Default bind address is valid")
}

fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not a socket address"),
        }),
        Err(_) => Ok(None),
    }
}

fn parse_origin(key: &str) -> Result<Option<HeaderValue>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value == "*" => Err(ConfigError::Invalid {
            var: key.to_string(),
            reason: "Wildcard origin cannot be combined with cookies".to_string(),
        }),
        Ok(value) => HeaderValue::from_str(&value)
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' is not a valid origin"),
            }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
