//! Shopping assistant authentication server.
//!
//! Serves the register/login/logout/current-user API backed by PostgreSQL
//! users and sessions.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Error};
use pico_args::Arguments;
use shopping_auth::{
    auth::{CredentialHasher, LocalStrategy, SessionManager, SessionPolicy},
    db::{Database, PgSessionStore, PgUserDirectory},
};
use shopping_server::{
    api::{self, AppState, cookie::SessionCookie},
    config::ServerConfig,
    logging, metrics,
};

const HELP: &str = "\
Run the shopping assistant authentication server

USAGE:
  shopping_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:5000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SESSION_SECRET           Cookie signing secret, at least 32 characters (required)
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:5000)
  DATABASE_URL             PostgreSQL connection string
  APP_ENV                  Set to 'production' to mark cookies Secure
  SESSION_MAX_AGE_DAYS     Session lifetime in days [default: 30]
  SESSION_ROLLING          Extend sessions on every request [default: false]
  CORS_ORIGIN              Browser origin allowed to send credentials
  METRICS_BIND             Prometheus exporter bind address
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url)?;
    tracing::info!(bind = %config.bind, session = ?config.session, "Loaded configuration");

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        tracing::info!(%addr, "Prometheus exporter listening");
    }

    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.ensure_schema()
        .await
        .context("Failed to create database schema")?;
    tracing::info!("Database connected successfully");

    let users = Arc::new(PgUserDirectory::new(db.pool().clone()));
    let store = Arc::new(PgSessionStore::new(db.pool().clone()));
    let policy = SessionPolicy {
        max_age: chrono::Duration::days(config.session.max_age_days),
        rolling: config.session.rolling,
    };

    let state = AppState::new(
        LocalStrategy::new(users.clone(), CredentialHasher::new()),
        SessionManager::new(store, users, policy.clone()),
        SessionCookie::new(
            &config.session.secret,
            config.session.secure_cookies,
            policy.max_age,
        ),
    );

    let pruner = tokio::spawn(prune_expired_sessions(
        state.sessions.clone(),
        Duration::from_secs(config.session.prune_interval_secs),
    ));

    let app = api::create_router(state, config.cors_origin.clone());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");
    pruner.abort();
    db.close().await;

    Ok(())
}

/// Periodically delete expired sessions
async fn prune_expired_sessions(sessions: Arc<SessionManager>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match sessions.prune_expired().await {
            Ok(0) => {}
            Ok(count) => {
                metrics::sessions_pruned_total(count);
                tracing::info!(count, "Pruned expired sessions");
            }
            Err(e) => tracing::warn!(error = %e, "Failed to prune expired sessions"),
        }
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
}
