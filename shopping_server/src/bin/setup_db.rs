//! Database setup tool.
//!
//! Creates the `users` and `session` tables, the default account, and
//! optionally one more account given on the command line.

use std::sync::Arc;

use anyhow::{Context, Error};
use pico_args::Arguments;
use shopping_auth::{
    auth::{AuthError, CredentialHasher, LocalStrategy},
    db::{Database, DatabaseConfig, PgUserDirectory},
};
use shopping_server::logging;

const DEFAULT_USERNAME: &str = "shopping";
const DEFAULT_PASSWORD: &str = "shopping123";

const HELP: &str = "\
Create the shopping assistant database schema and accounts

USAGE:
  setup_db [OPTIONS]

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --username   NAME        Also create this account (requires --password)
  --password   PASSWORD    Password for --username

FLAGS:
  -h, --help               Print help information
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let custom_username: Option<String> = pargs.opt_value_from_str("--username")?;
    let custom_password: Option<String> = pargs.opt_value_from_str("--password")?;

    logging::init();

    let mut config = DatabaseConfig::from_env();
    if let Some(url) = database_url {
        config.database_url = url;
    }

    let db = Database::new(&config)
        .await
        .context("Failed to connect to database")?;
    db.ensure_schema()
        .await
        .context("Failed to create database schema")?;
    tracing::info!("Users and session tables created or already exist");

    let strategy = LocalStrategy::new(
        Arc::new(PgUserDirectory::new(db.pool().clone())),
        CredentialHasher::new(),
    );

    create_account(&strategy, DEFAULT_USERNAME, DEFAULT_PASSWORD).await?;

    match (custom_username, custom_password) {
        (Some(username), Some(password)) => {
            create_account(&strategy, &username, &password).await?;
        }
        (None, None) => {}
        _ => anyhow::bail!("--username and --password must be given together"),
    }

    db.close().await;
    tracing::info!("Database setup complete");

    Ok(())
}

async fn create_account(strategy: &LocalStrategy, username: &str, password: &str) -> Result<(), Error> {
    match strategy.register(username, password).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, username, "Created user");
            Ok(())
        }
        Err(AuthError::UsernameTaken) => {
            tracing::info!(username, "User already exists");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to create user '{username}'")),
    }
}
