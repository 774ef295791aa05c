//! Table definitions for users and sessions.

use sqlx::PgPool;

/// Users table; the unique constraint is what makes concurrent
/// registrations of one username safe.
pub const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS "users" (
    "id" serial PRIMARY KEY NOT NULL,
    "username" text NOT NULL,
    "password" text NOT NULL,
    CONSTRAINT "users_username_unique" UNIQUE("username")
)
"#;

/// Session table keyed by session id, with the serialized payload and expiry.
pub const SESSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS "session" (
    "sid" varchar NOT NULL PRIMARY KEY,
    "sess" json NOT NULL,
    "expire" timestamp(6) NOT NULL
)
"#;

/// Index backing the expiry sweep.
pub const SESSION_EXPIRE_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS "IDX_session_expire" ON "session" ("expire")"#;

/// Create all tables and indexes if they do not exist yet.
///
/// Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in [USERS_TABLE, SESSION_TABLE, SESSION_EXPIRE_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }
    log::debug!("Schema ensured");
    Ok(())
}
