//! Store capabilities consumed by the authentication core.
//!
//! The auth core never talks to a database directly. It goes through these two
//! traits so the backing store can be swapped (PostgreSQL in production,
//! [`memory`](super::memory) in tests) and so the store handle is injected at
//! startup rather than reached through global state.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::timeouts::{MAINTENANCE_TIMEOUT, TimeoutError, with_default_timeout, with_timeout};
use crate::auth::{
    AuthError, AuthResult, PasswordDigest, Session, SessionData, UserId, UserRecord,
};

/// Lookup and creation of user records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>>;

    /// Find user by username (case-sensitive exact match)
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>>;

    /// Create a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - the store already holds this username,
    ///   including when a concurrent registration won the race
    async fn create_user(
        &self,
        username: &str,
        password_digest: &PasswordDigest,
    ) -> AuthResult<UserRecord>;
}

/// Durable session records keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load an unexpired session
    async fn load(&self, session_id: &str) -> AuthResult<Option<Session>>;

    /// Insert or replace a session
    async fn save(&self, session: &Session) -> AuthResult<()>;

    /// Move a session's expiry
    async fn touch(&self, session_id: &str, expires_at: DateTime<Utc>) -> AuthResult<()>;

    /// Delete a session; deleting an absent session is not an error
    async fn destroy(&self, session_id: &str) -> AuthResult<()>;

    /// Delete all expired sessions, returning how many were removed
    async fn prune_expired(&self) -> AuthResult<u64>;

    /// Check the store is reachable
    async fn health_check(&self) -> AuthResult<()> {
        Ok(())
    }
}

/// PostgreSQL implementation of [`UserDirectory`] over the `users` table
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: i64::from(row.get::<i32, _>("id")),
        username: row.get("username"),
        password_digest: PasswordDigest::from_stored(row.get::<String, _>("password")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>> {
        // serial column; ids outside i32 cannot exist
        let Ok(user_id) = i32::try_from(user_id) else {
            return Ok(None);
        };
        let row = with_default_timeout(
            sqlx::query("SELECT id, username, password FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, username, password FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_user(
        &self,
        username: &str,
        password_digest: &PasswordDigest,
    ) -> AuthResult<UserRecord> {
        let result = with_default_timeout(
            sqlx::query(
                "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING id, username, password",
            )
            .bind(username)
            .bind(password_digest.as_str())
            .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)),
            Err(TimeoutError::Database(e)) if is_unique_violation(&e) => {
                Err(AuthError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// PostgreSQL implementation of [`SessionStore`] over the `session` table
///
/// The payload column holds [`SessionData`] as JSON; `expire` is a UTC
/// timestamp without zone, indexed for the expiry sweep.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, session_id: &str) -> AuthResult<Option<Session>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT sid, sess::text AS sess, expire
                FROM session
                WHERE sid = $1 AND expire > $2
                "#,
            )
            .bind(session_id)
            .bind(Utc::now().naive_utc())
            .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: SessionData = serde_json::from_str(row.get::<&str, _>("sess"))?;
        Ok(Some(Session {
            id: row.get("sid"),
            data,
            expires_at: row.get::<NaiveDateTime, _>("expire").and_utc(),
        }))
    }

    async fn save(&self, session: &Session) -> AuthResult<()> {
        let payload = serde_json::to_string(&session.data)?;
        with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO session (sid, sess, expire)
                VALUES ($1, $2::json, $3)
                ON CONFLICT (sid) DO UPDATE SET sess = EXCLUDED.sess, expire = EXCLUDED.expire
                "#,
            )
            .bind(&session.id)
            .bind(payload)
            .bind(session.expires_at.naive_utc())
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn touch(&self, session_id: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE session SET expire = $2 WHERE sid = $1")
                .bind(session_id)
                .bind(expires_at.naive_utc())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> AuthResult<()> {
        with_default_timeout(
            sqlx::query("DELETE FROM session WHERE sid = $1")
                .bind(session_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn prune_expired(&self) -> AuthResult<u64> {
        let result = with_timeout(
            MAINTENANCE_TIMEOUT,
            sqlx::query("DELETE FROM session WHERE expire <= $1")
                .bind(Utc::now().naive_utc())
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> AuthResult<()> {
        with_default_timeout(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialHasher;
    use crate::db::{Database, DatabaseConfig};
    use chrono::Duration;

    async fn setup_pool() -> PgPool {
        let db = Database::new(&DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        db.ensure_schema().await.expect("Failed to create schema");
        db.pool().clone()
    }

    fn unique_name(prefix: &str) -> String {
        let suffix: u32 = rand::random();
        format!("{prefix}_{suffix}")
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_pg_duplicate_username_is_taken() {
        let users = PgUserDirectory::new(setup_pool().await);
        let digest = CredentialHasher::with_params(256, 1, 1)
            .hash_blocking("pw")
            .unwrap();
        let username = unique_name("dup");

        let first = users.create_user(&username, &digest).await.unwrap();
        let second = users.create_user(&username, &digest).await;
        assert!(matches!(second, Err(AuthError::UsernameTaken)));

        let found = users.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.password_digest.as_str(), digest.as_str());
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_pg_session_lifecycle() {
        let store = PgSessionStore::new(setup_pool().await);
        let session = Session {
            id: unique_name("sid"),
            data: SessionData {
                principal: Some(1),
                created_at: Utc::now(),
            },
            expires_at: Utc::now() + Duration::hours(1),
        };

        store.save(&session).await.unwrap();
        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, session.data);

        store.destroy(&session.id).await.unwrap();
        store.destroy(&session.id).await.unwrap();
        assert!(store.load(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_pg_expired_session_is_invisible_and_pruned() {
        let store = PgSessionStore::new(setup_pool().await);
        let session = Session {
            id: unique_name("old"),
            data: SessionData {
                principal: Some(1),
                created_at: Utc::now() - Duration::days(2),
            },
            expires_at: Utc::now() - Duration::days(1),
        };

        store.save(&session).await.unwrap();
        assert!(store.load(&session.id).await.unwrap().is_none());
        assert!(store.prune_expired().await.unwrap() >= 1);
    }
}
