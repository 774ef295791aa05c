//! Session lifecycle: login, per-request resolution, logout.
//!
//! The manager is built once at startup around injected stores. It holds no
//! mutable state of its own; the [`SessionStore`] is the single source of truth.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{TryRngCore, rngs::OsRng};

use super::{
    errors::{AuthError, AuthResult},
    models::{Session, SessionData, User, UserId},
};
use crate::db::{SessionStore, UserDirectory};

/// Session id entropy in bytes (rendered as hex)
pub const SESSION_ID_BYTES: usize = 32;

/// Default session lifetime
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Expiry policy
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Lifetime of a session from login, or from its last use when `rolling`
    pub max_age: Duration,
    /// Slide the expiry forward on every resolved request
    pub rolling: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
            rolling: false,
        }
    }
}

/// What gets stored in a session for a principal.
pub fn principal_to_token(user: &User) -> UserId {
    user.id
}

/// Load the principal a session refers to; `None` if the user is gone.
pub async fn token_to_principal(
    users: &dyn UserDirectory,
    user_id: UserId,
) -> AuthResult<Option<User>> {
    Ok(users.find_by_id(user_id).await?.map(|r| r.into_user()))
}

/// Binds requests to sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            store,
            users,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Start an authenticated session
    ///
    /// Always issues a fresh id. A session id the client presented before
    /// logging in is destroyed, never promoted.
    ///
    /// # Arguments
    ///
    /// * `user` - The authenticated user
    /// * `previous` - Session id the request arrived with, if any
    pub async fn login(&self, user: &User, previous: Option<&str>) -> AuthResult<Session> {
        if let Some(previous) = previous {
            self.store.destroy(previous).await?;
        }

        let now = Utc::now();
        let session = Session {
            id: generate_session_id()?,
            data: SessionData {
                principal: Some(principal_to_token(user)),
                created_at: now,
            },
            expires_at: now + self.policy.max_age,
        };
        self.store.save(&session).await?;
        log::debug!("Session started for user {}", user.id);

        Ok(session)
    }

    /// Resolve a session id to its principal
    ///
    /// Missing, expired and principal-less sessions resolve to `None`. A session
    /// whose user no longer exists is destroyed and resolves to `None`. Store
    /// failures are returned as errors.
    pub async fn resolve(&self, session_id: &str) -> AuthResult<Option<User>> {
        let Some(session) = self.store.load(session_id).await? else {
            return Ok(None);
        };
        if session.is_expired() {
            return Ok(None);
        }
        let Some(user_id) = session.principal_id() else {
            return Ok(None);
        };

        let Some(user) = token_to_principal(self.users.as_ref(), user_id).await? else {
            log::warn!("Session references missing user {user_id}; invalidating");
            self.store.destroy(session_id).await?;
            return Ok(None);
        };

        if self.policy.rolling {
            self.store
                .touch(session_id, Utc::now() + self.policy.max_age)
                .await?;
        }

        Ok(Some(user))
    }

    /// End a session. Idempotent.
    pub async fn logout(&self, session_id: &str) -> AuthResult<()> {
        self.store.destroy(session_id).await
    }

    /// Remove expired sessions from the store
    pub async fn prune_expired(&self) -> AuthResult<u64> {
        self.store.prune_expired().await
    }
}

fn generate_session_id() -> AuthResult<String> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| AuthError::EntropyUnavailable)?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemorySessionStore, MemoryUserDirectory};
    use crate::auth::PasswordDigest;

    struct Fixture {
        manager: SessionManager,
        store: Arc<MemorySessionStore>,
        users: Arc<MemoryUserDirectory>,
        user: User,
    }

    async fn fixture(policy: SessionPolicy) -> Fixture {
        let store = Arc::new(MemorySessionStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let user = users
            .create_user("shopping", &PasswordDigest::from_stored("00.11"))
            .await
            .unwrap()
            .into_user();
        let manager = SessionManager::new(store.clone(), users.clone(), policy);
        Fixture {
            manager,
            store,
            users,
            user,
        }
    }

    #[tokio::test]
    async fn test_login_then_resolve() {
        let f = fixture(SessionPolicy::default()).await;
        let session = f.manager.login(&f.user, None).await.unwrap();

        assert_eq!(session.id.len(), SESSION_ID_BYTES * 2);
        assert_eq!(session.principal_id(), Some(f.user.id));
        assert_eq!(f.manager.resolve(&session.id).await.unwrap(), Some(f.user.clone()));
        assert_eq!(f.manager.resolve(&session.id).await.unwrap(), Some(f.user));
    }

    #[tokio::test]
    async fn test_default_expiry_is_thirty_days() {
        let f = fixture(SessionPolicy::default()).await;
        let session = f.manager.login(&f.user, None).await.unwrap();
        let ttl = session.expires_at - session.data.created_at;
        assert_eq!(ttl, Duration::days(30));
    }

    #[tokio::test]
    async fn test_login_regenerates_and_destroys_previous_id() {
        let f = fixture(SessionPolicy::default()).await;
        let first = f.manager.login(&f.user, None).await.unwrap();
        let second = f.manager.login(&f.user, Some(&first.id)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(f.store.get(&first.id).is_none());
        assert_eq!(f.manager.resolve(&first.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_session_is_anonymous() {
        let f = fixture(SessionPolicy::default()).await;
        assert_eq!(f.manager.resolve("not-a-session").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous() {
        let policy = SessionPolicy {
            max_age: Duration::seconds(-1),
            rolling: false,
        };
        let f = fixture(policy).await;
        let session = f.manager.login(&f.user, None).await.unwrap();
        assert_eq!(f.manager.resolve(&session.id).await.unwrap(), None);
        assert_eq!(f.manager.prune_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleted_user_invalidates_session() {
        let f = fixture(SessionPolicy::default()).await;
        let session = f.manager.login(&f.user, None).await.unwrap();

        f.users.remove(f.user.id);
        assert_eq!(f.manager.resolve(&session.id).await.unwrap(), None);
        assert!(f.store.get(&session.id).is_none());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let f = fixture(SessionPolicy::default()).await;
        let session = f.manager.login(&f.user, None).await.unwrap();

        f.manager.logout(&session.id).await.unwrap();
        f.manager.logout(&session.id).await.unwrap();
        assert_eq!(f.manager.resolve(&session.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_traffic_per_operation() {
        let f = fixture(SessionPolicy::default()).await;
        let session = f.manager.login(&f.user, None).await.unwrap();
        assert_eq!(f.store.writes(), 1);

        f.manager.resolve(&session.id).await.unwrap();
        assert_eq!(f.store.reads(), 1);
        assert_eq!(f.store.writes(), 1);

        f.manager.logout(&session.id).await.unwrap();
        assert_eq!(f.store.writes(), 2);
    }

    #[tokio::test]
    async fn test_rolling_policy_slides_expiry() {
        let policy = SessionPolicy {
            max_age: Duration::hours(1),
            rolling: true,
        };
        let f = fixture(policy).await;
        let session = f.manager.login(&f.user, None).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        f.manager.resolve(&session.id).await.unwrap();

        let stored = f.store.get(&session.id).unwrap();
        assert!(stored.expires_at > session.expires_at);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = generate_session_id().unwrap();
        let b = generate_session_id().unwrap();
        assert_ne!(a, b);
    }
}
