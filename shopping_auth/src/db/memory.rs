//! In-process stores.
//!
//! Backed by mutex-guarded maps. Used by the test suites and handy for running
//! the server without PostgreSQL; nothing here survives a restart.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::repository::{SessionStore, UserDirectory};
use crate::auth::{AuthError, AuthResult, PasswordDigest, Session, UserId, UserRecord};

#[derive(Default)]
struct Users {
    by_id: HashMap<UserId, UserRecord>,
    next_id: UserId,
}

/// In-memory [`UserDirectory`]; ids start at 1 like a serial column.
///
/// Counts lookups (by id or username) for tests.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<Users>,
    lookups: AtomicUsize,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, as an administrator would.
    pub fn remove(&self, user_id: UserId) -> Option<UserRecord> {
        self.lock().by_id.remove(&user_id)
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    /// Number of `find_by_*` calls served
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Users> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().by_id.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lock()
            .by_id
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        password_digest: &PasswordDigest,
    ) -> AuthResult<UserRecord> {
        // Check and insert under one lock, like a unique constraint.
        let mut users = self.lock();
        if users.by_id.values().any(|u| u.username == username) {
            return Err(AuthError::UsernameTaken);
        }

        users.next_id += 1;
        let record = UserRecord {
            id: users.next_id,
            username: username.to_string(),
            password_digest: password_digest.clone(),
        };
        users.by_id.insert(record.id, record.clone());
        Ok(record)
    }
}

/// In-memory [`SessionStore`]
///
/// Counts reads and writes so tests can check how often the store is hit.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `load` calls so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `save`, `touch` and `destroy` calls so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Sessions currently held, expired ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw access for tests that need to age a session.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.lock().get(session_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn count_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> AuthResult<Option<Session>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lock()
            .get(session_id)
            .filter(|s| !s.is_expired())
            .cloned())
    }

    async fn save(&self, session: &Session) -> AuthResult<()> {
        self.count_write();
        self.lock().insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn touch(&self, session_id: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        self.count_write();
        if let Some(session) = self.lock().get_mut(session_id) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> AuthResult<()> {
        self.count_write();
        self.lock().remove(session_id);
        Ok(())
    }

    async fn prune_expired(&self) -> AuthResult<u64> {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
