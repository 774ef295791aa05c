//! Authentication data models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User ID type
pub type UserId = i64;

/// Public view of a user. This is what leaves the authentication boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// Stored user row, including the password digest.
#[derive(Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_digest: PasswordDigest,
}

impl UserRecord {
    /// Strip the digest.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
        }
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Salted password digest in the `hex(key).hex(salt)` layout.
///
/// Compared only through [`CredentialHasher::verify`](super::CredentialHasher::verify).
#[derive(Clone)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap a digest string read from storage. No validation happens here;
    /// a malformed value simply never verifies.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into `(key, salt)`. `None` if the layout is broken.
    pub fn parts(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        let (key, salt) = self.0.split_once('.')?;
        let key = hex::decode(key).ok()?;
        let salt = hex::decode(salt).ok()?;
        if key.is_empty() || salt.is_empty() {
            return None;
        }
        Some((key, salt))
    }

    pub(crate) fn encode(key: &[u8], salt: &[u8]) -> Self {
        Self(format!("{}.{}", hex::encode(key), hex::encode(salt)))
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// Username/password pair as submitted by a client.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Serialized session payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Authenticated principal, if any
    pub principal: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Session record as held by a session store.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn principal_id(&self) -> Option<UserId> {
        self.data.principal
    }
}

/// Lifecycle of a single client's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Events that move a session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoginSucceeded,
    LoginFailed,
    Logout,
    Expired,
    UserDeleted,
}

impl SessionState {
    /// Apply an event. Events that do not apply to the current state leave it unchanged.
    pub fn transition(self, event: SessionEvent) -> SessionState {
        match (self, event) {
            (SessionState::Anonymous, SessionEvent::LoginSucceeded) => SessionState::Authenticated,
            (
                SessionState::Authenticated,
                SessionEvent::Logout | SessionEvent::Expired | SessionEvent::UserDeleted,
            ) => SessionState::Anonymous,
            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_user_serializes_without_digest() {
        let record = UserRecord {
            id: 1,
            username: "shopping".to_string(),
            password_digest: PasswordDigest::from_stored("aa.bb"),
        };
        let json = serde_json::to_value(record.into_user()).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 1, "username": "shopping" }));
    }

    #[test]
    fn test_digest_parts() {
        let digest = PasswordDigest::encode(&[1, 2, 3], &[4, 5]);
        assert_eq!(digest.as_str(), "010203.0405");
        assert_eq!(digest.parts(), Some((vec![1, 2, 3], vec![4, 5])));
    }

    #[test]
    fn test_malformed_digest_has_no_parts() {
        for raw in ["", "nodot", "zz.00", "00.", ".00", "00.0g"] {
            assert!(PasswordDigest::from_stored(raw).parts().is_none(), "{raw}");
        }
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let creds = Credentials {
            username: "bob".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
        let digest = PasswordDigest::from_stored("abcdef.0123");
        assert!(!format!("{digest:?}").contains("abcdef"));
    }

    #[test]
    fn test_session_expiry() {
        let data = SessionData {
            principal: Some(1),
            created_at: Utc::now(),
        };
        let live = Session {
            id: "a".to_string(),
            data: data.clone(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        let dead = Session {
            id: "b".to_string(),
            data,
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(!live.is_expired());
        assert!(dead.is_expired());
    }

    #[test]
    fn test_state_machine() {
        use SessionEvent::*;
        use SessionState::*;

        assert_eq!(Anonymous.transition(LoginFailed), Anonymous);
        assert_eq!(Anonymous.transition(LoginSucceeded), Authenticated);
        assert_eq!(Authenticated.transition(Logout), Anonymous);
        assert_eq!(Authenticated.transition(Expired), Anonymous);
        assert_eq!(Authenticated.transition(UserDeleted), Anonymous);
        assert_eq!(Anonymous.transition(Logout), Anonymous);
    }
}
