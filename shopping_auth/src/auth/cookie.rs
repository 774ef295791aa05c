//! Session cookie signing.
//!
//! The cookie carries `<session id>.<hex HMAC-SHA256(secret, session id)>`.
//! Only the session id is meaningful; the signature stops clients from
//! presenting ids they were never issued.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed signer for session cookie values
#[derive(Clone)]
pub struct CookieSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CookieSigner(..)")
    }
}

impl CookieSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Produce the cookie value for a session id.
    pub fn sign(&self, session_id: &str) -> String {
        let tag = self.mac(session_id).finalize().into_bytes();
        format!("{}.{}", session_id, hex::encode(tag))
    }

    /// Recover the session id from a cookie value.
    ///
    /// Returns `None` for unsigned, tampered or otherwise malformed values.
    /// The tag comparison is constant-time.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (session_id, tag) = value.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }
        let tag = hex::decode(tag).ok()?;
        self.mac(session_id).verify_slice(&tag).ok()?;
        Some(session_id.to_string())
    }

    fn mac(&self, session_id: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(session_id.as_bytes());
        mac
    }
}
