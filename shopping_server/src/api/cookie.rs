//! Session cookie transport.
//!
//! Reads the signed session id from the `Cookie` header and renders the
//! `Set-Cookie` values that issue or clear it.

use axum::http::{HeaderMap, header::COOKIE};
use chrono::Duration;
use shopping_auth::auth::CookieSigner;

/// Cookie name carrying the signed session id
pub const SESSION_COOKIE_NAME: &str = "shopping.sid";

/// How the session cookie is named, signed and scoped
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: &'static str,
    signer: CookieSigner,
    secure: bool,
    max_age: Duration,
}

impl SessionCookie {
    /// # Arguments
    ///
    /// * `secret` - Signing secret
    /// * `secure` - Add the `Secure` attribute (HTTPS deployments)
    /// * `max_age` - Cookie lifetime; should match the session policy
    pub fn new(secret: &str, secure: bool, max_age: Duration) -> Self {
        Self {
            name: SESSION_COOKIE_NAME,
            signer: CookieSigner::new(secret),
            secure,
            max_age,
        }
    }

    /// Session id presented by the request, if it carries a correctly signed cookie.
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == self.name)
            .find_map(|(_, value)| self.signer.verify(value.trim()))
    }

    /// `Set-Cookie` value issuing a session
    pub fn issue(&self, session_id: &str) -> String {
        self.render(&self.signer.sign(session_id), self.max_age.num_seconds())
    }

    /// `Set-Cookie` value removing the session cookie
    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age_secs: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.name, value, max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
