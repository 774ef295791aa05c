//! Password hashing and verification.
//!
//! Digests are Argon2id keys over a per-password random salt, stored as
//! `hex(key).hex(salt)`. Key derivation is CPU and memory heavy, so the async
//! entry points run it on tokio's blocking pool.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use super::{
    errors::{AuthError, AuthResult},
    models::PasswordDigest,
};

/// Derived key length in bytes
pub const KEY_LEN: usize = 64;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Password hasher with fixed KDF parameters
///
/// Clones share one derivation counter.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
    derivations: Arc<AtomicUsize>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher {
    /// Hasher with the Argon2 recommended defaults (19 MiB, 2 passes, 1 lane).
    pub fn new() -> Self {
        Self {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
            derivations: Arc::default(),
        }
    }

    /// Hasher with explicit parameters
    ///
    /// # Arguments
    ///
    /// * `m_cost` - Memory size in KiB
    /// * `t_cost` - Number of passes
    /// * `p_cost` - Degree of parallelism
    ///
    /// Digests only verify under the parameters they were created with.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            p_cost,
            derivations: Arc::default(),
        }
    }

    /// Number of key derivations run so far
    pub fn derivations(&self) -> usize {
        self.derivations.load(Ordering::Relaxed)
    }

    /// Hash a password with a fresh salt.
    ///
    /// # Errors
    ///
    /// * `AuthError::EntropyUnavailable` - OS RNG failed
    /// * `AuthError::HashingFailed` - KDF rejected its parameters
    pub async fn hash(&self, password: &str) -> AuthResult<PasswordDigest> {
        let hasher = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|_| AuthError::HashingFailed)?
    }

    /// Check a password against a stored digest. Malformed digests never match.
    pub async fn verify(&self, password: &str, digest: &PasswordDigest) -> bool {
        let hasher = self.clone();
        let password = password.to_owned();
        let digest = digest.clone();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(&password, &digest))
            .await
            .unwrap_or(false)
    }

    /// Synchronous [`hash`](Self::hash).
    pub fn hash_blocking(&self, password: &str) -> AuthResult<PasswordDigest> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|_| AuthError::EntropyUnavailable)?;

        let mut key = [0u8; KEY_LEN];
        self.derive(password.as_bytes(), &salt, &mut key)
            .map_err(|_| AuthError::HashingFailed)?;

        Ok(PasswordDigest::encode(&key, &salt))
    }

    /// Synchronous [`verify`](Self::verify).
    pub fn verify_blocking(&self, password: &str, digest: &PasswordDigest) -> bool {
        let Some((stored_key, salt)) = digest.parts() else {
            return false;
        };
        if stored_key.len() != KEY_LEN {
            return false;
        }

        let mut key = [0u8; KEY_LEN];
        if self.derive(password.as_bytes(), &salt, &mut key).is_err() {
            return false;
        }

        key[..].ct_eq(&stored_key[..]).into()
    }

    fn derive(&self, password: &[u8], salt: &[u8], out: &mut [u8]) -> Result<(), argon2::Error> {
        self.derivations.fetch_add(1, Ordering::Relaxed);
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, Some(out.len()))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(password, salt, out)
    }
}
