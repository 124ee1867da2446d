//! Password hashing
//!
//! New hashes are Argon2id in PHC string format with the configured work
//! factor. Hashes imported from the previous bcrypt-based deployment
//! (`$2a$`, `$2b$`, `$2y$`) still verify and are reported as needing an
//! upgrade so the next successful login can re-hash them.

use std::sync::Arc;

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
};

use crate::config::PasswordConfig;
use crate::error::AuthError;

const DUMMY_PASSWORD: &str = "pressroom-timing-equalizer";

/// Argon2id hasher with a fixed work factor
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Verified against when the account does not exist, so unknown
    /// emails cost the same as wrong passwords
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self, AuthError> {
        config.validate()?;

        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::InvalidConfig(format!("argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self {
            argon2,
            dummy_hash: Arc::from(""),
        };
        hasher.dummy_hash = Arc::from(hasher.hash(DUMMY_PASSWORD)?);
        Ok(hasher)
    }

    /// Hash a plaintext password
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// Malformed hashes verify as `false`.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        if is_bcrypt(hash) {
            return bcrypt::verify(plaintext, hash).unwrap_or(false);
        }

        match PasswordHash::new(hash) {
            // Parameters come from the stored hash, not from `self`
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Whether a stored hash should be replaced with one using the current settings
    pub fn needs_rehash(&self, hash: &str) -> bool {
        if is_bcrypt(hash) {
            return true;
        }

        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        let current = self.argon2.params();
        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != current.m_cost()
                    || stored.t_cost() != current.t_cost()
                    || stored.p_cost() != current.p_cost()
            }
            Err(_) => true,
        }
    }

    /// Hash on the blocking pool
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::PasswordHash(format!("hashing task failed: {}", e)))?
    }

    /// Verify on the blocking pool
    ///
    /// With `hash == None` the dummy hash is checked instead and the result
    /// is always `false`.
    pub async fn verify_blocking(
        &self,
        plaintext: &str,
        hash: Option<&str>,
    ) -> Result<bool, AuthError> {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();
        let known = hash.is_some();
        let hash = hash.map(str::to_string);

        let matched = tokio::task::spawn_blocking(move || {
            let target = hash.as_deref().unwrap_or(hasher.dummy_hash.as_ref());
            hasher.verify(&plaintext, target)
        })
        .await
        .map_err(|e| AuthError::PasswordHash(format!("verification task failed: {}", e)))?;

        Ok(known && matched)
    }
}

fn is_bcrypt(hash: &str) -> bool {
    hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$")
}
