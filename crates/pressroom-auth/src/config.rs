//! Authentication configuration
//!
//! Loaded once at startup and shared read-only; nothing in the crate
//! mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::AuthError;

/// Fallback secret; `validate` warns while it is still in use
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Secrets shorter than this are accepted with a warning
const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (ten years)
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

/// Token signing and password hashing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
    #[serde(default)]
    pub password: PasswordConfig,
}

/// Argon2id work factor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Number of passes (time cost)
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            session_ttl_secs: default_session_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
            password: PasswordConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("password", &self.password)
            .finish()
    }
}

impl AuthConfig {
    /// Check the configuration before any component is built from it
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(AuthError::InvalidConfig("jwt_secret must not be empty".into()));
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("Using the default JWT secret; set auth.jwt_secret before deploying");
        } else if self.jwt_secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            warn!(
                "JWT secret is shorter than {} bytes; consider a longer secret",
                MIN_RECOMMENDED_SECRET_LEN
            );
        }

        if self.session_ttl_secs <= 0 {
            return Err(AuthError::InvalidConfig(
                "session_ttl_secs must be positive".into(),
            ));
        }
        if self.refresh_ttl_secs < self.session_ttl_secs {
            return Err(AuthError::InvalidConfig(
                "refresh_ttl_secs must not be shorter than session_ttl_secs".into(),
            ));
        }
        if self.refresh_ttl_secs > MAX_TTL_SECS {
            return Err(AuthError::InvalidConfig(format!(
                "token lifetimes must not exceed {} seconds",
                MAX_TTL_SECS
            )));
        }

        self.password.validate()
    }
}

impl PasswordConfig {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.iterations == 0 {
            return Err(AuthError::InvalidConfig(
                "password.iterations must be at least 1".into(),
            ));
        }
        if self.parallelism == 0 {
            return Err(AuthError::InvalidConfig(
                "password.parallelism must be at least 1".into(),
            ));
        }
        // Argon2 needs at least 8 KiB per lane
        if self.memory_kib < 8 * self.parallelism {
            return Err(AuthError::InvalidConfig(format!(
                "password.memory_kib must be at least {} for parallelism {}",
                8 * self.parallelism,
                self.parallelism
            )));
        }
        Ok(())
    }
}

// Default value functions
fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_session_ttl_secs() -> i64 {
    15 * 60 // 15 minutes
}

fn default_refresh_ttl_secs() -> i64 {
    7 * 24 * 3600 // 7 days
}

fn default_memory_kib() -> u32 {
    19 * 1024 // 19 MiB, OWASP baseline
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}
