//! JWT token management
//!
//! Session and refresh tokens share one HS256 secret but carry a
//! `token_type` claim, and each is only accepted where its own kind is
//! expected.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pressroom_db::{User, UserRole};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Which flow a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Session,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Session => "session",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,
    /// User ID
    pub uid: i64,
    /// Username
    pub username: String,
    /// User role
    pub role: UserRole,
    /// Session or refresh
    #[serde(rename = "token_type")]
    pub kind: TokenKind,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.exp)
    }
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and parses signed tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec bound to the configured secret and lifetimes
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            session_ttl: clamp_ttl(config.session_ttl_secs),
            refresh_ttl: clamp_ttl(config.refresh_ttl_secs),
        }
    }

    /// Lifetime of tokens of the given kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Session => self.session_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Sign a token of the given kind for a user
    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl(kind))
            .ok_or_else(|| AuthError::InvalidConfig("token lifetime out of range".into()))?;

        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            username: user.username.clone(),
            role: user.role,
            kind,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        debug!("Issuing {} token for user: {}", kind.as_str(), user.username);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Validate a token of the expected kind and return its claims
    ///
    /// Bad signatures, malformed payloads, wrong kinds and expired tokens
    /// all surface as `InvalidToken`; the cause is only logged.
    pub fn parse(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Rejected {} token: {}", expected.as_str(), rejection_cause(e.kind()));
            AuthError::InvalidToken
        })?;
        let claims = token_data.claims;

        if claims.kind != expected {
            debug!(
                "Rejected {} token: presented a {} token",
                expected.as_str(),
                claims.kind.as_str()
            );
            return Err(AuthError::InvalidToken);
        }

        // A token is dead from its expiry second onwards
        if Utc::now().timestamp() >= claims.exp {
            debug!("Rejected {} token: expired", expected.as_str());
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    /// Read the expiry of a token without checking signature or lifetime
    ///
    /// Only meant for response metadata; never authorize on this.
    pub fn expiry_of(&self, token: &str) -> Result<DateTime<Utc>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let token_data = decode::<ExpiryOnly>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(timestamp_to_datetime(token_data.claims.exp))
    }
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

fn rejection_cause(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidSignature => "bad signature",
        ErrorKind::ExpiredSignature => "expired",
        ErrorKind::InvalidAlgorithm => "unexpected algorithm",
        _ => "malformed",
    }
}

/// Out-of-range lifetimes saturate here and are refused at issue time
fn clamp_ttl(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or(if secs < 0 { Duration::MIN } else { Duration::MAX })
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config(session_ttl_secs: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-key-that-is-long-enough".to_string(),
            session_ttl_secs,
            refresh_ttl_secs: 7 * 24 * 3600,
            ..AuthConfig::default()
        }
    }

    pub(crate) fn test_user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: 7,
            username: "testuser".to_string(),
            email: "a@b.com".to_string(),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar_url: None,
            role,
            active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_generation_and_validation() {
        let codec = TokenCodec::new(&test_config(900));
        let issued = codec.issue(&test_user(UserRole::Author), TokenKind::Session).unwrap();

        assert!(!issued.token.is_empty());
        assert!(issued.expires_at > Utc::now());

        let claims = codec.parse(&issued.token, TokenKind::Session).unwrap();
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.role, UserRole::Author);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_invalid_token() {
        let codec = TokenCodec::new(&test_config(900));
        assert!(matches!(
            codec.parse("invalid-token", TokenKind::Session),
            Err(AuthError::InvalidToken)
        ));
        assert!(codec.parse("", TokenKind::Session).is_err());
    }

    #[test]
    fn test_zero_ttl_is_immediately_invalid() {
        let codec = TokenCodec::new(&test_config(0));
        let issued = codec.issue(&test_user(UserRole::Reader), TokenKind::Session).unwrap();
        assert!(matches!(
            codec.parse(&issued.token, TokenKind::Session),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::new(&test_config(-30));
        let issued = codec.issue(&test_user(UserRole::Admin), TokenKind::Session).unwrap();
        assert!(codec.parse(&issued.token, TokenKind::Session).is_err());
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let codec = TokenCodec::new(&test_config(900));
        let user = test_user(UserRole::Reader);
        let session = codec.issue(&user, TokenKind::Session).unwrap();
        let refresh = codec.issue(&user, TokenKind::Refresh).unwrap();

        assert!(codec.parse(&session.token, TokenKind::Refresh).is_err());
        assert!(codec.parse(&refresh.token, TokenKind::Session).is_err());
        assert!(codec.parse(&refresh.token, TokenKind::Refresh).is_ok());
        assert!(refresh.expires_at > session.expires_at);
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let codec = TokenCodec::new(&test_config(900));
        let other = TokenCodec::new(&AuthConfig {
            jwt_secret: "another-secret-entirely-different".to_string(),
            ..test_config(900)
        });
        let issued = other.issue(&test_user(UserRole::Admin), TokenKind::Session).unwrap();
        assert!(codec.parse(&issued.token, TokenKind::Session).is_err());
    }

    #[test]
    fn test_any_single_bit_flip_is_rejected() {
        let codec = TokenCodec::new(&test_config(900));
        let issued = codec.issue(&test_user(UserRole::Admin), TokenKind::Refresh).unwrap();
        let original = issued.token.as_bytes();

        for index in 0..original.len() {
            for bit in 0..7 {
                let mut tampered = original.to_vec();
                tampered[index] ^= 1 << bit;
                let tampered = String::from_utf8(tampered).unwrap();
                assert!(
                    codec.parse(&tampered, TokenKind::Refresh).is_err(),
                    "flip at byte {} bit {} was accepted",
                    index,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_each_issue_is_unique() {
        let codec = TokenCodec::new(&test_config(900));
        let user = test_user(UserRole::Reader);
        let a = codec.issue(&user, TokenKind::Session).unwrap();
        let b = codec.issue(&user, TokenKind::Session).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_unrepresentable_ttl_is_an_error() {
        let codec = TokenCodec::new(&AuthConfig {
            refresh_ttl_secs: 10_000_000_000_000,
            ..test_config(900)
        });
        let user = test_user(UserRole::Reader);

        assert!(codec.issue(&user, TokenKind::Session).is_ok());
        assert!(matches!(
            codec.issue(&user, TokenKind::Refresh),
            Err(AuthError::InvalidConfig(_))
        ));

        let saturated = TokenCodec::new(&AuthConfig {
            session_ttl_secs: i64::MAX,
            ..test_config(900)
        });
        assert!(saturated.issue(&user, TokenKind::Session).is_err());
    }

    #[test]
    fn test_expiry_of_reads_without_validation() {
        let codec = TokenCodec::new(&test_config(0));
        let issued = codec.issue(&test_user(UserRole::Reader), TokenKind::Session).unwrap();

        // Already expired, but the expiry is still readable
        let expiry = codec.expiry_of(&issued.token).unwrap();
        assert_eq!(expiry, issued.expires_at);
        assert!(codec.expiry_of("garbage").is_err());
    }
}
