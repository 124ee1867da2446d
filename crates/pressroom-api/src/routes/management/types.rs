//! Request/Response DTOs for the management API

use chrono::{DateTime, Utc};
use pressroom_auth::{AuthError, AuthSession, TokenCodec};
use pressroom_db::{User, UserRole};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Returned by login, register and refresh
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl LoginResponse {
    /// `expiresAt` is read back from the signed session token
    pub fn new(session: AuthSession, codec: &TokenCodec) -> Result<Self, AuthError> {
        let expires_at = codec.expiry_of(&session.access.token)?;
        Ok(Self {
            token: session.access.token,
            refresh_token: session.refresh.token,
            token_type: "Bearer",
            expires_at,
            user: UserResponse::from(session.user),
        })
    }
}

// ==================== User Types ====================

/// Administrative account update; absent fields stay unchanged
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub active: Option<bool>,
}

/// User response (without password)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            avatar_url: user.avatar_url,
            active: user.active,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
