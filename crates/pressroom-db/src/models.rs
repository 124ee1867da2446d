//! Database models

use crate::utils::{parse_datetime, parse_datetime_or_now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
///
/// Variants are declared from most to least privileged for content mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Author,
    Editor,
    Reader,
}

impl UserRole {
    /// Every role, most privileged first
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::Author,
        UserRole::Editor,
        UserRole::Reader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Author => "AUTHOR",
            UserRole::Editor => "EDITOR",
            UserRole::Reader => "READER",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Author => "Author",
            UserRole::Editor => "Editor",
            UserRole::Reader => "Reader",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UserRole::Admin => "Full access to the system",
            UserRole::Author => "Can create and edit posts",
            UserRole::Editor => "Can edit posts from other authors",
            UserRole::Reader => "Read and comment only",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "AUTHOR" => Ok(UserRole::Author),
            "EDITOR" => Ok(UserRole::Editor),
            "READER" => Ok(UserRole::Reader),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub active: bool,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        let last_login: Option<String> = row.try_get("last_login")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            avatar_url: row.try_get("avatar_url")?,
            // Unknown roles fall back to the least privileged tier
            role: UserRole::from_str(&role_str).unwrap_or(UserRole::Reader),
            active: row.try_get("active")?,
            last_login: last_login.as_deref().and_then(parse_datetime),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in UserRole::ALL {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
        assert_eq!(UserRole::from_str("editor").unwrap(), UserRole::Editor);
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn test_role_ordering_follows_privilege() {
        assert!(UserRole::Admin < UserRole::Author);
        assert!(UserRole::Author < UserRole::Editor);
        assert!(UserRole::Editor < UserRole::Reader);
    }

    #[test]
    fn test_role_display_matches_stored_form() {
        assert_eq!(UserRole::Author.to_string(), "AUTHOR");
        assert_eq!(UserRole::Reader.to_string(), UserRole::Reader.as_str());
    }
}
