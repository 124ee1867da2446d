//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pressroom_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account disabled")]
    AccountDisabled,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("missing authorization header")]
    MissingAuthHeader,

    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    #[error("insufficient permissions")]
    InsufficientPermissions,

    #[error("{0}")]
    Conflict(String),

    #[error("user not found")]
    UserNotFound,

    #[error("Invalid auth configuration: {0}")]
    InvalidConfig(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token encoding error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Credential store error: {0}")]
    Store(#[from] DbError),
}

/// Coarse classification consumed by the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    Authentication,
    Authorization,
    Conflict,
    NotFound,
    Internal,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::AccountDisabled
            | AuthError::InvalidToken
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader => AuthErrorKind::Authentication,
            AuthError::InsufficientPermissions => AuthErrorKind::Authorization,
            AuthError::Conflict(_) => AuthErrorKind::Conflict,
            AuthError::UserNotFound => AuthErrorKind::NotFound,
            AuthError::InvalidConfig(_)
            | AuthError::PasswordHash(_)
            | AuthError::Jwt(_)
            | AuthError::Store(_) => AuthErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            AuthErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            AuthErrorKind::Authorization => StatusCode::FORBIDDEN,
            AuthErrorKind::Conflict => StatusCode::CONFLICT,
            AuthErrorKind::NotFound => StatusCode::NOT_FOUND,
            AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for response bodies
    pub fn code(&self) -> &'static str {
        match self.kind() {
            AuthErrorKind::Authentication => "AUTHENTICATION_ERROR",
            AuthErrorKind::Authorization => "AUTHORIZATION_ERROR",
            AuthErrorKind::Conflict => "CONFLICT",
            AuthErrorKind::NotFound => "NOT_FOUND",
            AuthErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self.kind() {
            AuthErrorKind::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Auth failure: {}", self);
        }

        let body = axum::Json(json!({
            "error": {
                "status": status.as_u16(),
                "code": self.code(),
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_a_message() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(AuthError::AccountDisabled.to_string(), "account disabled");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientPermissions.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::Conflict("email already registered".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Store(DbError::Migration("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = AuthError::Store(DbError::Migration("table users is locked".into()));
        assert_eq!(err.public_message(), "internal server error");
    }
}
