//! Authorization middleware for Axum

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use pressroom_db::UserRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::gate::{Decision, Denial, Requirement, decide, route_requirement};
use crate::jwt::{Claims, TokenCodec, TokenKind};

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Create from session claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.uid,
            email: claims.sub.clone(),
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Authorization middleware
///
/// Resolves the caller from the bearer token, checks the route policy and
/// either rejects the request or adds the [`AuthUser`] to its extensions.
/// On public routes a bad token just leaves the caller anonymous.
pub async fn authorize(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let requirement = route_requirement(request.method(), request.uri().path());

    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let caller = auth_header.map(|header| {
        let token = extract_bearer_token(header)?;
        let claims = codec.parse(token, TokenKind::Session)?;
        Ok::<_, AuthError>(AuthUser::from_claims(&claims))
    });

    let user = match (caller, requirement) {
        (Some(Ok(user)), _) => Some(user),
        (Some(Err(_)), Requirement::Public) | (None, _) => None,
        (Some(Err(e)), _) => return Err(e),
    };

    match decide(user.as_ref().map(|u| u.role), &requirement) {
        Decision::Allow => {}
        Decision::Deny(denial) => {
            let reason = match denial {
                Denial::Unauthenticated => "unauthenticated",
                Denial::Forbidden => "forbidden",
            };
            metrics::counter!("pressroom_authz_denials_total", "reason" => reason).increment(1);
            debug!(
                "Denied {} {}: {}",
                request.method(),
                request.uri().path(),
                reason
            );
            return Err(match denial {
                Denial::Unauthenticated => AuthError::MissingAuthHeader,
                Denial::Forbidden => AuthError::InsufficientPermissions,
            });
        }
    }

    if let Some(user) = user {
        debug!(
            "Authenticated user: {} ({})",
            user.username,
            user.role.as_str()
        );
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}
