//! Route-level access policy
//!
//! `route_requirement` maps a request to what the caller must satisfy and
//! `decide` checks a caller's role against it. Both are pure.

use axum::http::Method;
use pressroom_db::UserRole;

use crate::capability::{Capabilities, Capability};

/// Roles allowed to write posts
pub const CONTENT_WRITERS: &[UserRole] = &[UserRole::Admin, UserRole::Author, UserRole::Editor];

pub const ADMINS_ONLY: &[UserRole] = &[UserRole::Admin];

/// What a caller must satisfy to reach a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    AnyRole(&'static [UserRole]),
    Capability(Capability),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No valid identity was presented
    Unauthenticated,
    /// Identity known but not permitted
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Check a caller against a requirement
pub fn decide(caller: Option<UserRole>, requirement: &Requirement) -> Decision {
    match (requirement, caller) {
        (Requirement::Public, _) => Decision::Allow,
        (_, None) => Decision::Deny(Denial::Unauthenticated),
        (Requirement::Authenticated, Some(_)) => Decision::Allow,
        (Requirement::AnyRole(roles), Some(role)) => {
            if roles.contains(&role) {
                Decision::Allow
            } else {
                Decision::Deny(Denial::Forbidden)
            }
        }
        (Requirement::Capability(capability), Some(role)) => {
            if role.has(*capability) {
                Decision::Allow
            } else {
                Decision::Deny(Denial::Forbidden)
            }
        }
    }
}

const PUBLIC_PATHS: &[&str] = &[
    "/api/v1/auth",
    "/health",
    "/healthz",
    "/metrics",
    "/actuator/health",
    "/actuator/info",
    "/uploads",
    "/images",
    "/static",
    "/api/v1/swagger-ui",
    "/api/v1/swagger-ui.html",
    "/api/v1/api-docs",
    "/swagger-resources",
    "/v3/api-docs",
];

const PUBLIC_READS: &[&str] = &[
    "/api/v1/posts",
    "/api/v1/categories",
    "/api/v1/tags",
    "/api/v1/comments",
];

/// Requirement for a request, first matching rule wins
pub fn route_requirement(method: &Method, path: &str) -> Requirement {
    if method == Method::OPTIONS {
        return Requirement::Public;
    }
    if PUBLIC_PATHS.iter().any(|prefix| under(path, prefix)) {
        return Requirement::Public;
    }
    if method == Method::GET && PUBLIC_READS.iter().any(|prefix| under(path, prefix)) {
        return Requirement::Public;
    }

    if under(path, "/api/v1/comments")
        && (method == Method::POST || method == Method::PUT || method == Method::DELETE)
    {
        return Requirement::Authenticated;
    }
    if under(path, "/api/v1/posts") {
        if method == Method::POST || method == Method::PUT {
            return Requirement::AnyRole(CONTENT_WRITERS);
        }
        if method == Method::DELETE {
            return Requirement::AnyRole(ADMINS_ONLY);
        }
    }
    if under(path, "/api/v1/admin") {
        return Requirement::AnyRole(ADMINS_ONLY);
    }

    Requirement::Authenticated
}

/// `path` is `prefix` itself or something below it
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
