//! Pressroom Authentication and Authorization
//!
//! This crate provides password hashing, signed session/refresh tokens,
//! the login/registration/refresh flows and the role-based access gate
//! consulted before every mutation.

pub mod capability;
pub mod config;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod store;

pub use capability::{Capabilities, Capability};
pub use config::{AuthConfig, PasswordConfig};
pub use error::{AuthError, AuthErrorKind};
pub use gate::{Decision, Denial, Requirement, decide, route_requirement};
pub use jwt::{Claims, IssuedToken, TokenCodec, TokenKind};
pub use middleware::{AuthUser, authorize, extract_bearer_token};
pub use password::PasswordHasher;
pub use service::{AuthService, AuthSession, Registration};
pub use store::CredentialStore;
