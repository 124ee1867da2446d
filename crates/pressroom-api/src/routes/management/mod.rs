//! Management API routes
//!
//! Authentication endpoints and user administration.

pub mod auth;
pub mod types;
pub mod users;

use axum::Router;

use crate::state::AppState;

pub use auth::{RequireAdmin, RequireAuth};

/// Create management API routes
pub fn routes() -> Router<AppState> {
    Router::new().merge(auth::routes()).merge(users::routes())
}
