//! Pressroom REST API
//!
//! This crate provides the Axum-based HTTP API for Pressroom: the
//! authentication endpoints, user administration and the operational
//! endpoints, all behind the route authorization layer.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
