//! Health and info endpoints

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    metrics::counter!("pressroom_health_checks_total").increment(1);

    Json(HealthResponse {
        status: "UP",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "pressroom",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/actuator/health", get(health))
        .route("/actuator/info", get(info))
}
