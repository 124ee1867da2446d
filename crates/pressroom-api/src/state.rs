//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use pressroom_auth::{AuthService, TokenCodec};
use std::sync::Arc;

/// Prometheus metrics handle
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }

    /// Codec consulted by the authorization layer
    pub fn codec(&self) -> Arc<TokenCodec> {
        self.auth.codec().clone()
    }
}
