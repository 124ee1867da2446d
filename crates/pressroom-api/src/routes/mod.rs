//! API routes

mod health;
pub mod management;

use axum::{Router, middleware, routing::get};
use pressroom_auth::authorize;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
///
/// Every route passes the authorization layer.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let codec = state.codec();

    let mut router = Router::new()
        .merge(health::routes())
        .merge(management::routes())
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );
    }

    router.layer(middleware::from_fn_with_state(codec, authorize))
}
