//! HTTP surface: the four routes and the middleware wrapped around them.
//!
//! Handlers stay thin. The only shared state they touch is the metrics
//! registry in [`AppState`].

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::state::AppState;

pub mod health;
pub mod metrics;
pub mod request_id;
pub mod service;

/// Build the route table. Unmatched paths fall through to axum's default 404.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/api", get(service::api))
        .route("/metrics", get(metrics::metrics))
        .with_state(state)
}
