//! Prometheus-compatible `/metrics` endpoint.
//!
//! The body is whatever the registry gathers at scrape time: the lifetime
//! `api_requests_total` counter plus the default process/runtime metrics.

use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};

use super::request_id::RequestId;
use crate::{error::AppError, state::AppState};

/// `GET /metrics`: renders the text exposition format.
///
/// A gather or encode failure becomes a `500` tagged with the request ID.
pub async fn metrics(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::from(e).for_request(&request_id))?;
    Ok(([(header::CONTENT_TYPE, state.metrics.content_type())], body))
}
