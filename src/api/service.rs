//! The counted API route.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::debug;

use super::request_id::RequestId;
use crate::state::AppState;

pub const API_MESSAGE: &str = "API service working ✅";

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub message: &'static str,
}

/// `GET /api`: counts the call in `api_requests_total` and replies with a
/// fixed JSON message.
pub async fn api(State(state): State<Arc<AppState>>, request_id: RequestId) -> Json<ApiResponse> {
    let total = state.metrics.record_api_request();
    debug!(total, request_id = request_id.as_str(), "api request counted");
    Json(ApiResponse { message: API_MESSAGE })
}
