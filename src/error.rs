//! Error types for api-service.
//!
//! - [`MetricsError`]: typed failures from the Prometheus registry.
//! - [`AppError`]: what a handler returns when it cannot produce a response.
//!   Any `Into<anyhow::Error>` converts with `?`; the response is always a
//!   `500` and nothing is retried or recovered.

use std::string::FromUtf8Error;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::request_id::RequestId;

/// Failures raised while building or reading the metrics registry.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("registering metric: {0}")]
    Register(#[source] prometheus::Error),

    #[error("encoding metrics: {0}")]
    Encode(#[source] prometheus::Error),

    #[error("metrics output is not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
}

/// A failed handler. Always renders as `500` with `{"error": ..}`, plus
/// `"request_id"` when the handler tagged it with [`AppError::for_request`].
#[derive(Debug)]
pub struct AppError {
    source: anyhow::Error,
    request_id: Option<RequestId>,
}

impl AppError {
    /// Tag the error with the request it failed, for the log line and the body.
    pub fn for_request(mut self, request_id: &RequestId) -> Self {
        self.request_id = Some(request_id.clone());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = self.request_id.as_ref().map(RequestId::as_str);
        tracing::warn!(error = %self.source, request_id, "handler error");

        let mut body = json!({ "error": self.source.to_string() });
        if let Some(id) = request_id {
            body["request_id"] = json!(id);
        }
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        Self {
            source: e.into(),
            request_id: None,
        }
    }
}
