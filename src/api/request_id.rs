//! Per-request correlation IDs.
//!
//! The middleware stamps every request with a [`RequestId`] and echoes it in
//! the `x-request-id` response header. Handlers take `RequestId` as an
//! extractor to tag their own log lines and error bodies with it.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument as _;
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The caller's `x-request-id` when it is present, non-empty and valid
    /// UTF-8, otherwise a fresh UUID v4.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_owned()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reads the ID stored by [`request_id_middleware`]. Routers mounted without
/// the middleware get a fresh ID instead of a rejection.
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate))
    }
}

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(req.headers());
    let header = HeaderValue::from_str(request_id.as_str()).ok();
    let span = tracing::debug_span!("request", id = %request_id.as_str());

    req.extensions_mut().insert(request_id);
    let mut response = next.run(req).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}
