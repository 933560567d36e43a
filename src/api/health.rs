//! Liveness and readiness probes.
//!
//! Neither probe touches shared state, so both answer even while the metrics
//! registry is busy.

/// `GET /healthz`: always `200 OK` with body `ok`.
pub async fn healthz() -> &'static str {
    "ok"
}

/// `GET /ready`: always `200 OK` with body `ready`.
///
/// The service has no dependencies to warm up, so it is ready as soon as the
/// listener accepts connections.
pub async fn ready() -> &'static str {
    "ready"
}
