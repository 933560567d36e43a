//! Shared application state injected into every handler via [`axum::extract::State`].

use std::sync::Arc;

use crate::{config::Config, error::MetricsError, metrics::Metrics};

/// Everything the handlers share, built once in `main` and handed to the
/// router as `Arc<AppState>`.
pub struct AppState {
    /// Registry holding the request counter and default metrics.
    ///
    /// Behind its own `Arc` so the background sampler can hold it without
    /// holding the whole state.
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, MetricsError> {
        Ok(Self {
            metrics: Arc::new(Metrics::new(&config.metrics)?),
        })
    }
}
