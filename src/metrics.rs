//! Prometheus registry owned by the service.
//!
//! [`Metrics`] holds its own [`Registry`] instead of the `prometheus` crate's
//! global default one, so every instance (and every test) starts from zero.
//!
//! Metric families:
//! - `api_requests_total`: counter, one increment per `GET /api`
//! - the default process/runtime metrics from [`crate::process_metrics`],
//!   unless disabled in [`DefaultMetricsConfig`]

use std::time::Duration;

use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

use crate::{config::DefaultMetricsConfig, error::MetricsError, process_metrics::DefaultMetrics};

pub const API_REQUESTS_TOTAL: &str = "api_requests_total";
const API_REQUESTS_HELP: &str = "Total number of API requests";

pub struct Metrics {
    registry: Registry,
    api_requests: IntCounter,
    defaults: Option<DefaultMetrics>,
}

impl Metrics {
    /// Build a fresh registry with the request counter and, when enabled, the
    /// default metrics described by `config`.
    pub fn new(config: &DefaultMetricsConfig) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let api_requests = IntCounter::with_opts(Opts::new(API_REQUESTS_TOTAL, API_REQUESTS_HELP))
            .map_err(MetricsError::Register)?;
        registry
            .register(Box::new(api_requests.clone()))
            .map_err(MetricsError::Register)?;

        let defaults = if config.enabled {
            Some(DefaultMetrics::register(&registry, config.prefix.as_deref())?)
        } else {
            None
        };

        Ok(Self {
            registry,
            api_requests,
            defaults,
        })
    }

    /// Count one call to the API route. Returns the counter value after the increment.
    pub fn record_api_request(&self) -> u64 {
        self.api_requests.inc();
        self.api_requests.get()
    }

    pub fn api_requests_total(&self) -> u64 {
        self.api_requests.get()
    }

    /// Whether default metrics are registered (and therefore need sampling).
    pub fn has_defaults(&self) -> bool {
        self.defaults.is_some()
    }

    /// Refresh the sampled default metrics. `lag` is how late the caller's
    /// tick fired relative to its schedule.
    pub fn sample_defaults(&self, lag: Duration) {
        if let Some(defaults) = &self.defaults {
            defaults.sample(lag);
        }
    }

    /// MIME type of [`render`][Self::render]'s output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_owned()
    }

    /// Gather every registered family and encode it in the text exposition format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let families = self.registry.gather();
        let mut buf = Vec::with_capacity(4096);
        TextEncoder::new()
            .encode(&families, &mut buf)
            .map_err(MetricsError::Encode)?;
        Ok(String::from_utf8(buf)?)
    }
}
