//! Default process and runtime metrics.
//!
//! Registered alongside the request counter unless disabled:
//!
//! - `process_*` from the `prometheus` process collector (CPU seconds, open and
//!   max fds, virtual/resident memory, start time, threads). Linux only; read
//!   fresh on every scrape.
//! - `process_uptime_seconds`, `runtime_scheduler_lag_seconds`,
//!   `runtime_workers`, `runtime_alive_tasks`: refreshed by [`run_sampler`].
//! - `build_info{version}`: constant 1.
//!
//! Every name above gets the configured prefix, if any.

use std::{sync::Arc, time::Duration};

use prometheus::{Gauge, IntGauge, IntGaugeVec, Opts, Registry};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::{error::MetricsError, metrics::Metrics};

/// Shortest period [`run_sampler`] will tick at.
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Gauges the sampler writes to.
pub struct DefaultMetrics {
    started_at: Instant,
    uptime: Gauge,
    scheduler_lag: Gauge,
    workers: IntGauge,
    alive_tasks: IntGauge,
}

impl DefaultMetrics {
    /// Register the default families on `registry` and take a first sample so
    /// the earliest scrape already carries values.
    pub fn register(registry: &Registry, prefix: Option<&str>) -> Result<Self, MetricsError> {
        register_process_collector(registry, prefix)?;

        let build_info = IntGaugeVec::new(
            opts(prefix, "build_info", "Build information; the value is always 1."),
            &["version"],
        )
        .map_err(MetricsError::Register)?;
        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1);
        register(registry, build_info)?;

        let uptime = Gauge::with_opts(opts(
            prefix,
            "process_uptime_seconds",
            "Seconds since the service started.",
        ))
        .map_err(MetricsError::Register)?;
        let scheduler_lag = Gauge::with_opts(opts(
            prefix,
            "runtime_scheduler_lag_seconds",
            "How late the last metrics sampling tick fired, in seconds.",
        ))
        .map_err(MetricsError::Register)?;
        let workers = IntGauge::with_opts(opts(
            prefix,
            "runtime_workers",
            "Number of async runtime worker threads.",
        ))
        .map_err(MetricsError::Register)?;
        let alive_tasks = IntGauge::with_opts(opts(
            prefix,
            "runtime_alive_tasks",
            "Number of live tasks on the async runtime.",
        ))
        .map_err(MetricsError::Register)?;

        register(registry, uptime.clone())?;
        register(registry, scheduler_lag.clone())?;
        register(registry, workers.clone())?;
        register(registry, alive_tasks.clone())?;

        let defaults = Self {
            started_at: Instant::now(),
            uptime,
            scheduler_lag,
            workers,
            alive_tasks,
        };
        defaults.sample(Duration::ZERO);
        Ok(defaults)
    }

    /// Refresh every sampled gauge.
    ///
    /// Runtime gauges are left untouched when called outside a tokio runtime.
    pub fn sample(&self, lag: Duration) {
        self.uptime.set(self.started_at.elapsed().as_secs_f64());
        self.scheduler_lag.set(lag.as_secs_f64());

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let runtime = handle.metrics();
            self.workers.set(runtime.num_workers() as i64);
            self.alive_tasks.set(runtime.num_alive_tasks() as i64);
        }
    }
}

/// Background task: refreshes the default metrics every `period` for the
/// lifetime of the process.
///
/// The lag fed to [`DefaultMetrics::sample`] is the delay between a tick's
/// scheduled instant and when this task actually ran.
pub async fn run_sampler(metrics: Arc<Metrics>, period: Duration) {
    // tokio's interval panics on a zero period
    let period = period.max(MIN_SAMPLE_INTERVAL);
    debug!(period_ms = period.as_millis() as u64, "default metrics sampler started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let scheduled = interval.tick().await;
        metrics.sample_defaults(scheduled.elapsed());
    }
}

fn opts(prefix: Option<&str>, name: &str, help: &str) -> Opts {
    let opts = Opts::new(name, help);
    match prefix {
        Some(ns) => opts.namespace(ns),
        None => opts,
    }
}

fn register<C>(registry: &Registry, collector: C) -> Result<(), MetricsError>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(MetricsError::Register)
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &Registry, prefix: Option<&str>) -> Result<(), MetricsError> {
    use prometheus::process_collector::ProcessCollector;

    let collector = ProcessCollector::new(std::process::id() as _, prefix.unwrap_or_default());
    register(registry, collector)
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &Registry, _prefix: Option<&str>) -> Result<(), MetricsError> {
    debug!("process collector unavailable on this platform");
    Ok(())
}
