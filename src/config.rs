//! Configuration types for api-service.
//!
//! There is no config file: every value comes from [`Config::default`]. The
//! types still group settings by concern so the listener and the metrics
//! registry each receive only the section they need.
//!
//! The listen port is fixed at 3000.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

/// Top-level service configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub metrics: DefaultMetricsConfig,
}

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (default: all IPv4 interfaces).
    pub host: IpAddr,
    /// TCP port (default: 3000).
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

/// Settings for the default process/runtime metrics.
///
/// The request counter is always registered; these settings only govern the
/// metrics collected on the service's behalf.
#[derive(Debug, Clone)]
pub struct DefaultMetricsConfig {
    /// Register the default metrics at all (default: true).
    pub enabled: bool,

    /// Namespace prepended to every default metric name, joined with `_`.
    ///
    /// Never applied to `api_requests_total`.
    pub prefix: Option<String>,

    /// How often the background sampler refreshes runtime gauges (default: 10 s).
    ///
    /// Must be non-zero; the sampler raises anything shorter than 1 ms to 1 ms.
    /// OS process metrics are read on every scrape and ignore this value.
    pub sample_interval: Duration,
}

impl Default for DefaultMetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: None,
            sample_interval: defaults::sample_interval(),
        }
    }
}

mod defaults {
    use super::*;

    pub fn host() -> IpAddr { IpAddr::V4(Ipv4Addr::UNSPECIFIED) }
    pub fn port() -> u16 { 3000 }
    pub fn sample_interval() -> Duration { Duration::from_secs(10) }
}
