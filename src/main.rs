use std::sync::Arc;

use anyhow::Context;

mod api;
mod config;
mod error;
mod metrics;
mod process_metrics;
mod server;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_service=info,tower_http=warn".into()),
        )
        .init();

    let config = Config::default();

    let state = Arc::new(AppState::new(&config).context("building metrics registry")?);

    if state.metrics.has_defaults() {
        tokio::spawn(process_metrics::run_sampler(
            Arc::clone(&state.metrics),
            config.metrics.sample_interval,
        ));
    }

    let listener = server::bind(&config.server).await?;
    server::serve(listener, state).await
}
