//! Assembles the axum app and drives the listener.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

use crate::{api, config::ServerConfig, state::AppState};

/// Bind the listener and announce it. A bind failure is returned to `main`,
/// which exits the process.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    let local = listener.local_addr().context("reading bound address")?;
    info!(addr = %local, "API running on port {}", local.port());
    Ok(listener)
}

/// Routes plus the request-ID and tracing layers.
///
/// Request IDs are assigned inside the trace span so every log line for a
/// request carries both.
pub fn app(state: Arc<AppState>) -> Router {
    api::router(state)
        .layer(axum::middleware::from_fn(api::request_id::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
}

/// Serve until the process exits. There is no shutdown signal handling.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    axum::serve(listener, app(state))
        .await
        .context("HTTP server error")
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        net::{IpAddr, Ipv4Addr, SocketAddr},
        sync::{Arc, Mutex},
    };

    use reqwest::{header, StatusCode};
    use serde_json::json;
    use tokio::{net::TcpListener, task::JoinSet};

    use crate::{api::tests::test_state, config::ServerConfig};

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn loopback(port: u16) -> ServerConfig {
        ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
        }
    }

    #[tokio::test]
    async fn bind_logs_the_port_it_listens_on() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let listener = super::bind(&loopback(0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let output = logs.text();
        assert!(
            output.contains(&format!("API running on port {port}")),
            "log output: {output}"
        );
    }

    #[tokio::test]
    async fn bind_fails_when_the_port_is_taken() {
        let held = super::bind(&loopback(0)).await.unwrap();
        let port = held.local_addr().unwrap().port();

        let err = super::bind(&loopback(port)).await.unwrap_err();
        assert!(err.to_string().starts_with("binding 127.0.0.1:"), "{err:#}");
    }

    /// Bind an ephemeral port, serve in the background, return the base URL.
    async fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(super::serve(listener, test_state()));
        format!("http://{addr}")
    }

    fn counter_value(body: &str) -> u64 {
        body.lines()
            .find_map(|l| l.strip_prefix("api_requests_total "))
            .and_then(|v| v.trim().parse().ok())
            .expect("api_requests_total sample line")
    }

    #[tokio::test]
    async fn health_endpoints_answer_over_a_real_socket() {
        let base = spawn_server().await;

        let healthz = reqwest::get(format!("{base}/healthz")).await.unwrap();
        assert_eq!(healthz.status(), StatusCode::OK);
        assert_eq!(healthz.text().await.unwrap(), "ok");

        let ready = reqwest::get(format!("{base}/ready")).await.unwrap();
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(ready.text().await.unwrap(), "ready");
    }

    #[tokio::test]
    async fn sequential_api_calls_show_up_in_metrics() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        for _ in 0..3 {
            let resp = client.get(format!("{base}/api")).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let body: serde_json::Value = resp.json().await.unwrap();
            assert_eq!(body, json!({ "message": "API service working ✅" }));
        }

        let scrape = client.get(format!("{base}/metrics")).send().await.unwrap();
        assert_eq!(scrape.status(), StatusCode::OK);
        let content_type = scrape.headers()[header::CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("text/plain; version=0.0.4"), "{content_type}");
        assert_eq!(counter_value(&scrape.text().await.unwrap()), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn one_hundred_concurrent_api_calls_count_exactly_one_hundred() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let mut calls = JoinSet::new();
        for _ in 0..100 {
            let client = client.clone();
            let url = format!("{base}/api");
            calls.spawn(async move { client.get(url).send().await.unwrap().status() });
        }
        while let Some(status) = calls.join_next().await {
            assert_eq!(status.unwrap(), StatusCode::OK);
        }

        let body = client
            .get(format!("{base}/metrics"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(counter_value(&body), 100);
    }

    #[tokio::test]
    async fn unknown_route_is_404_over_a_real_socket() {
        let base = spawn_server().await;
        let resp = reqwest::get(format!("{base}/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn servers_do_not_share_counters() {
        let first = spawn_server().await;
        let second = spawn_server().await;

        reqwest::get(format!("{first}/api")).await.unwrap();

        let body = reqwest::get(format!("{second}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(counter_value(&body), 0);
    }
}
