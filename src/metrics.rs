//! Prometheus exposition for the ingest counters. Series are described in
//! `ingest::run_once`; this module only owns the recorder and the scrape route.

use axum::{extract::State, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide recorder. Fails if one is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("installing prometheus recorder: {e}"))?;
        Ok(Self { handle })
    }

    /// Current snapshot in text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `GET /metrics`, to be merged into the service router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(scrape))
            .with_state(self.handle.clone())
    }
}

async fn scrape(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
