// src/lib.rs
// Public library surface for integration tests and the Shuttle entrypoint.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::AppConfig;
use crate::ingest::providers::remotive::RemotiveProvider;
use crate::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg};
use crate::ingest::types::JobSource;
use crate::store::JobStore;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router as router;
pub use crate::ingest::types::{FetchOutcome, Posting};

/// Everything the process needs to keep alive: the read router and the ingest loop.
pub struct Service {
    pub router: Router,
    pub scheduler: JoinHandle<()>,
}

/// Composition root using the configured Remotive source.
pub async fn build_service(cfg: &AppConfig) -> anyhow::Result<Service> {
    let source = RemotiveProvider::from_config(&cfg.source).context("building source client")?;
    build_service_with_source(cfg, Arc::new(source)).await
}

/// Initialise the store, optionally warm it with one cycle, then start the scheduler.
pub async fn build_service_with_source(
    cfg: &AppConfig,
    source: Arc<dyn JobSource>,
) -> anyhow::Result<Service> {
    let store = JobStore::new(&cfg.db_path);
    let init_store = store.clone();
    tokio::task::spawn_blocking(move || init_store.initialize())
        .await
        .context("store init worker panicked")?
        .with_context(|| format!("initializing job store at {}", cfg.db_path.display()))?;

    if cfg.run_initial_ingest {
        let report = ingest::run_once(source.as_ref(), &store, &cfg.search_terms)
            .await
            .context("initial ingest cycle")?;
        info!(new = report.new, "store warmed before serving");
    }

    let scheduler = spawn_scheduler(
        IngestSchedulerCfg {
            interval: cfg.interval(),
            run_immediately: !cfg.run_initial_ingest,
        },
        source,
        store.clone(),
        cfg.search_terms.clone(),
    );

    let router = api::create_router(api::AppState {
        store,
        default_limit: cfg.recent_limit,
    });

    Ok(Service { router, scheduler })
}
