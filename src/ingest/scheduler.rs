// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ingest::types::JobSource;
use crate::store::JobStore;

/// Longest period the loop will honour; larger intervals are clamped to it.
pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval: Duration,
    /// Run a cycle right away instead of waiting one interval.
    /// Off when the caller already ran the warm-up pass.
    pub run_immediately: bool,
}

/// Spawn the background ingest loop. It never returns; abort the handle to stop it.
///
/// Cycles are awaited inline, so a slow cycle delays the next tick instead of
/// overlapping with it.
pub fn spawn_scheduler(
    cfg: IngestSchedulerCfg,
    source: Arc<dyn JobSource>,
    store: JobStore,
    terms: Vec<String>,
) -> JoinHandle<()> {
    let interval = cfg.interval.clamp(Duration::from_millis(1), MAX_INTERVAL);
    crate::ingest::ensure_metrics_described();
    tokio::spawn(async move {
        let start = if cfg.run_immediately {
            Instant::now()
        } else {
            Instant::now() + interval
        };
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        gauge!("ingest_interval_secs").set(interval.as_secs_f64());

        tracing::info!(
            target: "ingest",
            interval_secs = interval.as_secs(),
            terms = terms.len(),
            run_immediately = cfg.run_immediately,
            "ingest scheduler started"
        );

        loop {
            ticker.tick().await;
            if let Err(e) = crate::ingest::run_once(source.as_ref(), &store, &terms).await {
                tracing::error!(target: "ingest", error = ?e, "ingest cycle aborted");
            }
        }
    })
}
