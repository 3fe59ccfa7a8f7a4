// src/ingest/mod.rs
pub mod identity;
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::ingest::types::{FetchOutcome, JobSource, Posting};
use crate::store::{JobStore, StoreError};
use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_cycles_total", "Completed ingest cycles.");
        describe_counter!(
            "ingest_fetched_total",
            "Postings returned by sources before dedup."
        );
        describe_counter!("ingest_new_total", "Postings stored for the first time.");
        describe_counter!(
            "ingest_duplicate_total",
            "Postings skipped because their id was already stored."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch failures by kind (status/transport/malformed)."
        );
        describe_histogram!("ingest_fetch_ms", "Source HTTP round trip in milliseconds.");
        describe_histogram!("ingest_parse_ms", "Source payload parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the last ingest cycle finished.");
        describe_gauge!("ingest_interval_secs", "Configured period between scheduled cycles.");
    });
}

/// Tally of one ingest pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CycleReport {
    pub terms: usize,
    pub fetched: usize,
    pub new: usize,
    pub duplicates: usize,
    pub failed_terms: Vec<String>,
}

/// Insert a batch, returning (new, duplicates). Blocking; run off the async workers.
fn insert_batch(store: &JobStore, postings: &[Posting]) -> Result<(usize, usize), StoreError> {
    let mut new = 0usize;
    let mut dup = 0usize;
    for p in postings {
        if store.insert(p)? {
            new += 1;
        } else {
            dup += 1;
        }
    }
    Ok((new, dup))
}

/// Run one ingest pass over `terms`, sequentially.
///
/// A failed fetch only marks its term as failed. A store failure aborts the pass
/// and is returned to the caller.
pub async fn run_once(
    source: &dyn JobSource,
    store: &JobStore,
    terms: &[String],
) -> anyhow::Result<CycleReport> {
    ensure_metrics_described();

    let mut report = CycleReport {
        terms: terms.len(),
        ..CycleReport::default()
    };

    for term in terms {
        let postings = match source.fetch(term).await {
            FetchOutcome::Fetched(v) => v,
            FetchOutcome::Failed(_) => {
                // already logged + counted by the source
                report.failed_terms.push(term.clone());
                continue;
            }
        };
        report.fetched += postings.len();
        if postings.is_empty() {
            continue;
        }

        let store_c = store.clone();
        let (new, dup) = tokio::task::spawn_blocking(move || insert_batch(&store_c, &postings))
            .await
            .context("insert worker panicked")?
            .with_context(|| format!("storing postings for term {term:?}"))?;

        tracing::debug!(target: "ingest", term = %term, new, duplicates = dup, "term ingested");
        report.new += new;
        report.duplicates += dup;
    }

    counter!("ingest_cycles_total").increment(1);
    counter!("ingest_new_total").increment(report.new as u64);
    counter!("ingest_duplicate_total").increment(report.duplicates as u64);
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    tracing::info!(
        target: "ingest",
        provider = source.name(),
        terms = report.terms,
        fetched = report.fetched,
        new = report.new,
        duplicates = report.duplicates,
        failed_terms = report.failed_terms.len(),
        "ingest cycle finished"
    );

    Ok(report)
}
