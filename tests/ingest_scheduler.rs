// tests/ingest_scheduler.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobwatch::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg, MAX_INTERVAL};
use jobwatch::ingest::types::{FetchOutcome, JobSource};
use jobwatch::store::JobStore;

/// Counts fetches; optionally takes `work` of (paused) time per fetch.
#[derive(Default)]
struct CountingSource {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    work: Duration,
}

#[async_trait]
impl JobSource for CountingSource {
    async fn fetch(&self, _search_term: &str) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.work.is_zero() {
            tokio::time::sleep(self.work).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        FetchOutcome::Fetched(Vec::new())
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

fn store() -> (tempfile::TempDir, JobStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path().join("jobs.db"));
    (dir, store)
}

#[tokio::test(start_paused = true)]
async fn runs_immediately_then_every_interval() {
    let (_dir, store) = store();
    let src = Arc::new(CountingSource::default());
    let handle = spawn_scheduler(
        IngestSchedulerCfg {
            interval: Duration::from_secs(60),
            run_immediately: true,
        },
        src.clone(),
        store,
        vec!["python".into()],
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(src.calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(src.calls.load(Ordering::SeqCst), 3);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn warm_start_waits_one_interval() {
    let (_dir, store) = store();
    let src = Arc::new(CountingSource::default());
    let handle = spawn_scheduler(
        IngestSchedulerCfg {
            interval: Duration::from_secs(60),
            run_immediately: false,
        },
        src.clone(),
        store,
        vec!["python".into()],
    );

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(src.calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(src.calls.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn overrunning_cycles_never_overlap() {
    let (_dir, store) = store();
    let src = Arc::new(CountingSource {
        work: Duration::from_secs(90),
        ..CountingSource::default()
    });
    let handle = spawn_scheduler(
        IngestSchedulerCfg {
            interval: Duration::from_secs(60),
            run_immediately: true,
        },
        src.clone(),
        store,
        vec!["python".into()],
    );

    tokio::time::sleep(Duration::from_secs(400)).await;
    assert!(src.calls.load(Ordering::SeqCst) >= 3);
    assert_eq!(src.max_in_flight.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn huge_interval_is_clamped_not_a_panic() {
    let (_dir, store) = store();
    let src = Arc::new(CountingSource::default());
    let handle = spawn_scheduler(
        IngestSchedulerCfg {
            interval: Duration::MAX,
            run_immediately: false,
        },
        src.clone(),
        store,
        vec!["python".into()],
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(src.calls.load(Ordering::SeqCst), 0);
    assert!(!handle.is_finished());

    tokio::time::sleep(MAX_INTERVAL).await;
    assert_eq!(src.calls.load(Ordering::SeqCst), 1);

    handle.abort();
}
