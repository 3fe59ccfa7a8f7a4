//! jobwatch — Binary Entrypoint
//! Loads config, starts the background ingest loop and serves the read API.

use jobwatch::config::AppConfig;
use jobwatch::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON with JOBWATCH_LOG_JSON=1.
/// `try_init` so a subscriber installed by the hosting runtime takes precedence.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobwatch=info,warn"));

    let json = std::env::var("JOBWATCH_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load_default()?;
    tracing::info!(
        db_path = %cfg.db_path.display(),
        interval_minutes = cfg.interval_minutes,
        terms = ?cfg.search_terms,
        "config loaded"
    );

    let metrics = Metrics::init()?;

    // The scheduler task is detached; it lives as long as the runtime.
    let service = jobwatch::build_service(&cfg).await?;
    let router = service.router.merge(metrics.router());

    Ok(router.into())
}
