// src/config/app.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::ingest::providers::remotive::DEFAULT_ENDPOINT;
use crate::ingest::scheduler::MAX_INTERVAL;

pub const ENV_CONFIG_PATH: &str = "JOBWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/jobwatch.toml";

const ENV_INTERVAL: &str = "JOBWATCH_INTERVAL_MINUTES";
const ENV_DB_PATH: &str = "JOBWATCH_DB_PATH";
const ENV_SEARCH_TERMS: &str = "JOBWATCH_SEARCH_TERMS";
const ENV_RUN_INITIAL: &str = "JOBWATCH_RUN_INITIAL";

fn default_interval_minutes() -> u64 {
    30
}
fn default_db_path() -> PathBuf {
    PathBuf::from("jobs.db")
}
fn default_search_terms() -> Vec<String> {
    vec!["python".into(), "backend".into(), "data".into()]
}
fn default_true() -> bool {
    true
}
fn default_recent_limit() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_search_terms")]
    pub search_terms: Vec<String>,
    /// Run one ingest cycle before the router starts serving.
    #[serde(default = "default_true")]
    pub run_initial_ingest: bool,
    /// Default page size for `GET /jobs`.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_max_items() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_items: default_max_items(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            db_path: default_db_path(),
            search_terms: default_search_terms(),
            run_initial_ingest: true,
            recent_limit: default_recent_limit(),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit TOML file. Env overrides are not applied.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        cfg.search_terms = clean_terms(cfg.search_terms);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve config using env var + fallbacks, then apply env overrides:
    /// 1) $JOBWATCH_CONFIG
    /// 2) config/jobwatch.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = env::var(ENV_INTERVAL) {
            self.interval_minutes = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_INTERVAL} must be a whole number of minutes"))?;
        }
        if let Ok(v) = env::var(ENV_DB_PATH) {
            self.db_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_SEARCH_TERMS) {
            self.search_terms = clean_terms(v.split(',').map(str::to_string).collect());
        }
        if let Ok(v) = env::var(ENV_RUN_INITIAL) {
            self.run_initial_ingest = parse_flag(&v)
                .ok_or_else(|| anyhow!("{ENV_RUN_INITIAL} must be true/false, got {v:?}"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            bail!("interval_minutes must be greater than zero");
        }
        let max_minutes = MAX_INTERVAL.as_secs() / 60;
        if self.interval_minutes > max_minutes {
            bail!(
                "interval_minutes must be at most {max_minutes}, got {}",
                self.interval_minutes
            );
        }
        if self.source.timeout_secs == 0 {
            bail!("source.timeout_secs must be greater than zero");
        }
        if self.source.max_items == 0 {
            bail!("source.max_items must be greater than zero");
        }
        Ok(())
    }

    /// Saturates instead of overflowing; `validate` keeps loaded configs in range.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Trim, drop blanks and repeats. First occurrence keeps its position.
fn clean_terms(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
