// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// Canonical job posting as produced by a source adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Posting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub date_posted: Option<String>, // opaque source text, never parsed
    pub source: String,              // e.g. "remotive"
    pub description: Option<String>,
    /// Source-native item, passed through untouched.
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Why a fetch produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl FetchFailure {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Status(_) => "status",
            FetchFailure::Transport(_) => "transport",
            FetchFailure::Malformed(_) => "malformed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(Vec<Posting>),
    Failed(FetchFailure),
}

impl FetchOutcome {
    /// Failures count as "no postings for this term".
    pub fn into_postings(self) -> Vec<Posting> {
        match self {
            FetchOutcome::Fetched(v) => v,
            FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// A listing source that can be queried by search term.
///
/// Implementations must not return errors: every transport or parse problem is
/// reported through [`FetchOutcome::Failed`].
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch(&self, search_term: &str) -> FetchOutcome;
    fn name(&self) -> &'static str;
}
