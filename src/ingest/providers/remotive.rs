use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;
use std::time::Duration;

use crate::config::app::SourceConfig;
use crate::ingest::types::{FetchFailure, FetchOutcome, JobSource, Posting};

pub const SOURCE_TAG: &str = "remotive";
pub const DEFAULT_ENDPOINT: &str = "https://remotive.com/api/remote-jobs";

pub struct RemotiveProvider {
    mode: Mode,
    max_items: usize,
}

enum Mode {
    // Stored body returned for every term; no network I/O.
    Fixture(String),
    Http {
        endpoint: String,
        client: reqwest::Client,
    },
}

impl RemotiveProvider {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
            max_items: 50,
        }
    }

    /// HTTP provider with timeout and `User-Agent` baked into the client.
    pub fn from_config(cfg: &SourceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self {
            mode: Mode::Http {
                endpoint: cfg.endpoint.clone(),
                client,
            },
            max_items: cfg.max_items,
        })
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Expects `{"jobs": [{..}, ..]}`. A missing `jobs` key is an empty listing; any
    /// other shape, including a non-object among the kept items, rejects the whole body.
    fn parse_body(&self, body: &str) -> FetchOutcome {
        let t0 = std::time::Instant::now();
        let doc: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => return malformed(e.to_string()),
        };
        let Value::Object(mut doc) = doc else {
            return malformed(format!("expected a JSON object, got {}", kind_of(&doc)));
        };
        let jobs = match doc.remove("jobs") {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => return malformed(format!("`jobs` is {}, not a list", kind_of(&other))),
        };

        let mut out = Vec::with_capacity(jobs.len().min(self.max_items));
        for (i, item) in jobs.into_iter().take(self.max_items).enumerate() {
            if !item.is_object() {
                return malformed(format!("job #{i} is {}, not an object", kind_of(&item)));
            }
            out.push(map_item(item));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        FetchOutcome::Fetched(out)
    }

    async fn fetch_http(
        &self,
        endpoint: &str,
        client: &reqwest::Client,
        term: &str,
    ) -> FetchOutcome {
        let mut req = client.get(endpoint);
        if !term.is_empty() {
            req = req.query(&[("search", term)]);
        }

        let t0 = std::time::Instant::now();
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return FetchOutcome::Failed(FetchFailure::Transport(e.to_string())),
        };
        let status = resp.status();
        if !status.is_success() {
            return FetchOutcome::Failed(FetchFailure::Status(status.as_u16()));
        }
        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => return FetchOutcome::Failed(FetchFailure::Transport(e.to_string())),
        };
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        self.parse_body(&body)
    }
}

fn malformed(reason: String) -> FetchOutcome {
    FetchOutcome::Failed(FetchFailure::Malformed(reason))
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Field-by-field rename; nothing is validated. Absent or non-string fields become `None`.
fn map_item(item: Value) -> Posting {
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    Posting {
        title: text("title"),
        company: text("company_name"),
        location: text("candidate_required_location"),
        url: text("url"),
        date_posted: text("publication_date"),
        source: SOURCE_TAG.to_string(),
        description: text("description"),
        raw: item,
    }
}

#[async_trait]
impl JobSource for RemotiveProvider {
    async fn fetch(&self, search_term: &str) -> FetchOutcome {
        let outcome = match &self.mode {
            Mode::Fixture(body) => self.parse_body(body),
            Mode::Http { endpoint, client } => {
                self.fetch_http(endpoint, client, search_term).await
            }
        };

        match &outcome {
            FetchOutcome::Fetched(v) => {
                counter!("ingest_fetched_total").increment(v.len() as u64);
            }
            FetchOutcome::Failed(f) => {
                tracing::warn!(
                    target: "ingest",
                    provider = SOURCE_TAG,
                    term = search_term,
                    error = %f,
                    "source fetch failed"
                );
                counter!("ingest_source_errors_total", "kind" => f.kind()).increment(1);
            }
        }
        outcome
    }

    fn name(&self) -> &'static str {
        SOURCE_TAG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn maps_remotive_fields() {
        let body = json!({
            "job-count": 1,
            "jobs": [{
                "id": 42,
                "url": "https://remotive.com/remote-jobs/software-dev/rust-42",
                "title": "Rust Engineer",
                "company_name": "Acme",
                "candidate_required_location": "Europe",
                "publication_date": "2024-05-01T10:00:00",
                "description": "<p>Build things</p>",
                "salary": "$100k"
            }]
        })
        .to_string();

        let p = RemotiveProvider::from_fixture(&body);
        let out = match p.fetch("rust").await {
            FetchOutcome::Fetched(v) => v,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(out.len(), 1);
        let job = &out[0];
        assert_eq!(job.title.as_deref(), Some("Rust Engineer"));
        assert_eq!(job.company.as_deref(), Some("Acme"));
        assert_eq!(job.location.as_deref(), Some("Europe"));
        assert_eq!(job.date_posted.as_deref(), Some("2024-05-01T10:00:00"));
        assert_eq!(job.source, "remotive");
        assert_eq!(job.raw["salary"], "$100k");
        assert_eq!(job.raw["id"], 42);
    }

    #[tokio::test]
    async fn missing_fields_map_to_none() {
        let body = r#"{"jobs": [{"title": 7}, {}]}"#;
        let out = RemotiveProvider::from_fixture(body).fetch("").await.into_postings();
        assert_eq!(out.len(), 2);
        assert!(out[0].title.is_none());
        assert!(out[1].url.is_none());
        assert_eq!(out[1].raw, json!({}));
    }

    #[tokio::test]
    async fn caps_items() {
        let jobs: Vec<_> = (0..60)
            .map(|i| json!({"url": format!("https://example.test/{i}")}))
            .collect();
        let body = json!({ "jobs": jobs }).to_string();

        let out = RemotiveProvider::from_fixture(&body).fetch("x").await.into_postings();
        assert_eq!(out.len(), 50);
        assert_eq!(out[49].url.as_deref(), Some("https://example.test/49"));

        let out = RemotiveProvider::from_fixture(&body)
            .with_max_items(5)
            .fetch("x")
            .await
            .into_postings();
        assert_eq!(out.len(), 5);
    }

    #[tokio::test]
    async fn missing_jobs_list_is_empty_not_error() {
        let out = RemotiveProvider::from_fixture(r#"{"0-legal-notice": "..."}"#)
            .fetch("x")
            .await;
        assert_eq!(out, FetchOutcome::Fetched(vec![]));
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        for body in [
            "not json",
            "[1, 2]",
            r#"[[{"url": "https://example.test/1", "title": "t"}]]"#,
            r#"{"jobs": "nope"}"#,
            r#"{"jobs": null}"#,
            r#"{"jobs": [1, "x", null]}"#,
            r#"{"jobs": [{"url": "https://example.test/1"}, [2]]}"#,
        ] {
            let out = RemotiveProvider::from_fixture(body).fetch("x").await;
            assert!(
                matches!(out, FetchOutcome::Failed(FetchFailure::Malformed(_))),
                "body {body:?} gave {out:?}"
            );
        }
    }

    #[tokio::test]
    async fn non_object_past_the_cap_is_ignored() {
        let body = r#"{"jobs": [{"url": "https://example.test/1"}, 5]}"#;
        let out = RemotiveProvider::from_fixture(body)
            .with_max_items(1)
            .fetch("x")
            .await
            .into_postings();
        assert_eq!(out.len(), 1);
    }
}
