use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::store::{JobStore, JobSummary};

/// Hard cap for `?limit=` so one request cannot dump the whole table.
pub const MAX_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub default_limit: usize,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/jobs", get(list_jobs))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct JobsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// `q` matches title or company, `location` matches location. Both case-insensitive
/// substring matches; blank filters are ignored.
pub fn filter_jobs(jobs: Vec<JobSummary>, q: &str, location: &str) -> Vec<JobSummary> {
    let q = q.trim().to_lowercase();
    let loc = location.trim().to_lowercase();
    let contains = |field: &Option<String>, needle: &str| {
        field
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .contains(needle)
    };
    jobs.into_iter()
        .filter(|j| {
            q.is_empty() || contains(&j.title, q.as_str()) || contains(&j.company, q.as_str())
        })
        .filter(|j| loc.is_empty() || contains(&j.location, loc.as_str()))
        .collect()
}

async fn list_jobs(State(state): State<AppState>, Query(params): Query<JobsQuery>) -> Response {
    let limit = params.limit.unwrap_or(state.default_limit).min(MAX_LIMIT);
    let store = state.store.clone();

    let res = tokio::task::spawn_blocking(move || store.recent(limit)).await;
    let jobs = match res {
        Ok(Ok(jobs)) => jobs,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "reading recent jobs failed");
            return error_response(e.to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "recent jobs worker failed");
            return error_response("internal error".to_string());
        }
    };

    let out = filter_jobs(
        jobs,
        params.q.as_deref().unwrap_or_default(),
        params.location.as_deref().unwrap_or_default(),
    );
    Json(out).into_response()
}

fn error_response(msg: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": msg })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, company: &str, location: &str) -> JobSummary {
        JobSummary {
            title: Some(title.into()),
            company: Some(company.into()),
            location: Some(location.into()),
            url: None,
            date_posted: None,
            source: Some("remotive".into()),
        }
    }

    #[test]
    fn filters_by_title_company_and_location() {
        let jobs = vec![
            job("Senior Rust Engineer", "Acme", "Europe"),
            job("Data Analyst", "RustWorks", "USA"),
            job("Designer", "Globex", "Europe"),
        ];

        let by_q = filter_jobs(jobs.clone(), "rust", "");
        assert_eq!(by_q.len(), 2);

        let by_loc = filter_jobs(jobs.clone(), "", "EUROPE");
        assert_eq!(by_loc.len(), 2);

        let both = filter_jobs(jobs.clone(), "rust", "europe");
        assert_eq!(both, vec![job("Senior Rust Engineer", "Acme", "Europe")]);

        assert_eq!(filter_jobs(jobs, "  ", " ").len(), 3);
    }

    #[test]
    fn missing_fields_never_match_non_empty_filter() {
        let j = JobSummary {
            title: None,
            company: None,
            location: None,
            url: None,
            date_posted: None,
            source: None,
        };
        assert!(filter_jobs(vec![j.clone()], "x", "").is_empty());
        assert_eq!(filter_jobs(vec![j], "", "").len(), 1);
    }
}
