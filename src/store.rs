//! SQLite-backed job store.
//!
//! Every operation opens its own connection and drops it before returning, so the
//! scheduler and request handlers never share a handle. Atomicity of each insert and
//! uniqueness of `id` are left to SQLite.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ingest::identity::job_id;
use crate::ingest::types::Posting;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    title TEXT,
    company TEXT,
    location TEXT,
    url TEXT,
    date_posted TEXT,
    date_scraped TEXT NOT NULL,
    source TEXT,
    description TEXT,
    raw_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_jobs_date_scraped ON jobs(date_scraped);
";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("raw payload (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Display fields returned by the read path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSummary {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub date_posted: Option<String>,
    pub source: Option<String>,
}

/// Full stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredJob {
    pub id: String,
    pub date_scraped: String,
    pub posting: Posting,
}

#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    /// Handle for the database at `path`. Does no I/O; call [`JobStore::initialize`].
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `new` + `initialize`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self::new(path);
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Create the schema if missing. Safe to call repeatedly and from several processes.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        // WAL lets readers proceed while the scheduler writes.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %self.path.display(), "job store initialized");
        Ok(())
    }

    /// Insert unless a record with the same id exists.
    /// Returns `true` when a new record was created, `false` for a duplicate.
    pub fn insert(&self, posting: &Posting) -> Result<bool, StoreError> {
        let id = job_id(posting);
        let raw_json = serde_json::to_string(&posting.raw)?;
        let conn = self.connect()?;
        let changes = conn.execute(
            "INSERT INTO jobs
             (id, title, company, location, url, date_posted, date_scraped, source, description, raw_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO NOTHING",
            params![
                id,
                posting.title,
                posting.company,
                posting.location,
                posting.url,
                posting.date_posted,
                now_scraped(),
                posting.source,
                posting.description,
                raw_json,
            ],
        )?;
        if changes == 0 {
            debug!(id = %id, "duplicate posting ignored");
        }
        Ok(changes > 0)
    }

    /// Up to `limit` records, most recently ingested first.
    pub fn recent(&self, limit: usize) -> Result<Vec<JobSummary>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT title, company, location, url, date_posted, source
             FROM jobs ORDER BY date_scraped DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(JobSummary {
                title: row.get(0)?,
                company: row.get(1)?,
                location: row.get(2)?,
                url: row.get(3)?,
                date_posted: row.get(4)?,
                source: row.get(5)?,
            })
        })?;
        let jobs = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    pub fn find(&self, id: &str) -> Result<Option<StoredJob>, StoreError> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT id, title, company, location, url, date_posted, date_scraped,
                        source, description, raw_json
                 FROM jobs WHERE id = ?1",
                params![id],
                |row| {
                    let source: Option<String> = row.get(7)?;
                    let raw_json: Option<String> = row.get(9)?;
                    Ok((
                        StoredJob {
                            id: row.get(0)?,
                            date_scraped: row.get(6)?,
                            posting: Posting {
                                title: row.get(1)?,
                                company: row.get(2)?,
                                location: row.get(3)?,
                                url: row.get(4)?,
                                date_posted: row.get(5)?,
                                source: source.unwrap_or_default(),
                                description: row.get(8)?,
                                raw: serde_json::Value::Null,
                            },
                        },
                        raw_json,
                    ))
                },
            )
            .optional()?;

        let Some((mut job, raw_json)) = row else {
            return Ok(None);
        };
        if let Some(raw) = raw_json {
            job.posting.raw = serde_json::from_str(&raw)?;
        }
        Ok(Some(job))
    }
}

/// Fixed-width UTC timestamp; lexical order matches chronological order.
fn now_scraped() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}
