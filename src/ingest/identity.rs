// src/ingest/identity.rs
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use crate::ingest::types::Posting;

/// Stable dedup key for a posting.
///
/// Hashes the url when it is non-empty, otherwise `title + company` (absent fields
/// read as empty). The all-empty posting still gets an id; such postings collide.
pub fn job_id(posting: &Posting) -> String {
    let key = match posting.url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => format!(
            "{}{}",
            posting.title.as_deref().unwrap_or_default(),
            posting.company.as_deref().unwrap_or_default()
        ),
    };
    sha256_hex(&key)
}

fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
