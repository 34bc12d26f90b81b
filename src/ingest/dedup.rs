// src/ingest/dedup.rs
//! Cross-source deduplication by fingerprint.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::model::JobPosting;

/// Legal-form suffixes ignored when comparing company names.
const COMPANY_SUFFIXES: &[&str] = &[
    "inc", "llc", "ltd", "limited", "corp", "corporation", "co", "gmbh", "plc",
];

/// Lowercase, turn punctuation into spaces, collapse whitespace.
pub fn normalize_key(s: &str) -> String {
    let lowered: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_company(s: &str) -> String {
    let key = normalize_key(s);
    let mut words: Vec<&str> = key.split(' ').collect();
    while words.len() > 1 && words.last().is_some_and(|w| COMPANY_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

/// Stable identity of an opportunity: sha256 over normalized company/title/location.
pub fn fingerprint(company: &str, title: &str, location: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_company(company).as_bytes());
    hasher.update([0x1f]);
    hasher.update(normalize_key(title).as_bytes());
    hasher.update([0x1f]);
    hasher.update(normalize_key(location).as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Seen-set for one aggregation call. Never shared across calls.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a fingerprint is offered.
    pub fn admit(&mut self, posting: &JobPosting) -> bool {
        self.seen.insert(posting.fingerprint().to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Keep the first posting per fingerprint. Returns (kept, dropped_count).
pub fn dedupe<I>(postings: I) -> (Vec<JobPosting>, usize)
where
    I: IntoIterator<Item = JobPosting>,
{
    let mut seen = Deduplicator::new();
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    for p in postings {
        if seen.admit(&p) {
            kept.push(p);
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}
