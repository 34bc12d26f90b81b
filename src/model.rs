// src/model.rs
//! Canonical job record and the caller-facing preference input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::dedup::fingerprint;

/// Location sentinel for remote postings.
pub const REMOTE: &str = "Remote";

/// Canonical job posting. Built only by the normalizer; `fingerprint` is derived
/// from company/title/location and `relevance_score` is assigned by the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
    fingerprint: String,
    relevance_score: u8,
}

/// Field bundle handed to [`JobPosting::new`].
#[derive(Debug, Clone, Default)]
pub struct PostingFields {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    /// Returns `None` when title or company is empty.
    pub fn new(f: PostingFields) -> Option<Self> {
        if f.title.trim().is_empty() || f.company.trim().is_empty() {
            return None;
        }
        let fingerprint = fingerprint(&f.company, &f.title, &f.location);
        Some(Self {
            title: f.title,
            company: f.company,
            location: f.location,
            description: f.description,
            url: f.url,
            salary_min: f.salary_min,
            salary_max: f.salary_max,
            source: f.source,
            posted_at: f.posted_at,
            fingerprint,
            relevance_score: 0,
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn relevance_score(&self) -> u8 {
        self.relevance_score
    }

    pub(crate) fn with_score(mut self, score: u8) -> Self {
        self.relevance_score = score.min(100);
        self
    }

    pub fn is_remote(&self) -> bool {
        self.location == REMOTE
    }

    /// Upper salary bound when known, falling back to the lower one.
    pub fn best_salary(&self) -> Option<u32> {
        self.salary_max.or(self.salary_min)
    }
}

pub const DEFAULT_MAX_RESULTS: usize = 50;

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// What the caller is looking for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Literal queries; when absent or empty, synthesized from `job_titles × locations`.
    #[serde(default)]
    pub queries: Option<Vec<String>>,
    #[serde(default)]
    pub job_titles: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub min_salary: u32,
    #[serde(default)]
    pub remote_only: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            queries: None,
            job_titles: Vec::new(),
            locations: Vec::new(),
            min_salary: 0,
            remote_only: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// One outbound search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: Option<String>,
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>, location: Option<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location,
        }
    }

    /// True when every whitespace-separated query word appears in `title` (case-insensitive).
    pub fn matches_title(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.keywords
            .split_whitespace()
            .all(|w| title.contains(&w.to_lowercase()))
    }
}

impl Preferences {
    /// Build the outbound query list, dropping duplicates while keeping order.
    pub fn search_queries(&self) -> Vec<SearchQuery> {
        let mut out: Vec<SearchQuery> = Vec::new();

        if let Some(queries) = self.queries.as_ref().filter(|q| !q.is_empty()) {
            for q in queries {
                push_unique(&mut out, SearchQuery::new(q.trim(), None));
            }
            return out;
        }

        for title in &self.job_titles {
            let title = title.trim();
            if self.locations.is_empty() {
                push_unique(&mut out, SearchQuery::new(title, None));
                continue;
            }
            for loc in &self.locations {
                let loc = loc.trim();
                let loc = (!loc.is_empty()).then(|| loc.to_string());
                push_unique(&mut out, SearchQuery::new(title, loc));
            }
        }
        out
    }
}

fn push_unique(out: &mut Vec<SearchQuery>, q: SearchQuery) {
    if !q.keywords.is_empty() && !out.contains(&q) {
        out.push(q);
    }
}
