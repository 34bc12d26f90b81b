// src/ingest/types.rs
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::SearchQuery;

/// Pay period as reported by a provider, when it says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalaryPeriod {
    #[default]
    Unknown,
    Hourly,
    Yearly,
}

/// Salary exactly as the provider delivered it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawSalary {
    #[default]
    None,
    Range {
        min: Option<f64>,
        max: Option<f64>,
        period: SalaryPeriod,
    },
    /// Free text such as `"$80k - $100k"` or `"$45/hr"`.
    Text(String),
}

/// Publish date exactly as the provider delivered it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawDate {
    #[default]
    None,
    /// ISO-8601, RFC-822 or relative text ("3 days ago").
    Text(String),
    EpochMillis(i64),
    EpochSeconds(i64),
}

/// Provider record after field mapping, before any cleaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawJob {
    pub source: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub salary: RawSalary,
    pub posted: RawDate,
    /// Provider marks every posting as remote (e.g. remote-only boards).
    pub remote: bool,
}

/// Why a single adapter call produced nothing.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Credential gaps are configuration, not outages.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, SourceError::MissingCredential(_))
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Malformed(e.to_string())
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(e: quick_xml::DeError) -> Self {
        SourceError::Malformed(e.to_string())
    }
}

/// One external job source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable source name; also the rate-limit key.
    fn name(&self) -> &'static str;

    /// Scraped sources may break without notice.
    fn best_effort(&self) -> bool {
        false
    }

    /// Minimum gap between two calls to this source.
    fn min_interval(&self) -> Duration {
        Duration::ZERO
    }

    /// One outbound call. Credentialed adapters must return
    /// `SourceError::MissingCredential` before touching the network.
    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError>;

    /// Never fails: errors degrade to an empty list and are logged.
    async fn search(&self, query: &SearchQuery, limit: usize) -> Vec<RawJob> {
        match self.fetch(query, limit).await {
            Ok(mut v) => {
                v.truncate(limit);
                v
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    source = self.name(),
                    error = %e,
                    "source returned no results"
                );
                Vec::new()
            }
        }
    }
}
