// src/ingest/providers/greenhouse.rs
//! Greenhouse job boards, one public board per company.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::config::BoardConfig;
use crate::ingest::providers::{get_text, title_case, PayloadCache};
use crate::ingest::types::{RawDate, RawJob, SourceAdapter, SourceError};
use crate::model::SearchQuery;

pub const DEFAULT_BASE_URL: &str = "https://boards-api.greenhouse.io/v1/boards";

#[derive(Debug, Deserialize)]
struct Board {
    #[serde(default)]
    jobs: Vec<GhJob>,
}

#[derive(Debug, Deserialize)]
struct GhLocation {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GhJob {
    #[serde(default)]
    title: String,
    location: Option<GhLocation>,
    #[serde(default)]
    absolute_url: String,
    updated_at: Option<String>,
    /// Entity-escaped HTML; the normalizer decodes and strips it.
    #[serde(default)]
    content: String,
    company_name: Option<String>,
}

/// Decode a board listing. `board` names the company when the payload doesn't.
pub fn parse_board(body: &str, board: &str) -> Result<Vec<RawJob>, SourceError> {
    let parsed: Board = serde_json::from_str(body)?;
    Ok(parsed
        .jobs
        .into_iter()
        .map(|j| RawJob {
            source: "greenhouse".into(),
            title: j.title,
            company: j
                .company_name
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| title_case(board)),
            location: j.location.map(|l| l.name).unwrap_or_default(),
            description: j.content,
            url: j.absolute_url,
            posted: j.updated_at.map(RawDate::Text).unwrap_or_default(),
            ..Default::default()
        })
        .collect())
}

pub struct GreenhouseAdapter {
    client: reqwest::Client,
    base_url: String,
    boards: Vec<String>,
    delay: Duration,
    cache: PayloadCache,
}

impl GreenhouseAdapter {
    pub fn from_config(cfg: &BoardConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: cfg
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            boards: cfg.boards.clone(),
            delay: Duration::from_millis(cfg.delay_ms),
            cache: PayloadCache::new(Duration::from_secs(cfg.cache_ttl_secs)),
        }
    }
}

#[async_trait]
impl SourceAdapter for GreenhouseAdapter {
    fn name(&self) -> &'static str {
        "greenhouse"
    }

    fn min_interval(&self) -> Duration {
        self.delay
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError> {
        let mut out = Vec::new();
        let mut last_err = None;
        for (i, board) in self.boards.iter().enumerate() {
            let url = format!("{}/{}/jobs", self.base_url, board);
            let res = self
                .cache
                .get_or_load(&url, || async {
                    if i > 0 {
                        tokio::time::sleep(self.delay).await;
                    }
                    let body = get_text(&self.client, &url, &[("content", "true".into())]).await?;
                    parse_board(&body, board)
                })
                .await;
            match res {
                Ok(jobs) => out.extend(
                    jobs.iter()
                        .filter(|j| query.matches_title(&j.title))
                        .cloned(),
                ),
                Err(e) => {
                    tracing::warn!(target: "ingest", source = "greenhouse", board = %board, error = %e, "board failed");
                    last_err = Some(e);
                }
            }
            if out.len() >= limit {
                break;
            }
        }
        match last_err {
            Some(e) if out.is_empty() => Err(e),
            _ => {
                out.truncate(limit);
                Ok(out)
            }
        }
    }
}
