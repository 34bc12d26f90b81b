// src/ingest/providers/ashby.rs
//! Ashby hosted job boards via their public GraphQL endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::ingest::config::BoardConfig;
use crate::ingest::providers::{title_case, PayloadCache};
use crate::ingest::types::{RawJob, RawSalary, SourceAdapter, SourceError};
use crate::model::SearchQuery;

pub const DEFAULT_BASE_URL: &str = "https://jobs.ashbyhq.com/api/non-user-graphql";
const OPERATION: &str = "ApiJobBoardWithTeams";
const QUERY: &str = "query ApiJobBoardWithTeams($organizationHostedJobsPageName: String!) { \
    jobBoard: jobBoardWithTeams(organizationHostedJobsPageName: $organizationHostedJobsPageName) { \
    jobPostings { id title locationName employmentType compensationTierSummary } } }";

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Data {
    job_board: Option<JobBoard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobBoard {
    #[serde(default)]
    job_postings: Vec<AshbyPosting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AshbyPosting {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    location_name: String,
    employment_type: Option<String>,
    compensation_tier_summary: Option<String>,
}

/// Decode a GraphQL response. An unknown board (`jobBoard: null`) is empty, not an error.
pub fn parse_response(body: &str, board: &str) -> Result<Vec<RawJob>, SourceError> {
    let env: Envelope = serde_json::from_str(body)?;
    let data = match env.data {
        Some(d) => d,
        None if !env.errors.is_empty() => {
            return Err(SourceError::Malformed(format!(
                "graphql errors: {}",
                serde_json::Value::Array(env.errors)
            )))
        }
        None => return Err(SourceError::Malformed("missing data".into())),
    };
    let Some(job_board) = data.job_board else {
        return Ok(Vec::new());
    };
    let company = title_case(board);
    Ok(job_board
        .job_postings
        .into_iter()
        .map(|p| RawJob {
            source: "ashby".into(),
            url: format!("https://jobs.ashbyhq.com/{}/{}", board, p.id),
            title: p.title,
            company: company.clone(),
            location: p.location_name,
            description: p.employment_type.unwrap_or_default(),
            salary: p
                .compensation_tier_summary
                .filter(|s| !s.trim().is_empty())
                .map(RawSalary::Text)
                .unwrap_or_default(),
            ..Default::default()
        })
        .collect())
}

pub struct AshbyAdapter {
    client: reqwest::Client,
    base_url: String,
    boards: Vec<String>,
    delay: Duration,
    cache: PayloadCache,
}

impl AshbyAdapter {
    pub fn from_config(cfg: &BoardConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: cfg
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            boards: cfg.boards.clone(),
            delay: Duration::from_millis(cfg.delay_ms),
            cache: PayloadCache::new(Duration::from_secs(cfg.cache_ttl_secs)),
        }
    }

    async fn fetch_board(&self, board: &str) -> Result<Vec<RawJob>, SourceError> {
        let body = json!({
            "operationName": OPERATION,
            "variables": { "organizationHostedJobsPageName": board },
            "query": QUERY,
        });
        let resp = self
            .client
            .post(&self.base_url)
            .query(&[("op", OPERATION)])
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let text = resp.text().await?;
        parse_response(&text, board)
    }
}

#[async_trait]
impl SourceAdapter for AshbyAdapter {
    fn name(&self) -> &'static str {
        "ashby"
    }

    fn min_interval(&self) -> Duration {
        self.delay
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError> {
        let mut out = Vec::new();
        let mut last_err = None;
        for (i, board) in self.boards.iter().enumerate() {
            let res = self
                .cache
                .get_or_load(board, || async {
                    if i > 0 {
                        tokio::time::sleep(self.delay).await;
                    }
                    self.fetch_board(board).await
                })
                .await;
            match res {
                Ok(jobs) => out.extend(
                    jobs.iter()
                        .filter(|j| query.matches_title(&j.title))
                        .cloned(),
                ),
                Err(e) => {
                    tracing::warn!(target: "ingest", source = "ashby", board = %board, error = %e, "board failed");
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
