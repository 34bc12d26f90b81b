// src/ingest/providers/remotive.rs
//! Remotive public API. Every listing is remote.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::config::RemotiveConfig;
use crate::ingest::providers::get_text;
use crate::ingest::types::{RawDate, RawJob, RawSalary, SourceAdapter, SourceError};
use crate::model::SearchQuery;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    jobs: Vec<RemotiveJob>,
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    candidate_required_location: String,
    #[serde(default)]
    salary: String,
    publication_date: Option<String>,
    #[serde(default)]
    description: String,
}

pub fn parse_listing(body: &str) -> Result<Vec<RawJob>, SourceError> {
    let listing: Listing = serde_json::from_str(body)?;
    Ok(listing
        .jobs
        .into_iter()
        .map(|j| RawJob {
            source: "remotive".into(),
            title: j.title,
            company: j.company_name,
            location: j.candidate_required_location,
            description: j.description,
            url: j.url,
            salary: if j.salary.trim().is_empty() {
                RawSalary::None
            } else {
                RawSalary::Text(j.salary)
            },
            posted: j.publication_date.map(RawDate::Text).unwrap_or_default(),
            remote: true,
        })
        .collect())
}

pub struct RemotiveAdapter {
    client: reqwest::Client,
    base_url: String,
    delay: Duration,
}

impl RemotiveAdapter {
    pub fn from_config(cfg: &RemotiveConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: cfg.base_url.clone(),
            delay: Duration::from_millis(cfg.delay_ms),
        }
    }
}

#[async_trait]
impl SourceAdapter for RemotiveAdapter {
    fn name(&self) -> &'static str {
        "remotive"
    }

    fn min_interval(&self) -> Duration {
        self.delay
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError> {
        let params = [
            ("search", query.keywords.clone()),
            ("limit", limit.to_string()),
        ];
        let body = get_text(&self.client, &self.base_url, &params).await?;
        let mut jobs = parse_listing(&body)?;
        jobs.truncate(limit);
        Ok(jobs)
    }
}
