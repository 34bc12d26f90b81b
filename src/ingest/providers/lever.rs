// src/ingest/providers/lever.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::config::BoardConfig;
use crate::ingest::providers::{get_text, title_case, PayloadCache};
use crate::ingest::types::{RawDate, RawJob, RawSalary, SalaryPeriod, SourceAdapter, SourceError};
use crate::model::SearchQuery;

pub const DEFAULT_BASE_URL: &str = "https://api.lever.co/v0/postings";

#[derive(Debug, Default, Deserialize)]
struct Categories {
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryRange {
    min: Option<f64>,
    max: Option<f64>,
    interval: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverPosting {
    #[serde(default)]
    text: String,
    #[serde(default)]
    categories: Categories,
    #[serde(default)]
    description_plain: String,
    #[serde(default)]
    hosted_url: String,
    created_at: Option<i64>,
    salary_range: Option<SalaryRange>,
    workplace_type: Option<String>,
}

fn period(interval: Option<&str>) -> SalaryPeriod {
    match interval.map(str::to_ascii_lowercase).as_deref() {
        Some(i) if i.contains("hour") => SalaryPeriod::Hourly,
        Some(i) if i.contains("year") || i.contains("annual") => SalaryPeriod::Yearly,
        _ => SalaryPeriod::Unknown,
    }
}

/// Lever returns a bare JSON array of postings.
pub fn parse_postings(body: &str, company: &str) -> Result<Vec<RawJob>, SourceError> {
    let postings: Vec<LeverPosting> = serde_json::from_str(body)?;
    let company = title_case(company);
    Ok(postings
        .into_iter()
        .map(|p| RawJob {
            source: "lever".into(),
            title: p.text,
            company: company.clone(),
            location: p.categories.location.unwrap_or_default(),
            description: p.description_plain,
            url: p.hosted_url,
            salary: p
                .salary_range
                .map(|s| RawSalary::Range {
                    min: s.min,
                    max: s.max,
                    period: period(s.interval.as_deref()),
                })
                .unwrap_or_default(),
            posted: p.created_at.map(RawDate::EpochMillis).unwrap_or_default(),
            remote: p
                .workplace_type
                .is_some_and(|w| w.eq_ignore_ascii_case("remote")),
        })
        .collect())
}

pub struct LeverAdapter {
    client: reqwest::Client,
    base_url: String,
    companies: Vec<String>,
    delay: Duration,
    cache: PayloadCache,
}

impl LeverAdapter {
    pub fn from_config(cfg: &BoardConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: cfg
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            companies: cfg.boards.clone(),
            delay: Duration::from_millis(cfg.delay_ms),
            cache: PayloadCache::new(Duration::from_secs(cfg.cache_ttl_secs)),
        }
    }
}

#[async_trait]
impl SourceAdapter for LeverAdapter {
    fn name(&self) -> &'static str {
        "lever"
    }

    fn min_interval(&self) -> Duration {
        self.delay
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError> {
        let mut out = Vec::new();
        let mut last_err = None;
        for (i, company) in self.companies.iter().enumerate() {
            let url = format!("{}/{}", self.base_url, company);
            let res = self
                .cache
                .get_or_load(&url, || async {
                    if i > 0 {
                        tokio::time::sleep(self.delay).await;
                    }
                    let body = get_text(&self.client, &url, &[("mode", "json".into())]).await?;
                    parse_postings(&body, company)
                })
                .await;
            match res {
                Ok(jobs) => out.extend(
                    jobs.iter()
                        .filter(|j| query.matches_title(&j.title))
                        .cloned(),
                ),
                Err(e) => {
                    tracing::warn!(target: "ingest", source = "lever", company = %company, error = %e, "board failed");
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
