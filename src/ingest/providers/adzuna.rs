// src/ingest/providers/adzuna.rs
//! Adzuna search API. Needs `app_id`/`app_key`; without them the adapter is a no-op.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::config::{resolve_secret, AdzunaConfig};
use crate::ingest::providers::get_text;
use crate::ingest::types::{RawDate, RawJob, RawSalary, SalaryPeriod, SourceAdapter, SourceError};
use crate::model::SearchQuery;

/// Largest page the API serves.
const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    redirect_url: String,
    created: Option<String>,
    company: Option<Named>,
    location: Option<Named>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
}

impl From<AdzunaJob> for RawJob {
    fn from(j: AdzunaJob) -> Self {
        let salary = if j.salary_min.is_some() || j.salary_max.is_some() {
            RawSalary::Range {
                min: j.salary_min,
                max: j.salary_max,
                period: SalaryPeriod::Yearly,
            }
        } else {
            RawSalary::None
        };
        RawJob {
            source: "adzuna".into(),
            title: j.title,
            company: j.company.map(|c| c.display_name).unwrap_or_default(),
            location: j.location.map(|l| l.display_name).unwrap_or_default(),
            description: j.description,
            url: j.redirect_url,
            salary,
            posted: j.created.map(RawDate::Text).unwrap_or_default(),
            remote: false,
        }
    }
}

/// Decode one search page.
pub fn parse_page(body: &str) -> Result<Vec<RawJob>, SourceError> {
    let resp: SearchResponse = serde_json::from_str(body)?;
    Ok(resp.results.into_iter().map(RawJob::from).collect())
}

pub struct AdzunaAdapter {
    client: reqwest::Client,
    base_url: String,
    country: String,
    app_id: Option<String>,
    app_key: Option<String>,
    max_days_old: u32,
    delay: Duration,
}

impl AdzunaAdapter {
    pub fn from_config(cfg: &AdzunaConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            country: cfg.country.clone(),
            app_id: resolve_secret(&cfg.app_id, "ADZUNA_APP_ID"),
            app_key: resolve_secret(&cfg.app_key, "ADZUNA_APP_KEY"),
            max_days_old: cfg.max_days_old,
            delay: Duration::from_millis(cfg.delay_ms),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), SourceError> {
        let id = self
            .app_id
            .as_deref()
            .ok_or(SourceError::MissingCredential("ADZUNA_APP_ID"))?;
        let key = self
            .app_key
            .as_deref()
            .ok_or(SourceError::MissingCredential("ADZUNA_APP_KEY"))?;
        Ok((id, key))
    }
}

#[async_trait]
impl SourceAdapter for AdzunaAdapter {
    fn name(&self) -> &'static str {
        "adzuna"
    }

    fn min_interval(&self) -> Duration {
        self.delay
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError> {
        let (app_id, app_key) = self.credentials()?;
        let mut out = Vec::new();
        let mut page = 1usize;

        while out.len() < limit {
            if page > 1 {
                tokio::time::sleep(self.delay).await;
            }
            let want = (limit - out.len()).min(PAGE_SIZE);
            let mut params = vec![
                ("app_id", app_id.to_string()),
                ("app_key", app_key.to_string()),
                ("what", query.keywords.clone()),
                ("results_per_page", want.to_string()),
                ("max_days_old", self.max_days_old.to_string()),
                ("content-type", "application/json".to_string()),
            ];
            if let Some(loc) = query.location.as_deref() {
                params.push(("where", loc.to_string()));
            }
            let url = format!("{}/{}/search/{}", self.base_url, self.country, page);
            let body = get_text(&self.client, &url, &params).await?;
            let batch = parse_page(&body)?;
            let short = batch.len() < want;
            out.extend(batch);
            if short {
                break;
            }
            page += 1;
        }

        out.truncate(limit);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_maps_nested_names_and_salary() {
        let body = r#"{"results":[{"title":"Junior Developer","description":"Build things",
            "redirect_url":"https://adzuna.example/1","created":"2026-10-01T10:00:00Z",
            "company":{"display_name":"Acme"},"location":{"display_name":"London"},
            "salary_min":30000,"salary_max":40000}]}"#;
        let jobs = parse_page(body).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Acme");
        assert_eq!(jobs[0].location, "London");
        assert!(matches!(
            jobs[0].salary,
            RawSalary::Range { min: Some(_), max: Some(_), period: SalaryPeriod::Yearly }
        ));
    }

    #[test]
    fn missing_results_is_empty() {
        assert!(parse_page("{}").unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_short_circuit() {
        let cfg = AdzunaConfig {
            app_id: "".into(),
            app_key: "literal-key".into(),
            ..Default::default()
        };
        let mut a = AdzunaAdapter::from_config(&cfg, reqwest::Client::new());
        a.app_id = None;
        let err = a
            .fetch(&SearchQuery::new("rust", None), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingCredential("ADZUNA_APP_ID")));
        assert!(a.search(&SearchQuery::new("rust", None), 10).await.is_empty());
    }
}
