// src/ingest/providers/mod.rs
pub mod adzuna;
pub mod ashby;
pub mod greenhouse;
pub mod html_board;
pub mod lever;
pub mod remotive;
pub mod rss_feed;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ingest::config::SourcesConfig;
use crate::ingest::types::{RawJob, SourceAdapter, SourceError};

/// Shared client setup: user agent plus a request timeout matching the orchestrator's.
pub(crate) fn http_client(user_agent: &str, timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(target: "ingest", error = %e, "falling back to default http client");
            reqwest::Client::new()
        })
}

/// GET and return the body, treating any non-2xx status as a failure.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, SourceError> {
    let resp = client.get(url).query(query).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    Ok(resp.text().await?)
}

/// Parsed board/feed payloads keyed by URL. Boards ignore the query, so one
/// download serves every query of a run. Failures are never stored.
pub(crate) struct PayloadCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Arc<Vec<RawJob>>)>>,
}

impl PayloadCache {
    /// A zero `ttl` turns caching off.
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn get_or_load<F, Fut>(
        &self,
        key: &str,
        load: F,
    ) -> Result<Arc<Vec<RawJob>>, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RawJob>, SourceError>>,
    {
        if self.ttl.is_zero() {
            return load().await.map(Arc::new);
        }
        if let Some((at, jobs)) = self.entries.lock().await.get(key) {
            if at.elapsed() < self.ttl {
                tracing::debug!(target: "ingest", %key, "payload served from cache");
                return Ok(jobs.clone());
            }
        }
        let jobs = Arc::new(load().await?);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (Instant::now(), jobs.clone()));
        Ok(jobs)
    }
}

/// `"acme-labs"` → `"Acme Labs"`; used when a board only tells us its slug.
pub(crate) fn title_case(slug: &str) -> String {
    slug.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(first) => first.to_uppercase().chain(cs).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build every enabled adapter, in the fixed order the orchestrator iterates them.
pub fn build_adapters(cfg: &SourcesConfig) -> Vec<Box<dyn SourceAdapter>> {
    let timeout = cfg.timeout();
    let client = http_client(&cfg.user_agent, timeout);
    let mut out: Vec<Box<dyn SourceAdapter>> = Vec::new();

    if cfg.adzuna.enabled {
        out.push(Box::new(adzuna::AdzunaAdapter::from_config(
            &cfg.adzuna,
            client.clone(),
        )));
    }
    if cfg.remotive.enabled {
        out.push(Box::new(remotive::RemotiveAdapter::from_config(
            &cfg.remotive,
            client.clone(),
        )));
    }
    if cfg.rss.enabled && !cfg.rss.feeds.is_empty() {
        out.push(Box::new(rss_feed::RssFeedAdapter::from_config(
            &cfg.rss,
            client.clone(),
        )));
    }
    if cfg.greenhouse.enabled && !cfg.greenhouse.boards.is_empty() {
        out.push(Box::new(greenhouse::GreenhouseAdapter::from_config(
            &cfg.greenhouse,
            client.clone(),
        )));
    }
    if cfg.lever.enabled && !cfg.lever.boards.is_empty() {
        out.push(Box::new(lever::LeverAdapter::from_config(
            &cfg.lever,
            client.clone(),
        )));
    }
    if cfg.ashby.enabled && !cfg.ashby.boards.is_empty() {
        out.push(Box::new(ashby::AshbyAdapter::from_config(
            &cfg.ashby,
            client.clone(),
        )));
    }
    if cfg.html_board.enabled {
        out.push(Box::new(html_board::HtmlBoardAdapter::from_config(
            &cfg.html_board,
            client,
        )));
    }

    tracing::info!(
        target: "ingest",
        adapters = ?out.iter().map(|a| a.name()).collect::<Vec<_>>(),
        "source adapters ready"
    );
    out
}
