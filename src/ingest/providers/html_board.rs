// src/ingest/providers/html_board.rs
//! Best-effort scraper for a server-rendered search page.
//!
//! Markup changes silently break this adapter; when the card selector stops
//! matching it simply returns nothing.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::ingest::config::{HtmlBoardConfig, ScrapeSelectors};
use crate::ingest::providers::get_text;
use crate::ingest::types::{RawDate, RawJob, RawSalary, SourceAdapter, SourceError};
use crate::model::SearchQuery;

fn encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Fill `{query}` and `{location}` in the configured template.
pub fn search_url(template: &str, query: &SearchQuery) -> String {
    template
        .replace("{query}", &encode(&query.keywords))
        .replace("{location}", &encode(query.location.as_deref().unwrap_or("")))
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Malformed(format!("selector {css:?}: {e}")))
}

fn text_of(card: &ElementRef<'_>, sel: &Selector) -> String {
    card.select(sel)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .unwrap_or_default()
}

fn absolutize(href: &str, link_base: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") || href.is_empty() {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            link_base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

/// Pull job cards out of a page. Synchronous: `Html` must not live across an await.
pub fn parse_page(
    html: &str,
    selectors: &ScrapeSelectors,
    link_base: &str,
) -> Result<Vec<RawJob>, SourceError> {
    let card = selector(&selectors.card)?;
    let title = selector(&selectors.title)?;
    let company = selector(&selectors.company)?;
    let location = selector(&selectors.location)?;
    let link = selector(&selectors.link)?;
    let posted = selector(&selectors.posted)?;
    let salary = selector(&selectors.salary)?;

    let doc = Html::parse_document(html);
    let jobs = doc
        .select(&card)
        .map(|c| {
            let href = c
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default();
            let posted_raw = c
                .select(&posted)
                .next()
                .map(|el| {
                    el.value()
                        .attr("datetime")
                        .map(str::to_string)
                        .unwrap_or_else(|| el.text().collect::<String>())
                })
                .unwrap_or_default();
            let salary_text = text_of(&c, &salary);
            RawJob {
                source: "html_board".into(),
                title: text_of(&c, &title),
                company: text_of(&c, &company),
                location: text_of(&c, &location),
                description: String::new(),
                url: absolutize(href, link_base),
                salary: if salary_text.is_empty() {
                    RawSalary::None
                } else {
                    RawSalary::Text(salary_text)
                },
                posted: if posted_raw.trim().is_empty() {
                    RawDate::None
                } else {
                    RawDate::Text(posted_raw.trim().to_string())
                },
                remote: false,
            }
        })
        .collect();
    Ok(jobs)
}

pub struct HtmlBoardAdapter {
    client: reqwest::Client,
    url_template: String,
    link_base: String,
    selectors: ScrapeSelectors,
    best_effort: bool,
    delay: Duration,
}

impl HtmlBoardAdapter {
    pub fn from_config(cfg: &HtmlBoardConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            url_template: cfg.url_template.clone(),
            link_base: cfg.link_base.clone(),
            selectors: cfg.selectors.clone(),
            best_effort: cfg.best_effort,
            delay: Duration::from_millis(cfg.delay_ms),
        }
    }
}

#[async_trait]
impl SourceAdapter for HtmlBoardAdapter {
    fn name(&self) -> &'static str {
        "html_board"
    }

    fn best_effort(&self) -> bool {
        self.best_effort
    }

    fn min_interval(&self) -> Duration {
        self.delay
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError> {
        let url = search_url(&self.url_template, query);
        let body = get_text(&self.client, &url, &[]).await?;
        let mut jobs = parse_page(&body, &self.selectors, &self.link_base)?;
        if jobs.is_empty() {
            tracing::debug!(target: "ingest", source = "html_board", %url, "no job cards matched");
        }
        jobs.truncate(limit);
        Ok(jobs)
    }
}
