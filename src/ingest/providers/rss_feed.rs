// src/ingest/providers/rss_feed.rs
//! RSS 2.0 job feeds (We Work Remotely style: item titles read `"Company: Role"`).
//!
//! Feeds take no query, so items are matched against the query words client-side.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::config::RssConfig;
use crate::ingest::providers::{get_text, PayloadCache};
use crate::ingest::types::{RawDate, RawJob, SourceAdapter, SourceError};
use crate::model::SearchQuery;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    region: Option<String>,
}

/// Split `"Acme Corp: Backend Engineer"` into (company, title).
fn split_company_title(raw: &str) -> (String, String) {
    match raw.split_once(':') {
        Some((company, title)) if !company.trim().is_empty() && !title.trim().is_empty() => {
            (company.trim().to_string(), title.trim().to_string())
        }
        _ => (String::new(), raw.trim().to_string()),
    }
}

/// Some feeds ship HTML entities XML doesn't know.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse a feed body into raw jobs. Items without a `Company:` prefix keep an
/// empty company and are dropped later by the normalizer.
pub fn parse_feed(xml: &str, remote: bool) -> Result<Vec<RawJob>, SourceError> {
    let rss: Rss = from_str(&scrub_html_entities_for_xml(xml))?;
    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| {
            let (company, title) = split_company_title(it.title.as_deref().unwrap_or_default());
            RawJob {
                source: "rss".into(),
                title,
                company,
                location: it.region.unwrap_or_default(),
                description: it.description.unwrap_or_default(),
                url: it.link.unwrap_or_default(),
                posted: it.pub_date.map(RawDate::Text).unwrap_or_default(),
                remote,
                ..Default::default()
            }
        })
        .collect())
}

enum Mode {
    Fixture(String),
    Http {
        feeds: Vec<String>,
        client: reqwest::Client,
        cache: PayloadCache,
    },
}

pub struct RssFeedAdapter {
    mode: Mode,
    remote: bool,
    delay: Duration,
}

impl RssFeedAdapter {
    pub fn from_config(cfg: &RssConfig, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                feeds: cfg.feeds.clone(),
                client,
                cache: PayloadCache::new(Duration::from_secs(cfg.cache_ttl_secs)),
            },
            remote: cfg.remote,
            delay: Duration::from_millis(cfg.delay_ms),
        }
    }

    /// Serve a fixed feed body instead of fetching.
    pub fn from_fixture(xml: &str, remote: bool) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
            remote,
            delay: Duration::ZERO,
        }
    }

    fn keep_matching<'a>(
        items: &'a [RawJob],
        query: &'a SearchQuery,
    ) -> impl Iterator<Item = RawJob> + 'a {
        items
            .iter()
            .filter(move |j| query.matches_title(&j.title))
            .cloned()
    }
}

#[async_trait]
impl SourceAdapter for RssFeedAdapter {
    fn name(&self) -> &'static str {
        "rss"
    }

    fn min_interval(&self) -> Duration {
        self.delay
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawJob>, SourceError> {
        match &self.mode {
            Mode::Fixture(xml) => {
                let items = parse_feed(xml, self.remote)?;
                Ok(Self::keep_matching(&items, query).take(limit).collect())
            }
            Mode::Http {
                feeds,
                client,
                cache,
            } => {
                let mut out = Vec::new();
                let mut last_err = None;
                for (i, url) in feeds.iter().enumerate() {
                    // One broken feed must not hide the others.
                    let parsed = cache
                        .get_or_load(url, || async {
                            if i > 0 {
                                tokio::time::sleep(self.delay).await;
                            }
                            let body = get_text(client, url, &[]).await?;
                            parse_feed(&body, self.remote)
                        })
                        .await;
                    match parsed {
                        Ok(items) => out.extend(Self::keep_matching(&items, query)),
                        Err(e) => {
                            tracing::warn!(target: "ingest", source = "rss", feed = %url, error = %e, "feed failed");
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
    }
}
