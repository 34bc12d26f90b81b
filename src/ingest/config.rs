// src/ingest/config.rs
//! Source configuration: which adapters run, how fast, and against what.
//!
//! Loaded from TOML or JSON. Credentials are either literal values or `"ENV"`,
//! which means "read the conventional environment variable".

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PATH: &str = "SOURCES_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/sources.toml";
pub const DEFAULT_JSON_PATH: &str = "config/sources.json";

/// Bounds on a single adapter call.
pub const MIN_TIMEOUT_MS: u64 = 10_000;
pub const MAX_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Per-call timeout, clamped to 10..=30 s.
    pub timeout_ms: u64,
    /// Result cap handed to every adapter call.
    pub results_per_query: usize,
    pub user_agent: String,
    pub adzuna: AdzunaConfig,
    pub remotive: RemotiveConfig,
    pub rss: RssConfig,
    pub greenhouse: BoardConfig,
    pub lever: BoardConfig,
    pub ashby: BoardConfig,
    pub html_board: HtmlBoardConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            results_per_query: 25,
            user_agent: concat!("job-scout/", env!("CARGO_PKG_VERSION")).to_string(),
            adzuna: AdzunaConfig::default(),
            remotive: RemotiveConfig::default(),
            rss: RssConfig::default(),
            greenhouse: BoardConfig::default(),
            lever: BoardConfig::default(),
            ashby: BoardConfig::default(),
            html_board: HtmlBoardConfig::default(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdzunaConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    pub base_url: String,
    /// Two-letter country segment of the endpoint (`us`, `gb`, ...).
    pub country: String,
    /// Literal id or `"ENV"` for `ADZUNA_APP_ID`.
    pub app_id: String,
    /// Literal key or `"ENV"` for `ADZUNA_APP_KEY`.
    pub app_key: String,
    pub max_days_old: u32,
}

impl Default for AdzunaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 300,
            base_url: "https://api.adzuna.com/v1/api/jobs".into(),
            country: "us".into(),
            app_id: "ENV".into(),
            app_key: "ENV".into(),
            max_days_old: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemotiveConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    pub base_url: String,
}

impl Default for RemotiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 1_000,
            base_url: "https://remotive.com/api/remote-jobs".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RssConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    pub feeds: Vec<String>,
    /// Treat every item as remote (true for remote-only job boards).
    pub remote: bool,
    /// How long a downloaded feed is reused across queries; 0 disables reuse.
    pub cache_ttl_secs: u64,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 500,
            feeds: vec![
                "https://weworkremotely.com/categories/remote-programming-jobs.rss".into(),
            ],
            remote: true,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Per-company boards (Greenhouse, Lever, Ashby), keyed by board identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    /// Overrides the provider's public endpoint (tests, proxies).
    pub base_url: Option<String>,
    pub boards: Vec<String>,
    /// How long a downloaded board is reused across queries; 0 disables reuse.
    pub cache_ttl_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 250,
            base_url: None,
            boards: Vec::new(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// CSS selectors for the best-effort HTML board.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeSelectors {
    pub card: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub posted: String,
    pub salary: String,
}

impl Default for ScrapeSelectors {
    fn default() -> Self {
        Self {
            card: "[data-testid='searchSerpJob']".into(),
            title: "h2 a, [data-testid='searchSerpJobTitle']".into(),
            company: "[data-testid='companyName']".into(),
            location: "[data-testid='searchSerpJobLocation']".into(),
            link: "h2 a".into(),
            posted: "[data-testid='searchSerpJobDateStamp']".into(),
            salary: "[data-testid='searchSerpJobSalaryConfirmed']".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HtmlBoardConfig {
    /// Off unless asked for: scraped pages break without notice.
    pub enabled: bool,
    pub delay_ms: u64,
    /// `{query}` and `{location}` are replaced with URL-encoded values.
    pub url_template: String,
    /// Prefix for relative links found on the page.
    pub link_base: String,
    /// Reported with every failure so callers can tell scraper breakage from outages.
    pub best_effort: bool,
    pub selectors: ScrapeSelectors,
}

impl Default for HtmlBoardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 2_000,
            url_template: "https://www.simplyhired.com/search?q={query}&l={location}".into(),
            link_base: "https://www.simplyhired.com".into(),
            best_effort: true,
            selectors: ScrapeSelectors::default(),
        }
    }
}

/// Resolve a credential: literal value, or the env var when the value is empty or `"ENV"`.
pub fn resolve_secret(value: &str, env_name: &str) -> Option<String> {
    let v = value.trim();
    let resolved = if v.is_empty() || v.eq_ignore_ascii_case("env") {
        std::env::var(env_name).ok()?
    } else {
        v.to_string()
    };
    let resolved = resolved.trim().to_string();
    (!resolved.is_empty()).then_some(resolved)
}

/// Load from an explicit path. The extension picks the format (`.json` or TOML otherwise).
pub fn load_sources_from(path: &Path) -> Result<SourcesConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, &ext)
        .with_context(|| format!("parsing sources config {}", path.display()))
}

/// Load using env var + fallbacks:
/// 1) $SOURCES_CONFIG_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in defaults
pub fn load_sources_default() -> Result<SourcesConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(SourcesConfig::default())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<SourcesConfig> {
    let mut cfg: SourcesConfig = if hint_ext == "json" {
        serde_json::from_str(s)?
    } else {
        toml::from_str(s)?
    };
    cfg.rss.feeds = clean_list(std::mem::take(&mut cfg.rss.feeds));
    cfg.greenhouse.boards = clean_list(std::mem::take(&mut cfg.greenhouse.boards));
    cfg.lever.boards = clean_list(std::mem::take(&mut cfg.lever.boards));
    cfg.ashby.boards = clean_list(std::mem::take(&mut cfg.ashby.boards));
    Ok(cfg)
}

/// Trim, drop empties and duplicates, keep first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
