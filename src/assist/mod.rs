// src/assist/mod.rs
//! Cover-letter assistant: provider abstraction + file cache + daily limit.
//!
//! Every failure (disabled, no key, limit reached, HTTP error, empty answer)
//! comes back as `None`.

mod cache;
mod openai;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::assist::AssistConfig;
use crate::model::JobPosting;

pub use cache::CachingClient;
pub use openai::OpenAiProvider;

/// Longest letter we hand back.
pub const LETTER_CAP: usize = 1500;

/// Text produced by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
}

pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What the rest of the crate talks to.
pub trait AssistClient: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, Option<Draft>>;
    fn provider_name(&self) -> &'static str;
}

/// Low-level provider: does the real remote call. The caching wrapper sits on top.
pub trait Provider: Send + Sync + 'static {
    fn fetch<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, Option<Draft>>;
    fn name(&self) -> &'static str;
}

pub type DynAssistClient = Arc<dyn AssistClient>;

/// Returns `None` always.
pub struct DisabledClient;

impl AssistClient for DisabledClient {
    fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFut<'a, Option<Draft>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests and offline runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: Draft,
}

impl Provider for MockProvider {
    fn fetch<'a>(&'a self, _prompt: &'a str) -> BoxFut<'a, Option<Draft>> {
        let out = self.fixed.clone();
        Box::pin(async move { Some(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// * `ASSIST_TEST_MODE=mock` → cached mock client.
/// * disabled, or no API key → [`DisabledClient`].
/// * otherwise OpenAI behind the cache + daily limit.
pub fn build_client_from_config(config: &AssistConfig) -> DynAssistClient {
    if std::env::var("ASSIST_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        let mock = MockProvider {
            fixed: Draft {
                text: "Dear hiring team,\n\nI would love to join you. (mock)".to_string(),
            },
        };
        return Arc::new(CachingClient::new(
            mock,
            config.cache_dir.clone().into(),
            config.daily_limit,
        ));
    }

    if !config.enabled {
        return Arc::new(DisabledClient);
    }

    match config.provider.as_str() {
        "openai" if config.has_key() => {
            let provider = OpenAiProvider::new(config.api_key.clone(), &config.model);
            Arc::new(CachingClient::new(
                provider,
                config.cache_dir.clone().into(),
                config.daily_limit,
            ))
        }
        "openai" => {
            warn!(target: "assist", "assistant enabled but OPENAI_API_KEY is missing");
            Arc::new(DisabledClient)
        }
        other => {
            warn!(target: "assist", provider = other, "unsupported assistant provider");
            Arc::new(DisabledClient)
        }
    }
}

/// Prompt for one posting. Description is already cleaned and capped by the normalizer.
pub fn cover_letter_prompt(posting: &JobPosting, profile_summary: &str) -> String {
    let mut p = String::with_capacity(1024 + posting.description.len());
    p.push_str("Role: ");
    p.push_str(&posting.title);
    p.push_str("\nCompany: ");
    p.push_str(&posting.company);
    if !posting.location.is_empty() {
        p.push_str("\nLocation: ");
        p.push_str(&posting.location);
    }
    if !posting.description.is_empty() {
        p.push_str("\nJob description: ");
        p.push_str(&posting.description);
    }
    p.push_str("\n\nCandidate profile: ");
    p.push_str(profile_summary.trim());
    p
}

/// Draft a short cover letter for `posting`. Plain text, at most [`LETTER_CAP`] chars.
pub async fn draft_cover_letter(
    client: &dyn AssistClient,
    posting: &JobPosting,
    profile_summary: &str,
) -> Option<String> {
    let prompt = cover_letter_prompt(posting, profile_summary);
    let draft = client.complete(&prompt).await?;
    let text = sanitize_letter(&draft.text);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Plain text only: drop control chars and markdown emphasis, collapse runs of
/// spaces, keep paragraph breaks, cap at [`LETTER_CAP`] chars.
pub fn sanitize_letter(input: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    for block in input.replace("\r\n", "\n").split("\n\n") {
        let mut line = String::new();
        let mut prev_space = false;
        for ch in block.chars() {
            let c = match ch {
                '\n' | '\t' | '\r' => ' ',
                '*' | '#' | '`' => continue,
                c if c.is_control() => continue,
                c => c,
            };
            if c == ' ' {
                if !prev_space && !line.is_empty() {
                    line.push(' ');
                }
                prev_space = true;
            } else {
                line.push(c);
                prev_space = false;
            }
        }
        let line = line.trim();
        if !line.is_empty() {
            paragraphs.push(line.to_string());
        }
    }
    let joined = paragraphs.join("\n\n");
    if joined.chars().count() > LETTER_CAP {
        joined.chars().take(LETTER_CAP).collect::<String>().trim_end().to_string()
    } else {
        joined
    }
}

/// Loaded config plus the client built from it.
pub struct AssistRuntime {
    pub cfg: AssistConfig,
    pub client: DynAssistClient,
}

impl AssistRuntime {
    pub fn from_default() -> anyhow::Result<Self> {
        let cfg = AssistConfig::load_default()?;
        Ok(Self::from_config(cfg))
    }

    pub fn from_config(cfg: AssistConfig) -> Self {
        // Safe diagnostics: only provider + enabled + key presence
        info!(
            target: "assist",
            provider = %cfg.provider,
            enabled = cfg.enabled,
            has_key = cfg.has_key(),
            "assistant config loaded"
        );
        let client = build_client_from_config(&cfg);
        Self { cfg, client }
    }

    pub async fn cover_letter(&self, posting: &JobPosting, profile_summary: &str) -> Option<String> {
        let out = draft_cover_letter(self.client.as_ref(), posting, profile_summary).await;
        if out.is_none() {
            info!(target: "assist", provider = self.client.provider_name(), "no cover letter produced");
        }
        out
    }
}
