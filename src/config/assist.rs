// src/config/assist.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::Context;

use crate::ingest::config::resolve_secret;

pub const ENV_ASSIST_CONFIG_PATH: &str = "ASSIST_CONFIG_PATH";
pub const DEFAULT_ASSIST_CONFIG_PATH: &str = "config/assist.json";

fn default_daily_limit() -> u32 {
    20
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_cache_dir() -> String {
    "cache/assist".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Only "openai" is wired up.
    #[serde(default)]
    pub provider: String,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: String::new(),
            daily_limit: default_daily_limit(),
            api_key: String::new(),
            model: default_model(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl AssistConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading assist config {}", path.display()))?;
        let mut cfg: AssistConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing assist config {}", path.display()))?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"; a missing key leaves it empty and the client disabled.
        cfg.api_key = match cfg.provider.as_str() {
            "openai" => resolve_secret(&cfg.api_key, "OPENAI_API_KEY").unwrap_or_default(),
            _ => cfg.api_key.trim().to_string(),
        };
        Ok(cfg)
    }

    /// `$ASSIST_CONFIG_PATH`, then `config/assist.json`, then disabled defaults.
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_ASSIST_CONFIG_PATH) {
            return Self::load_from_file(PathBuf::from(p));
        }
        let p = PathBuf::from(DEFAULT_ASSIST_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(p);
        }
        Ok(Self::default())
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}
