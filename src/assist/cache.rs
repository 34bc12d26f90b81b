// src/assist/cache.rs
//! File cache keyed by prompt hash, plus a per-day cap on real provider calls.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{sanitize_letter, AssistClient, BoxFut, Draft, Provider};

/// Counter state is guarded by a `Mutex`; it is never held across an await.
pub struct CachingClient<P: Provider> {
    inner: P,
    cache_dir: PathBuf,
    daily_limit_max: u32,
    counter: Arc<Mutex<DailyCounter>>,
}

impl<P: Provider> CachingClient<P> {
    pub fn new(inner: P, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            tracing::warn!(target: "assist", dir = %cache_dir.display(), error = %e, "cache dir unavailable");
        }
        let counter = Arc::new(Mutex::new(
            load_daily_counter(&cache_dir).unwrap_or_default(),
        ));
        Self {
            inner,
            cache_dir,
            daily_limit_max,
            counter,
        }
    }

    /// Real calls made today.
    pub fn calls_today(&self) -> u32 {
        let g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        if g.is_expired() {
            0
        } else {
            g.count
        }
    }

    async fn complete_impl(&self, prompt: &str) -> Option<Draft> {
        // Cache hits are free and never count toward the limit.
        let key = cache_key(prompt);
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            tracing::debug!(target: "assist", %key, "cache hit");
            return Some(hit);
        }

        {
            let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
            if g.is_expired() {
                g.reset_to_today();
                let _ = save_daily_counter(&self.cache_dir, &g);
            }
            if g.count >= self.daily_limit_max {
                tracing::info!(target: "assist", limit = self.daily_limit_max, "daily limit reached");
                return None;
            }
        }

        let mut fresh = self.inner.fetch(prompt).await?;
        fresh.text = sanitize_letter(&fresh.text);
        if fresh.text.is_empty() {
            return None;
        }
        let _ = write_cache_file(&self.cache_dir, &key, &fresh);
        let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        g.count = g.count.saturating_add(1);
        let _ = save_daily_counter(&self.cache_dir, &g);
        Some(fresh)
    }
}

impl<P: Provider> AssistClient for CachingClient<P> {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, Option<Draft>> {
        Box::pin(self.complete_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

pub(crate) fn cache_key(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<Draft> {
    let s = fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&s).ok()
}

fn write_atomic(path: &Path, body: &str) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(body.as_bytes())?;
    fs::rename(tmp, path)
}

fn write_cache_file(dir: &Path, key: &str, value: &Draft) -> io::Result<()> {
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    write_atomic(&cache_path(dir, key), &json)
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let s = serde_json::to_string(dc).map_err(io::Error::other)?;
    write_atomic(&counter_path(dir), &s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::MockProvider;

    fn mock(text: &str) -> MockProvider {
        MockProvider {
            fixed: Draft { text: text.into() },
        }
    }

    #[test]
    fn cache_key_is_stable_hex() {
        assert_eq!(cache_key("a"), cache_key("a"));
        assert_ne!(cache_key("a"), cache_key("b"));
        assert_eq!(cache_key("a").len(), 32);
    }

    #[tokio::test]
    async fn cache_hits_skip_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let client = CachingClient::new(mock("Hello"), dir.path().to_path_buf(), 1);
        assert_eq!(client.complete("p1").await.unwrap().text, "Hello");
        assert_eq!(client.calls_today(), 1);
        // same prompt: served from disk
        assert!(client.complete("p1").await.is_some());
        // new prompt: over the limit
        assert!(client.complete("p2").await.is_none());
        assert_eq!(client.calls_today(), 1);
    }

    #[tokio::test]
    async fn counter_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let c = CachingClient::new(mock("Hi"), dir.path().to_path_buf(), 5);
            c.complete("x").await;
        }
        let c = CachingClient::new(mock("Hi"), dir.path().to_path_buf(), 5);
        assert_eq!(c.calls_today(), 1);
    }
}
