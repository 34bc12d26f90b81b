// src/relevance.rs
//! Relevance scoring: keyword tables, salary tiers and freshness, compiled from
//! `config/scoring.toml` (or the identical built-in defaults).
//!
//! Scoring is additive from `base_score`. A negative keyword anywhere in the
//! title or description excludes the posting outright.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::model::JobPosting;

// --- env defaults & names ---
pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";
pub const ENV_SCORING_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";
pub const ENV_SCORING_MIN_SCORE: &str = "SCORING_MIN_SCORE";
pub const DEFAULT_MIN_SCORE: u8 = 40;

// Dev logging gate: JOB_SCOUT_DEV_LOG=1 AND dev env (debug build or JOB_SCOUT_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("JOB_SCOUT_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("JOB_SCOUT_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Anonymized dev logger: the posting is identified by its fingerprint hash only.
fn dev_log_relevance(event: &str, posting: &JobPosting, matched: &[String], reasons: &[String], score: u8) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(posting.fingerprint());
    let matched_short = truncate_vec(matched, 5);
    let reasons_short = truncate_vec(reasons, 5);
    info!(
        target: "relevance",
        %id, score, event,
        source = %posting.source,
        matched = ?matched_short,
        reasons = ?reasons_short
    );
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

// parse optional threshold env and clamp to <0..=100>
fn parse_min_score_env(raw: Option<String>) -> Option<u8> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|v| v.clamp(0, 100) as u8)
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordBonus {
    pub keyword: String,
    pub bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SalaryTier {
    /// Applies when `salary_min` is at least this much.
    pub at_least: u32,
    pub bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FreshnessTier {
    pub max_age_days: i64,
    pub bonus: i32,
}

/// Versioned scoring table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub version: u32,
    pub base_score: i32,
    pub min_score: u8,
    pub negative_keywords: Vec<String>,
    pub positive_keywords: Vec<KeywordBonus>,
    /// Cumulative: every tier reached adds its bonus.
    pub salary_tiers: Vec<SalaryTier>,
    /// First matching tier only, ordered by age.
    pub freshness_tiers: Vec<FreshnessTier>,
}

fn kw(keyword: &str, bonus: i32) -> KeywordBonus {
    KeywordBonus {
        keyword: keyword.to_string(),
        bonus,
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            version: 1,
            base_score: 50,
            min_score: DEFAULT_MIN_SCORE,
            negative_keywords: [
                "senior", "sr.", "sr", "staff", "principal", "lead", "manager", "director",
                "head of", "vp", "architect", "distinguished", "5+ years", "7+ years",
                "8+ years", "10+ years",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            positive_keywords: vec![
                kw("new grad", 30),
                kw("new graduate", 30),
                kw("entry level", 25),
                kw("entry-level", 25),
                kw("recent graduate", 25),
                kw("university grad", 25),
                kw("early career", 20),
                kw("junior", 20),
                kw("0-2 years", 15),
                kw("associate", 10),
                kw("2026", 10),
                kw("2027", 10),
                kw("graduate program", 5),
            ],
            salary_tiers: vec![
                SalaryTier {
                    at_least: 80_000,
                    bonus: 10,
                },
                SalaryTier {
                    at_least: 100_000,
                    bonus: 10,
                },
            ],
            freshness_tiers: vec![
                FreshnessTier {
                    max_age_days: 3,
                    bonus: 15,
                },
                FreshnessTier {
                    max_age_days: 7,
                    bonus: 10,
                },
                FreshnessTier {
                    max_age_days: 14,
                    bonus: 5,
                },
            ],
        }
    }
}

/* ----------------------------
Compiled scorer
---------------------------- */

#[derive(Debug)]
struct CompiledKeyword {
    keyword: String,
    bonus: i32,
    re: Regex,
}

/// Outcome of scoring one posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    /// A negative keyword matched; the posting is dropped regardless of score.
    Excluded { keyword: String },
    Scored(Relevance),
}

/// Score plus the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Relevance {
    pub score: u8,
    pub matched: Vec<String>,
    pub reasons: Vec<String>,
}

/// Counts from one [`Scorer::score_and_rank`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankStats {
    pub excluded: usize,
    pub below_threshold: usize,
}

/// Case-insensitive keyword match bounded by non-alphanumerics, so `senior`
/// misses `seniority` while `sr.` and `10+ years` still work.
fn keyword_regex(keyword: &str) -> anyhow::Result<Regex> {
    let pat = format!(
        r"(?i)(?:^|[^a-z0-9]){}(?:$|[^a-z0-9])",
        regex::escape(keyword.trim())
    );
    Regex::new(&pat).map_err(|e| anyhow!("keyword `{}` regex error: {}", keyword, e))
}

#[derive(Debug)]
pub struct Scorer {
    pub rules: ScoringRules,
    negatives: Vec<CompiledKeyword>,
    positives: Vec<CompiledKeyword>,
}

impl Default for Scorer {
    fn default() -> Self {
        // Built-in keywords are plain literals; escaping cannot fail to compile.
        Self::new(ScoringRules::default()).unwrap_or_else(|_| Self {
            rules: ScoringRules::default(),
            negatives: Vec::new(),
            positives: Vec::new(),
        })
    }
}

impl Scorer {
    pub fn new(rules: ScoringRules) -> anyhow::Result<Self> {
        let negatives = rules
            .negative_keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| {
                Ok(CompiledKeyword {
                    keyword: k.trim().to_string(),
                    bonus: 0,
                    re: keyword_regex(k)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let positives = rules
            .positive_keywords
            .iter()
            .filter(|k| !k.keyword.trim().is_empty())
            .map(|k| {
                Ok(CompiledKeyword {
                    keyword: k.keyword.trim().to_string(),
                    bonus: k.bonus,
                    re: keyword_regex(&k.keyword)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            negatives,
            positives,
        })
    }

    /// Load from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let rules: ScoringRules = toml::from_str(toml_str)?;
        Self::new(rules)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scoring config at {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing scoring config {}", path.display()))
    }

    /// Resolve and load the scoring table:
    /// 1) $SCORING_CONFIG_PATH (must exist)
    /// 2) config/scoring.toml
    /// 3) built-in defaults
    ///
    /// `SCORING_MIN_SCORE` then overrides the threshold.
    pub fn from_toml() -> anyhow::Result<Self> {
        let scorer = match std::env::var(ENV_SCORING_CONFIG_PATH) {
            Ok(p) => Self::from_path(&PathBuf::from(p))?,
            Err(_) => {
                let p = PathBuf::from(DEFAULT_SCORING_CONFIG_PATH);
                if p.exists() {
                    Self::from_path(&p)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(scorer.with_env_overrides())
    }

    /// Apply `SCORING_MIN_SCORE` when set and parseable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(t) = parse_min_score_env(std::env::var(ENV_SCORING_MIN_SCORE).ok()) {
            self.rules.min_score = t;
        }
        self
    }

    pub fn min_score(&self) -> u8 {
        self.rules.min_score
    }

    /// Score one posting against `now`. Pure and deterministic.
    pub fn score(&self, posting: &JobPosting, now: DateTime<Utc>) -> Assessment {
        let haystack = format!("{}\n{}", posting.title, posting.description);

        if let Some(neg) = self.negatives.iter().find(|k| k.re.is_match(&haystack)) {
            let reasons = vec![format!("negative:{}", neg.keyword)];
            dev_log_relevance("excluded", posting, &[], &reasons, 0);
            return Assessment::Excluded {
                keyword: neg.keyword.clone(),
            };
        }

        let mut total = self.rules.base_score;
        let mut rel = Relevance::default();

        for k in self.positives.iter().filter(|k| k.re.is_match(&haystack)) {
            total += k.bonus;
            rel.matched.push(k.keyword.clone());
            rel.reasons.push(format!("keyword:{}:+{}", k.keyword, k.bonus));
        }

        if let Some(min) = posting.salary_min {
            for tier in self.rules.salary_tiers.iter().filter(|t| min >= t.at_least) {
                total += tier.bonus;
                rel.reasons.push(format!("salary>={}:+{}", tier.at_least, tier.bonus));
            }
        }

        if let Some(posted) = posting.posted_at {
            let age_days = (now - posted).num_days().max(0);
            if let Some(tier) = self
                .rules
                .freshness_tiers
                .iter()
                .find(|t| age_days <= t.max_age_days)
            {
                total += tier.bonus;
                rel.reasons
                    .push(format!("fresh<={}d:+{}", tier.max_age_days, tier.bonus));
            }
        }

        rel.score = total.clamp(0, 100) as u8;
        if rel.score >= self.rules.min_score {
            rel.reasons.push(format!("threshold_ok:{}", self.rules.min_score));
            dev_log_relevance("passed", posting, &rel.matched, &rel.reasons, rel.score);
        } else {
            rel.reasons.push(format!("threshold_fail:{}", self.rules.min_score));
            dev_log_relevance("below_threshold", posting, &rel.matched, &rel.reasons, rel.score);
        }
        Assessment::Scored(rel)
    }

    /// Score, drop excluded and below-threshold postings, and sort: score
    /// descending, then newer `posted_at`, unknown dates last, input order otherwise.
    pub fn score_and_rank(
        &self,
        postings: Vec<JobPosting>,
        now: DateTime<Utc>,
    ) -> (Vec<JobPosting>, RankStats) {
        let mut stats = RankStats::default();
        let mut kept: Vec<JobPosting> = postings
            .into_iter()
            .filter_map(|p| match self.score(&p, now) {
                Assessment::Excluded { .. } => {
                    stats.excluded += 1;
                    None
                }
                Assessment::Scored(rel) if rel.score < self.rules.min_score => {
                    stats.below_threshold += 1;
                    None
                }
                Assessment::Scored(rel) => Some(p.with_score(rel.score)),
            })
            .collect();

        // Stable sort keeps first-seen order among full ties.
        kept.sort_by(|a, b| {
            b.relevance_score()
                .cmp(&a.relevance_score())
                .then_with(|| b.posted_at.cmp(&a.posted_at))
        });
        (kept, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PostingFields;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn posting(title: &str) -> JobPosting {
        JobPosting::new(PostingFields {
            title: title.into(),
            company: "Acme".into(),
            location: "Remote".into(),
            source: "test".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn keyword_bounds_are_respected() {
        let re = keyword_regex("senior").unwrap();
        assert!(re.is_match("Senior Engineer"));
        assert!(!re.is_match("seniority-based pay"));
        let sr = keyword_regex("sr.").unwrap();
        assert!(sr.is_match("Sr. Developer"));
        let years = keyword_regex("10+ years").unwrap();
        assert!(years.is_match("needs 10+ years of Go"));
    }

    #[test]
    fn plain_title_scores_base() {
        let s = Scorer::default();
        match s.score(&posting("Software Engineer"), now()) {
            Assessment::Scored(r) => assert_eq!(r.score, 50),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn freshness_uses_first_tier_and_future_is_fresh() {
        let s = Scorer::default();
        let mut p = posting("Software Engineer");
        p.posted_at = Some(now() - Duration::days(5));
        assert!(matches!(s.score(&p, now()), Assessment::Scored(Relevance { score: 60, .. })));
        p.posted_at = Some(now() + Duration::days(2));
        assert!(matches!(s.score(&p, now()), Assessment::Scored(Relevance { score: 65, .. })));
        p.posted_at = Some(now() - Duration::days(30));
        assert!(matches!(s.score(&p, now()), Assessment::Scored(Relevance { score: 50, .. })));
    }

    #[test]
    fn min_score_env_is_clamped() {
        assert_eq!(parse_min_score_env(Some(" 55 ".into())), Some(55));
        assert_eq!(parse_min_score_env(Some("500".into())), Some(100));
        assert_eq!(parse_min_score_env(Some("-3".into())), Some(0));
        assert_eq!(parse_min_score_env(Some("abc".into())), None);
    }

    #[test]
    fn anon_hash_is_short_hex() {
        let h = anon_hash("abc");
        assert_eq!(h.len(), 12);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
