// src/aggregate.rs
//! Aggregation run: fan out to every adapter, then normalize → dedupe →
//! preference filter → score → sort → cap.
//!
//! Adapters run concurrently; queries within one adapter run in order behind the
//! per-source throttle. A failing or slow adapter only costs its own results.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::{counter, histogram};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ingest::config::SourcesConfig;
use crate::ingest::providers::build_adapters;
use crate::ingest::throttle::SourceThrottle;
use crate::ingest::{dedupe, ensure_metrics_described, normalize_record};
use crate::ingest::{RawJob, SourceAdapter, SourceError};
use crate::model::{JobPosting, Preferences, SearchQuery};
use crate::relevance::Scorer;

/// Outcome of one aggregation call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    pub postings: Vec<JobPosting>,
    /// Normalized postings before dedupe.
    pub total_found: usize,
    /// Normalized postings per source, before dedupe.
    pub by_source: BTreeMap<String, usize>,
    /// Adapters that failed at least one call, in adapter order.
    pub degraded_sources: Vec<String>,
    /// The run was cut short; `postings` covers what arrived in time.
    pub cancelled: bool,
}

/// Counts from the pure part of the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCounts {
    pub normalized: usize,
    pub duplicates: usize,
    pub filtered_by_preferences: usize,
    pub excluded_by_keyword: usize,
    pub below_threshold: usize,
}

struct Batch {
    adapter: usize,
    query: usize,
    outcome: Result<Vec<RawJob>, SourceError>,
}

/// Hard preference filter: remote-only and salary floor. Unknown salary passes.
pub fn passes_preferences(p: &JobPosting, prefs: &Preferences) -> bool {
    if prefs.remote_only && !p.is_remote() {
        return false;
    }
    if prefs.min_salary > 0 {
        if let Some(best) = p.best_salary() {
            if best < prefs.min_salary {
                return false;
            }
        }
    }
    true
}

/// Pure pipeline over already-ordered raw records.
pub fn rank_raw(
    raw: Vec<RawJob>,
    prefs: &Preferences,
    scorer: &Scorer,
    now: DateTime<Utc>,
) -> (Vec<JobPosting>, PipelineCounts, BTreeMap<String, usize>) {
    let mut counts = PipelineCounts::default();
    let mut by_source: BTreeMap<String, usize> = BTreeMap::new();

    let normalized: Vec<JobPosting> = raw
        .into_iter()
        .filter_map(|r| normalize_record(r, now))
        .inspect(|p| *by_source.entry(p.source.clone()).or_insert(0) += 1)
        .collect();
    counts.normalized = normalized.len();

    let (unique, dups) = dedupe(normalized);
    counts.duplicates = dups;

    let before = unique.len();
    let wanted: Vec<JobPosting> = unique
        .into_iter()
        .filter(|p| passes_preferences(p, prefs))
        .collect();
    counts.filtered_by_preferences = before - wanted.len();

    let (mut ranked, stats) = scorer.score_and_rank(wanted, now);
    counts.excluded_by_keyword = stats.excluded;
    counts.below_threshold = stats.below_threshold;

    // 0 means "no cap".
    if prefs.max_results > 0 {
        ranked.truncate(prefs.max_results);
    }
    (ranked, counts, by_source)
}

pub struct Aggregator {
    adapters: Vec<Box<dyn SourceAdapter>>,
    throttle: SourceThrottle,
    timeout: Duration,
    results_per_query: usize,
    scorer: Arc<Scorer>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>, scorer: Scorer) -> Self {
        let defaults = SourcesConfig::default();
        Self {
            adapters,
            throttle: SourceThrottle::new(),
            timeout: defaults.timeout(),
            results_per_query: defaults.results_per_query,
            scorer: Arc::new(scorer),
        }
    }

    /// Adapters, timeout and per-query cap from the sources file.
    pub fn from_config(cfg: &SourcesConfig, scorer: Scorer) -> Self {
        Self::new(build_adapters(cfg), scorer)
            .with_timeout(cfg.timeout())
            .with_results_per_query(cfg.results_per_query)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_results_per_query(mut self, n: usize) -> Self {
        self.results_per_query = n.max(1);
        self
    }

    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub async fn aggregate(&self, prefs: &Preferences) -> AggregateReport {
        self.aggregate_at(prefs, Utc::now()).await
    }

    /// Same as [`aggregate`](Self::aggregate) with a fixed clock.
    pub async fn aggregate_at(&self, prefs: &Preferences, now: DateTime<Utc>) -> AggregateReport {
        self.aggregate_with_cancel(prefs, now, &CancellationToken::new())
            .await
    }

    /// Run until done or until `cancel` fires; in the latter case batches that
    /// already arrived still go through the pipeline.
    pub async fn aggregate_with_cancel(
        &self,
        prefs: &Preferences,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AggregateReport {
        ensure_metrics_described();
        let queries = prefs.search_queries();
        if queries.is_empty() || self.adapters.is_empty() {
            tracing::info!(
                target: "aggregate",
                queries = queries.len(),
                adapters = self.adapters.len(),
                "nothing to search"
            );
            return AggregateReport::default();
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Batch>();
        let work = join_all(self.adapters.iter().enumerate().map(|(ai, adapter)| {
            let tx = tx.clone();
            let queries = &queries;
            async move {
                for (qi, q) in queries.iter().enumerate() {
                    let outcome = self.call(adapter.as_ref(), q).await;
                    if tx
                        .send(Batch {
                            adapter: ai,
                            query: qi,
                            outcome,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            }
        }));
        drop(tx);

        let cancelled = tokio::select! {
            biased;
            _ = cancel.cancelled() => true,
            _ = work => false,
        };
        if cancelled {
            tracing::warn!(target: "aggregate", "aggregation cancelled; keeping partial results");
        }

        let mut batches = Vec::new();
        while let Ok(b) = rx.try_recv() {
            batches.push(b);
        }
        // Completion order is not deterministic; adapter/query order is.
        batches.sort_by_key(|b| (b.adapter, b.query));

        let mut degraded: Vec<String> = Vec::new();
        let mut raw = Vec::new();
        for b in batches {
            let name = self.adapters[b.adapter].name();
            match b.outcome {
                Ok(jobs) => raw.extend(jobs),
                Err(e) if !e.is_unavailable() => {
                    tracing::info!(target: "aggregate", source = name, error = %e, "adapter skipped");
                }
                Err(e) => {
                    tracing::warn!(
                        target: "aggregate",
                        source = name,
                        best_effort = self.adapters[b.adapter].best_effort(),
                        query = %queries[b.query].keywords,
                        error = %e,
                        "adapter call failed"
                    );
                    counter!("aggregate_adapter_errors_total", "source" => name).increment(1);
                    if !degraded.iter().any(|d| d == name) {
                        degraded.push(name.to_string());
                    }
                }
            }
        }

        let (postings, counts, by_source) = rank_raw(raw, prefs, &self.scorer, now);

        counter!("aggregate_postings_total").increment(counts.normalized as u64);
        counter!("aggregate_dedup_total").increment(counts.duplicates as u64);
        counter!("aggregate_excluded_total").increment(
            (counts.filtered_by_preferences + counts.excluded_by_keyword + counts.below_threshold)
                as u64,
        );
        tracing::info!(
            target: "aggregate",
            queries = queries.len(),
            found = counts.normalized,
            duplicates = counts.duplicates,
            filtered = counts.filtered_by_preferences,
            excluded = counts.excluded_by_keyword,
            below_threshold = counts.below_threshold,
            returned = postings.len(),
            degraded = ?degraded,
            cancelled,
            "aggregation finished"
        );

        AggregateReport {
            postings,
            total_found: counts.normalized,
            by_source,
            degraded_sources: degraded,
            cancelled,
        }
    }

    /// One throttled, time-boxed adapter call. A timeout counts as a failure.
    async fn call(
        &self,
        adapter: &dyn SourceAdapter,
        query: &SearchQuery,
    ) -> Result<Vec<RawJob>, SourceError> {
        self.throttle
            .wait(adapter.name(), adapter.min_interval())
            .await;
        let started = Instant::now();
        let res = match tokio::time::timeout(
            self.timeout,
            adapter.fetch(query, self.results_per_query),
        )
        .await
        {
            Ok(r) => r,
            Err(_) => Err(SourceError::Timeout(self.timeout.as_millis() as u64)),
        };
        histogram!("aggregate_adapter_ms", "source" => adapter.name())
            .record(started.elapsed().as_secs_f64() * 1000.0);
        res.map(|mut jobs| {
            jobs.truncate(self.results_per_query);
            jobs
        })
    }
}
