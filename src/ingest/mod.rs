// src/ingest/mod.rs
pub mod config;
pub mod dedup;
pub mod normalize;
pub mod providers;
pub mod throttle;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

pub use dedup::{dedupe, fingerprint, Deduplicator};
pub use normalize::normalize_record;
pub use types::{RawDate, RawJob, RawSalary, SalaryPeriod, SourceAdapter, SourceError};

/// Longest description kept on a posting.
pub const DESCRIPTION_CAP: usize = 1000;

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "aggregate_postings_total",
            "Postings that survived normalization."
        );
        describe_counter!(
            "aggregate_dedup_total",
            "Postings removed as duplicates by fingerprint."
        );
        describe_counter!(
            "aggregate_excluded_total",
            "Postings removed by negative keywords, preferences or score threshold."
        );
        describe_counter!(
            "aggregate_adapter_errors_total",
            "Adapter calls that failed or timed out."
        );
        describe_histogram!("aggregate_adapter_ms", "Adapter call time in milliseconds.");
    });
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[a-z!][^>]*>").expect("tag regex"))
}

fn re_blocks() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("block regex")
    })
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("ws regex"))
}

/// Normalize text: decode entities, drop markup, collapse whitespace, cap length.
///
/// Entities are decoded twice because some boards ship HTML that is itself
/// entity-escaped (`&lt;p&gt;`).
pub fn normalize_text(s: &str, cap: usize) -> String {
    // 1) HTML entity decode (twice for double-escaped payloads)
    let once = html_escape::decode_html_entities(s);
    let mut out = html_escape::decode_html_entities(&once).to_string();

    // 2) Drop script/style bodies, then remaining tags
    out = re_blocks().replace_all(&out, " ").to_string();
    out = re_tags().replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (covers NBSP)
    out = re_ws().replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > cap {
        out = out.chars().take(cap).collect::<String>().trim_end().to_string();
    }

    out
}
