// src/ingest/normalize.rs
//! Raw provider record → canonical `JobPosting`.
//!
//! Everything here is pure: the only clock is the `now` argument, used to resolve
//! relative dates such as "3 days ago". Unparseable salaries and dates become
//! `None`; a record whose title or company cleans down to nothing is dropped.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::{RawDate, RawJob, RawSalary, SalaryPeriod};
use crate::ingest::{normalize_text, DESCRIPTION_CAP};
use crate::model::{JobPosting, PostingFields, REMOTE};

const FIELD_CAP: usize = 200;
const HOURS_PER_YEAR: f64 = 2080.0;
/// Figures below this are read as hourly rates.
const HOURLY_CEILING: f64 = 200.0;
/// Non-hourly figures below this are not annual salaries (daily/weekly/monthly).
const ANNUAL_FLOOR: f64 = 1000.0;
const ANNUAL_CEILING: f64 = 10_000_000.0;
/// Digit strings above this are epoch milliseconds rather than seconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

pub fn normalize_record(raw: RawJob, now: DateTime<Utc>) -> Option<JobPosting> {
    let title = normalize_text(&raw.title, FIELD_CAP);
    let company = normalize_text(&raw.company, FIELD_CAP);
    if title.is_empty() || company.is_empty() {
        return None;
    }

    let location = normalize_location(&raw.location, raw.remote);
    let (salary_min, salary_max) = parse_salary(&raw.salary);

    JobPosting::new(PostingFields {
        title,
        company,
        location,
        description: normalize_text(&raw.description, DESCRIPTION_CAP),
        url: raw.url.trim().to_string(),
        salary_min,
        salary_max,
        source: raw.source,
        posted_at: parse_posted_at(&raw.posted, now),
    })
}

/// Any remote-flavoured location collapses to the `"Remote"` sentinel; hybrid roles keep their text.
pub fn normalize_location(raw: &str, provider_remote: bool) -> String {
    let loc = normalize_text(raw, FIELD_CAP);
    let lower = loc.to_lowercase();
    if lower.contains("hybrid") {
        return loc;
    }
    if provider_remote || lower.contains("remote") || lower.contains("anywhere") {
        return REMOTE.to_string();
    }
    loc
}

/* ----------------------------
Salary
---------------------------- */

/// One pay figure: optional currency symbol, then US (`85,000.00`), European
/// (`50.000`) or plain (`45.5`) digits, then an optional `k`.
fn re_amount() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?P<cur>[$€£])?\s*(?:(?P<us>\d{1,3}(?:,\d{3})+(?:\.\d+)?)|(?P<eu>\d{1,3}(?:\.\d{3})+(?:,\d+)?)|(?P<plain>\d+(?:\.\d+)?))\s*(?P<k>k\b)?",
        )
        .expect("amount regex")
    })
}

/// Retirement-plan mentions ("401k", "401(k)") are not pay.
fn re_retirement() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b401\s*\(?k\)?").expect("retirement regex"))
}

fn re_range_sep() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:-|–|—|to)\s*$").expect("range regex"))
}

fn re_hourly() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(/\s*h(ou)?r\b|per\s+hour|\bhourly\b|an\s+hour)").expect("hourly regex")
    })
}

/// Annualize one figure. `None` when the figure can't be an annual salary.
fn annualize(value: f64, hourly: bool) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let annual = if hourly || value < HOURLY_CEILING {
        value * HOURS_PER_YEAR
    } else if value < ANNUAL_FLOOR {
        return None;
    } else {
        value
    };
    if annual > ANNUAL_CEILING {
        return None;
    }
    Some(annual.round() as u32)
}

fn ordered(a: Option<u32>, b: Option<u32>) -> (Option<u32>, Option<u32>) {
    match (a, b) {
        (Some(x), Some(y)) if x > y => (Some(y), Some(x)),
        (Some(x), None) => (Some(x), Some(x)),
        (None, Some(y)) => (Some(y), Some(y)),
        other => other,
    }
}

/// Annual (min, max) from whatever the provider gave us.
pub fn parse_salary(raw: &RawSalary) -> (Option<u32>, Option<u32>) {
    match raw {
        RawSalary::None => (None, None),
        RawSalary::Range { min, max, period } => {
            let hourly = *period == SalaryPeriod::Hourly;
            let conv = |v: Option<f64>| match (v, period) {
                (Some(v), SalaryPeriod::Yearly) if v >= ANNUAL_FLOOR && v <= ANNUAL_CEILING => {
                    Some(v.round() as u32)
                }
                (Some(v), _) => annualize(v, hourly),
                (None, _) => None,
            };
            ordered(conv(*min), conv(*max))
        }
        RawSalary::Text(text) => parse_salary_text(text),
    }
}

struct Figure {
    value: f64,
    currency: bool,
}

fn figure_value(caps: &regex::Captures<'_>) -> Option<f64> {
    let digits = if let Some(m) = caps.name("us") {
        m.as_str().replace(',', "")
    } else if let Some(m) = caps.name("eu") {
        m.as_str().replace('.', "").replace(',', ".")
    } else {
        caps.name("plain")?.as_str().to_string()
    };
    let value: f64 = digits.parse().ok()?;
    Some(if caps.name("k").is_some() {
        value * 1000.0
    } else {
        value
    })
}

/// Every figure in the text. The upper bound of `"$80 - 100k"` inherits the
/// currency of the lower one.
fn figures(text: &str) -> Vec<Figure> {
    let mut out: Vec<Figure> = Vec::new();
    let mut prev_end = None;
    for caps in re_amount().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(value) = figure_value(&caps) else { continue };
        let joined = prev_end
            .map(|end| re_range_sep().is_match(&text[end..whole.start()]))
            .unwrap_or(false);
        let currency = caps.name("cur").is_some()
            || (joined && out.last().map(|f| f.currency).unwrap_or(false));
        out.push(Figure { value, currency });
        prev_end = Some(whole.end());
    }
    out
}

/// Parse free-text pay such as `"$80k - $100k"`, `"$120,000"` or `"$45-$60/hr"`.
///
/// When any figure carries a currency symbol, bare numbers are ignored.
pub fn parse_salary_text(text: &str) -> (Option<u32>, Option<u32>) {
    let hourly = re_hourly().is_match(text);
    let text = re_retirement().replace_all(text, " ");
    let mut found = figures(&text);
    if found.iter().any(|f| f.currency) {
        found.retain(|f| f.currency);
    }

    let mut values = found.into_iter().map(|f| f.value);
    let first = values.next();
    let second = values.next();
    // "80-100k": the suffix on the upper bound applies to the lower one too.
    let first = match (first, second) {
        (Some(a), Some(b)) if b >= 1000.0 && a < 1000.0 && a * 1000.0 <= b => Some(a * 1000.0),
        _ => first,
    };
    ordered(
        first.and_then(|v| annualize(v, hourly)),
        second.and_then(|v| annualize(v, hourly)),
    )
}

/* ----------------------------
Dates
---------------------------- */

fn re_relative() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\+?\s*(minute|min|hour|hr|day|week|month)s?\s+ago")
            .expect("relative date regex")
    })
}

fn from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms).single()
}

pub fn parse_posted_at(raw: &RawDate, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match raw {
        RawDate::None => None,
        RawDate::Text(s) => parse_date_text(s, now),
        RawDate::EpochMillis(ms) => from_epoch_millis(*ms),
        RawDate::EpochSeconds(s) => from_epoch(*s),
    }
}

/// Best-effort date parsing across provider formats. Never panics, never errors.
pub fn parse_date_text(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = s.parse().ok()?;
        return if n > MILLIS_THRESHOLD {
            from_epoch_millis(n)
        } else {
            from_epoch(n)
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return from_epoch(dt.unix_timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.fZ"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }

    parse_relative(s, now)
}

fn parse_relative(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = s.to_lowercase();
    if ["just posted", "just now", "today"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return Some(now);
    }
    if lower.contains("yesterday") {
        return Some(now - Duration::days(1));
    }

    let caps = re_relative().captures(&lower)?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    if n > 3650 {
        return None;
    }
    let unit = caps.get(2)?.as_str();
    let delta = match unit {
        "minute" | "min" => Duration::minutes(n),
        "hour" | "hr" => Duration::hours(n),
        "day" => Duration::days(n),
        "week" => Duration::weeks(n),
        "month" => Duration::days(n * 30),
        _ => return None,
    };
    Some(now - delta)
}
