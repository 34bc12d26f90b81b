// tests/ingest_dedup.rs
use chrono::{TimeZone, Utc};
use job_scout::ingest::{dedupe, fingerprint, normalize_record, Deduplicator, RawJob};
use job_scout::JobPosting;

fn posting(source: &str, company: &str, title: &str, location: &str) -> JobPosting {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
    normalize_record(
        RawJob {
            source: source.into(),
            title: title.into(),
            company: company.into(),
            location: location.into(),
            url: format!("https://{source}.example/job"),
            ..Default::default()
        },
        now,
    )
    .unwrap()
}

#[test]
fn cross_source_repeats_keep_first() {
    let raw = vec![
        posting("adzuna", "Google", "Software Engineer", "Mountain View, CA"),
        posting("greenhouse", "Google LLC", "software engineer", "Mountain View CA"),
        posting("lever", "GOOGLE, Inc.", "Software-Engineer", "mountain view, ca"),
        posting("adzuna", "Google", "Software Engineer", "New York, NY"),
    ];
    let (kept, dropped) = dedupe(raw);
    // different location is a different opportunity
    assert_eq!(kept.len(), 2);
    assert_eq!(dropped, 2);
    assert_eq!(kept[0].source, "adzuna");
    assert_eq!(kept[1].location, "New York, NY");
}

#[test]
fn second_pass_drops_nothing() {
    let raw = vec![
        posting("adzuna", "Google", "Software Engineer", "Mountain View, CA"),
        posting("remotive", "Hooli", "Backend Engineer", "Remote"),
        posting("greenhouse", "Google LLC", "software engineer", "Mountain View CA"),
        posting("rss", "Hooli", "Backend Engineer", "Anywhere"),
        posting("lever", "Initech", "Associate Engineer", "Austin, TX"),
    ];
    let (once, dropped) = dedupe(raw);
    assert_eq!(dropped, 2);
    let (twice, dropped_again) = dedupe(once.clone());
    assert_eq!(dropped_again, 0);
    assert_eq!(twice, once);
}

#[test]
fn remote_variants_share_a_fingerprint() {
    let a = posting("remotive", "Hooli", "Backend Engineer", "Remote - Worldwide");
    let b = posting("rss", "Hooli", "Backend Engineer", "Anywhere");
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn fingerprint_is_stable_hex() {
    let f = fingerprint("Acme", "Engineer", "NYC");
    assert_eq!(f.len(), 32);
    assert!(f.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(f, fingerprint("Acme", "Engineer", "NYC"));
    assert_ne!(f, fingerprint("Acme", "Engineer II", "NYC"));
}

#[test]
fn deduplicator_is_per_instance() {
    let p = posting("s", "Acme", "Engineer", "NYC");
    let mut first = Deduplicator::new();
    assert!(first.admit(&p));
    assert!(!first.admit(&p));
    assert_eq!(first.len(), 1);

    let mut second = Deduplicator::new();
    assert!(second.is_empty());
    assert!(second.admit(&p));
}
