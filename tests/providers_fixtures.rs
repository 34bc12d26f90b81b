// tests/providers_fixtures.rs
// Provider field mapping against recorded payloads, then through the normalizer.

use chrono::{DateTime, TimeZone, Utc};
use job_scout::ingest::normalize_record;
use job_scout::ingest::providers::rss_feed::RssFeedAdapter;
use job_scout::ingest::providers::{adzuna, ashby, greenhouse, html_board, lever, remotive};
use job_scout::ingest::config::ScrapeSelectors;
use job_scout::ingest::{RawSalary, SourceAdapter};
use job_scout::{JobPosting, SearchQuery};

const WWR_XML: &str = include_str!("fixtures/wwr_programming.xml");

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

fn normalized(raw: Vec<job_scout::RawJob>) -> Vec<JobPosting> {
    raw.into_iter()
        .filter_map(|r| normalize_record(r, now()))
        .collect()
}

#[tokio::test]
async fn rss_fixture_matches_query_words_in_title() {
    let adapter = RssFeedAdapter::from_fixture(WWR_XML, true);
    let items = adapter
        .fetch(&SearchQuery::new("software engineer", None), 10)
        .await
        .expect("rss parse ok");
    // designer is filtered out by the query; the orphan item survives fetch but not normalization
    assert_eq!(items.len(), 3);

    let postings = normalized(items);
    assert_eq!(postings.len(), 2);
    let junior = &postings[0];
    assert_eq!(junior.company, "Acme Robotics");
    assert_eq!(junior.title, "Junior Software Engineer");
    assert_eq!(junior.location, "Remote");
    assert_eq!(
        junior.description,
        "Join our platform team. Entry-level friendly."
    );
    assert_eq!(
        junior.posted_at,
        Some(Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap())
    );
}

#[tokio::test]
async fn rss_fixture_respects_limit() {
    let adapter = RssFeedAdapter::from_fixture(WWR_XML, true);
    let items = adapter.search(&SearchQuery::new("engineer", None), 1).await;
    assert_eq!(items.len(), 1);
}

#[test]
fn greenhouse_content_is_unescaped_and_stripped() {
    let raw = greenhouse::parse_board(
        &std::fs::read_to_string("tests/fixtures/greenhouse_board.json").unwrap(),
        "acmelabs",
    )
    .unwrap();
    assert_eq!(raw.len(), 3);
    // company_name wins when present, board slug otherwise
    assert_eq!(raw[0].company, "Acme Labs");
    assert_eq!(raw[1].company, "Acmelabs");

    let postings = normalized(raw);
    assert_eq!(postings[0].description, "We are hiring new grads today.");
    assert_eq!(postings[1].location, "Remote");
    assert_eq!(
        postings[0].posted_at,
        Some(Utc.with_ymd_and_hms(2026, 10, 16, 14, 15, 0).unwrap())
    );
}

#[test]
fn lever_epoch_millis_and_salary_range() {
    let raw = lever::parse_postings(
        &std::fs::read_to_string("tests/fixtures/lever_postings.json").unwrap(),
        "initech",
    )
    .unwrap();
    let postings = normalized(raw);
    assert_eq!(postings.len(), 2);
    assert_eq!(postings[0].company, "Initech");
    assert_eq!(postings[0].salary_min, Some(95_000));
    assert_eq!(postings[0].salary_max, Some(115_000));
    assert_eq!(
        postings[0].posted_at,
        Some(Utc.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap())
    );
    assert!(postings[1].is_remote());
}

#[test]
fn ashby_compensation_summary_parses() {
    let raw = ashby::parse_response(
        &std::fs::read_to_string("tests/fixtures/ashby_board.json").unwrap(),
        "vandelay",
    )
    .unwrap();
    assert_eq!(raw[1].salary, RawSalary::None);
    let postings = normalized(raw);
    assert_eq!(postings[0].salary_min, Some(120_000));
    assert_eq!(postings[0].salary_max, Some(140_000));
    assert_eq!(postings[0].url, "https://jobs.ashbyhq.com/vandelay/5f0e8a1c-aaaa");
    assert!(postings[0].posted_at.is_none());
}

#[test]
fn adzuna_page_strips_title_markup() {
    let raw = adzuna::parse_page(
        &std::fs::read_to_string("tests/fixtures/adzuna_search.json").unwrap(),
    )
    .unwrap();
    let postings = normalized(raw);
    assert_eq!(postings[0].title, "Junior Software Engineer");
    assert_eq!(postings[0].company, "Umbrella Corp");
    assert_eq!(postings[0].salary_min, Some(82_000));
    assert!(postings[0].description.ends_with("internal tools…"));
    assert_eq!(postings[1].salary_min, None);
}

#[test]
fn remotive_salary_text_and_style_blocks() {
    let raw = remotive::parse_listing(
        &std::fs::read_to_string("tests/fixtures/remotive_jobs.json").unwrap(),
    )
    .unwrap();
    let postings = normalized(raw);
    assert_eq!(postings.len(), 2);
    assert!(postings.iter().all(|p| p.is_remote()));
    assert_eq!(postings[0].salary_min, Some(90_000));
    assert_eq!(postings[0].salary_max, Some(110_000));
    assert_eq!(postings[0].description, "Python & Rust.");
}

#[test]
fn html_board_cards_are_scraped() {
    let raw = html_board::parse_page(
        &std::fs::read_to_string("tests/fixtures/html_board.html").unwrap(),
        &ScrapeSelectors::default(),
        "https://www.simplyhired.com",
    )
    .unwrap();
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].url, "https://www.simplyhired.com/job/abc123?q=software");
    assert_eq!(raw[1].url, "https://elsewhere.example/job/9");

    let postings = normalized(raw);
    assert_eq!(postings[0].title, "Entry Level Software Engineer");
    assert_eq!(postings[0].company, "Vandelay Industries");
    assert_eq!(postings[0].salary_min, Some(85_000));
    assert_eq!(postings[0].salary_max, Some(95_000));
    assert_eq!(postings[0].posted_at, Some(now() - chrono::Duration::days(2)));
    assert_eq!(
        postings[1].posted_at,
        Some(Utc.with_ymd_and_hms(2026, 10, 12, 0, 0, 0).unwrap())
    );
}
