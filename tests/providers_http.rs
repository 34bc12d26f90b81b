// tests/providers_http.rs
// Adapters over real HTTP against a local responder: request shape, status
// handling, credential short-circuit.

mod common;

use std::time::Duration;

use common::{fixture, serve};
use job_scout::ingest::config::{
    AdzunaConfig, BoardConfig, HtmlBoardConfig, RemotiveConfig, RssConfig,
};
use job_scout::ingest::providers::adzuna::AdzunaAdapter;
use job_scout::ingest::providers::ashby::AshbyAdapter;
use job_scout::ingest::providers::greenhouse::GreenhouseAdapter;
use job_scout::ingest::providers::html_board::HtmlBoardAdapter;
use job_scout::ingest::providers::lever::LeverAdapter;
use job_scout::ingest::providers::remotive::RemotiveAdapter;
use job_scout::ingest::providers::rss_feed::RssFeedAdapter;
use job_scout::ingest::{SourceAdapter, SourceError};
use job_scout::SearchQuery;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn remotive_sends_search_and_limit() {
    let srv = serve(200, "application/json", fixture("remotive_jobs.json")).await;
    let adapter = RemotiveAdapter::from_config(
        &RemotiveConfig {
            base_url: format!("{}/api/remote-jobs", srv.base),
            ..Default::default()
        },
        client(),
    );
    let jobs = adapter
        .fetch(&SearchQuery::new("backend engineer", None), 1)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    let lines = srv.request_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("GET /api/remote-jobs?"));
    assert!(lines[0].contains("search=backend+engineer"));
    assert!(lines[0].contains("limit=1"));
}

#[tokio::test]
async fn non_2xx_is_status_error_and_search_degrades_to_empty() {
    let srv = serve(503, "text/plain", "down".to_string()).await;
    let adapter = RemotiveAdapter::from_config(
        &RemotiveConfig {
            base_url: srv.base.clone(),
            ..Default::default()
        },
        client(),
    );
    let q = SearchQuery::new("rust", None);
    assert!(matches!(
        adapter.fetch(&q, 5).await,
        Err(SourceError::Status(503))
    ));
    assert!(adapter.search(&q, 5).await.is_empty());
}

#[tokio::test]
async fn malformed_body_is_malformed_error() {
    let srv = serve(200, "application/json", "{not json".to_string()).await;
    let adapter = GreenhouseAdapter::from_config(
        &BoardConfig {
            base_url: Some(srv.base.clone()),
            boards: vec!["acmelabs".into()],
            ..Default::default()
        },
        client(),
    );
    let err = adapter
        .fetch(&SearchQuery::new("engineer", None), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Malformed(_)));
}

#[tokio::test]
async fn adzuna_without_credentials_makes_no_request() {
    let srv = serve(200, "application/json", fixture("adzuna_search.json")).await;
    let adapter = AdzunaAdapter::from_config(
        &AdzunaConfig {
            base_url: srv.base.clone(),
            app_id: "".into(),
            app_key: "".into(),
            ..Default::default()
        },
        client(),
    );
    // Empty literal falls back to env; the test env must not carry real keys.
    if std::env::var("ADZUNA_APP_ID").is_ok() && std::env::var("ADZUNA_APP_KEY").is_ok() {
        return;
    }
    let jobs = adapter.search(&SearchQuery::new("rust", None), 5).await;
    assert!(jobs.is_empty());
    assert!(srv.request_lines().is_empty());
}

#[tokio::test]
async fn adzuna_with_literal_credentials_hits_search_page() {
    let srv = serve(200, "application/json", fixture("adzuna_search.json")).await;
    let adapter = AdzunaAdapter::from_config(
        &AdzunaConfig {
            base_url: format!("{}/v1/api/jobs", srv.base),
            country: "us".into(),
            app_id: "id-123".into(),
            app_key: "key-456".into(),
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    let jobs = adapter
        .fetch(
            &SearchQuery::new("software engineer", Some("Boston, MA".into())),
            2,
        )
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);
    let lines = srv.request_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("GET /v1/api/jobs/us/search/1?"));
    assert!(lines[0].contains("app_id=id-123"));
    assert!(lines[0].contains("what=software+engineer"));
    assert!(lines[0].contains("where=Boston%2C+MA"));
    assert!(lines[0].contains("results_per_page=2"));
}

#[tokio::test]
async fn adzuna_pages_until_limit() {
    let srv = serve(200, "application/json", fixture("adzuna_search.json")).await;
    let adapter = AdzunaAdapter::from_config(
        &AdzunaConfig {
            base_url: srv.base.clone(),
            app_id: "id".into(),
            app_key: "key".into(),
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    // Each page asks for 3 and gets 2 back: a short page ends paging.
    let jobs = adapter
        .fetch(&SearchQuery::new("engineer", None), 3)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(srv.request_lines().len(), 1);
}

#[tokio::test]
async fn lever_filters_board_by_title_words() {
    let srv = serve(200, "application/json", fixture("lever_postings.json")).await;
    let adapter = LeverAdapter::from_config(
        &BoardConfig {
            base_url: Some(format!("{}/v0/postings", srv.base)),
            boards: vec!["initech".into()],
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    let jobs = adapter
        .fetch(&SearchQuery::new("associate engineer", None), 10)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, "Associate Software Engineer");
    assert!(srv.request_lines()[0].starts_with("GET /v0/postings/initech?mode=json"));
}

#[tokio::test]
async fn greenhouse_queries_every_board_until_limit() {
    let srv = serve(200, "application/json", fixture("greenhouse_board.json")).await;
    let adapter = GreenhouseAdapter::from_config(
        &BoardConfig {
            base_url: Some(srv.base.clone()),
            boards: vec!["one".into(), "two".into()],
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    let jobs = adapter
        .fetch(&SearchQuery::new("software engineer", None), 10)
        .await
        .unwrap();
    // two matching titles per board
    assert_eq!(jobs.len(), 4);
    let lines = srv.request_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l.starts_with("GET /one/jobs?content=true")));
}

#[tokio::test]
async fn board_download_is_reused_across_queries() {
    let srv = serve(200, "application/json", fixture("greenhouse_board.json")).await;
    let adapter = GreenhouseAdapter::from_config(
        &BoardConfig {
            base_url: Some(srv.base.clone()),
            boards: vec!["one".into(), "two".into()],
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    let first = adapter
        .fetch(&SearchQuery::new("software engineer", None), 10)
        .await
        .unwrap();
    let second = adapter
        .fetch(&SearchQuery::new("new grad", None), 10)
        .await
        .unwrap();
    assert_eq!(first.len(), 4);
    assert!(!second.is_empty());
    assert_eq!(srv.request_lines().len(), 2);
}

#[tokio::test]
async fn zero_cache_ttl_downloads_every_time() {
    let srv = serve(200, "application/json", fixture("lever_postings.json")).await;
    let adapter = LeverAdapter::from_config(
        &BoardConfig {
            base_url: Some(srv.base.clone()),
            boards: vec!["initech".into()],
            delay_ms: 0,
            cache_ttl_secs: 0,
            ..Default::default()
        },
        client(),
    );
    let q = SearchQuery::new("engineer", None);
    adapter.fetch(&q, 10).await.unwrap();
    adapter.fetch(&q, 10).await.unwrap();
    assert_eq!(srv.request_lines().len(), 2);
}

#[tokio::test]
async fn failed_feed_is_not_cached() {
    let srv = serve(503, "text/plain", "down".to_string()).await;
    let adapter = RssFeedAdapter::from_config(
        &RssConfig {
            feeds: vec![srv.base.clone()],
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    let q = SearchQuery::new("engineer", None);
    assert!(adapter.fetch(&q, 10).await.is_err());
    assert!(adapter.fetch(&q, 10).await.is_err());
    assert_eq!(srv.request_lines().len(), 2);
}

#[tokio::test]
async fn ashby_posts_graphql() {
    let srv = serve(200, "application/json", fixture("ashby_board.json")).await;
    let adapter = AshbyAdapter::from_config(
        &BoardConfig {
            base_url: Some(format!("{}/api/non-user-graphql", srv.base)),
            boards: vec!["vandelay".into()],
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    let jobs = adapter
        .fetch(&SearchQuery::new("software engineer", None), 10)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(srv.request_lines()[0]
        .starts_with("POST /api/non-user-graphql?op=ApiJobBoardWithTeams"));
}

#[tokio::test]
async fn rss_over_http_keeps_working_feed_when_one_fails() {
    let good = serve(200, "application/rss+xml", fixture("wwr_programming.xml")).await;
    let bad = serve(500, "text/plain", "boom".to_string()).await;
    let adapter = RssFeedAdapter::from_config(
        &RssConfig {
            feeds: vec![bad.base.clone(), good.base.clone()],
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    let jobs = adapter
        .fetch(&SearchQuery::new("junior", None), 10)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].company, "Acme Robotics");
}

#[tokio::test]
async fn html_board_fills_url_template() {
    let srv = serve(200, "text/html", fixture("html_board.html")).await;
    let adapter = HtmlBoardAdapter::from_config(
        &HtmlBoardConfig {
            enabled: true,
            url_template: format!("{}/search?q={{query}}&l={{location}}", srv.base),
            link_base: "https://board.example".into(),
            delay_ms: 0,
            ..Default::default()
        },
        client(),
    );
    assert!(adapter.best_effort());
    let jobs = adapter
        .fetch(
            &SearchQuery::new("software engineer", Some("Chicago, IL".into())),
            10,
        )
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].url, "https://board.example/job/abc123?q=software");
    assert_eq!(
        srv.request_lines()[0],
        "GET /search?q=software+engineer&l=Chicago%2C+IL HTTP/1.1"
    );
}

#[test]
fn scraper_flag_comes_from_config() {
    let adapter = HtmlBoardAdapter::from_config(
        &HtmlBoardConfig {
            best_effort: false,
            ..Default::default()
        },
        client(),
    );
    assert!(!adapter.best_effort());
}
