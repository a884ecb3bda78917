//! End-to-end scenario tests for the literal cases in the pipeline's
//! end-to-end scenario table (S4/S5/S6) — the cluster-algorithm scenarios
//! (S1-S3) are covered as unit tests inside `src/cluster/mod.rs`.

use async_trait::async_trait;
use kwcluster::core::types::{Cluster, Competition, Keyword, ScrapeStrategy};
use kwcluster::export;
use kwcluster::fetch::{FetchError, FetchOutcome, Fetcher, Strategy};
use kwcluster::rate_limit::{RateLimitOutcome, RateLimiter};
use kwcluster::scrape;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// S6 — Scrape fallback: browser strategy fails every attempt, http succeeds.
// ---------------------------------------------------------------------------

struct AlwaysFailsStrategy;

#[async_trait]
impl Strategy for AlwaysFailsStrategy {
    async fn fetch_once(&self, _url: &str, _timeout_ms: u64) -> Result<FetchOutcome, FetchError> {
        Err(FetchError::Unavailable("browser launch failed".into()))
    }
    fn name(&self) -> &'static str {
        "browser"
    }
}

struct StaticHtmlStrategy {
    html: String,
}

#[async_trait]
impl Strategy for StaticHtmlStrategy {
    async fn fetch_once(&self, url: &str, _timeout_ms: u64) -> Result<FetchOutcome, FetchError> {
        Ok(FetchOutcome { html: self.html.clone(), final_url: url.to_string(), status: 200 })
    }
    fn name(&self) -> &'static str {
        "http"
    }
}

#[tokio::test]
async fn s6_scrape_falls_back_from_browser_to_http() {
    let html = r#"
        <html>
            <head><title>Example Site</title><meta name="description" content="a usable site"></head>
            <body>
                <h1>Welcome to the example site</h1>
                <p>This paragraph has more than ten words so the extractor keeps it as content.</p>
            </body>
        </html>
    "#;

    let fetcher = Fetcher::with_strategies(
        Arc::new(StaticHtmlStrategy { html: html.to_string() }),
        Some(Arc::new(AlwaysFailsStrategy)),
        5_000,
    );

    let result = scrape::scrape(&fetcher, "https://example.com/", 1, false, ScrapeStrategy::Auto)
        .await
        .expect("scrape should succeed via http fallback");

    assert_eq!(result.strategy, "http");
    assert!(!result.pages.is_empty());
    assert!(result.pages[0].word_count > 0);
}

// ---------------------------------------------------------------------------
// S5 — Rate limit: 10 successful requests within the window, 11th rejected.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn s5_eleventh_request_in_window_is_rate_limited() {
    let limiter = RateLimiter::new(3600, 10);
    let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5));

    for _ in 0..10 {
        assert!(matches!(limiter.check(ip).await, RateLimitOutcome::Allowed));
    }

    match limiter.check(ip).await {
        RateLimitOutcome::Limited { retry_after_secs } => assert!(retry_after_secs > 0),
        RateLimitOutcome::Allowed => panic!("11th request within the window must be rejected"),
    }
}

// ---------------------------------------------------------------------------
// S4 — CSV export shape: two clusters (2 and 1 keywords) -> 1 header + 3 rows.
// ---------------------------------------------------------------------------

#[test]
fn s4_csv_export_has_one_header_and_one_row_per_keyword() {
    let cluster_a = Cluster::new(
        "seo services".into(),
        vec![
            Keyword { text: "seo services".into(), search_volume: 12_000, competition: Competition::High, cpc_low: 3.1, cpc_high: 5.0 },
            Keyword { text: "seo audit".into(), search_volume: 4_000, competition: Competition::Medium, cpc_low: 1.2, cpc_high: 2.0 },
        ],
        "hybrid",
    );
    let cluster_b = Cluster::new(
        "content marketing".into(),
        vec![Keyword { text: "content marketing".into(), search_volume: 7_000, competition: Competition::Medium, cpc_low: 0.8, cpc_high: 1.4 }],
        "hybrid",
    );

    let result = kwcluster::core::types::JobResult {
        keyword_count: 3,
        total_search_volume: cluster_a.total_search_volume + cluster_b.total_search_volume,
        clusters: vec![cluster_a, cluster_b],
    };

    let csv = export::to_csv(&result);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 4, "expected one header row plus three data rows");
    assert_eq!(
        lines[0],
        "Cluster ID,Pillar Topic,Keyword,Search Volume,Competition,CPC Low,CPC High,Cluster Value Score,Cluster Total Volume"
    );
    for row in &lines[1..] {
        let score_field = row.split(',').nth(7).unwrap();
        assert!(score_field.split('.').nth(1).map(|d| d.len() == 2).unwrap_or(false), "value score must have 2 decimals");
    }
}
