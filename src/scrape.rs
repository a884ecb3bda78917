//! Same-origin crawl (spec.md §4.4), grounded in the teacher's `crawl.rs` BFS
//! frontier but trimmed to the pipeline's single linear pass.

use crate::core::types::{PageContent, ScrapeResult, ScrapeStrategy};
use crate::extract;
use crate::fetch::{FetchError, Fetcher};
use chrono::Utc;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid start url: {0}")]
    InvalidUrl(String),
    #[error("all scraping strategies failed")]
    AllStrategiesFailed,
}

fn canonicalize(url: &Url) -> String {
    let mut u = url.clone();
    u.set_fragment(None);
    let mut s = u.to_string();
    if s.ends_with('/') && u.path() == "/" {
        // keep bare-origin slash so the start URL still canonicalizes to itself
    } else if s.ends_with('/') {
        s.pop();
    }
    s
}

fn same_hostname(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str()
}

/// Crawl same-origin pages starting at `start_url`, per spec.md §4.4.
pub async fn scrape(
    fetcher: &Fetcher,
    start_url: &str,
    max_pages: usize,
    follow_links: bool,
    strategy: ScrapeStrategy,
) -> Result<ScrapeResult, ScrapeError> {
    let parsed_start = Url::parse(start_url).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;
    let max_pages = max_pages.max(1);

    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier: Vec<String> = vec![canonicalize(&parsed_start)];
    let mut pages: Vec<PageContent> = Vec::new();
    let mut first_strategy: Option<String> = None;
    let mut frontier_seen: HashSet<String> = frontier.iter().cloned().collect();

    while visited.len() < max_pages && !frontier.is_empty() {
        let current = frontier.remove(0);
        if visited.contains(&current) {
            continue;
        }
        visited.insert(current.clone());

        let outcome = match fetcher.fetch(&current, strategy, 1).await {
            Ok(outcome) => outcome,
            Err(FetchError::HttpStatus { .. }) | Err(FetchError::Request(_)) | Err(FetchError::Unavailable(_)) => {
                continue;
            }
        };

        let page = extract::extract(&outcome.html, &outcome.final_url);
        if page.word_count == 0 {
            continue;
        }

        let is_first_success = pages.is_empty();
        if is_first_success {
            first_strategy = Some(outcome_strategy_name(fetcher, strategy));
            if follow_links {
                if let Ok(base) = Url::parse(&outcome.final_url) {
                    let discovered = discover_links(&outcome.html, &base, &parsed_start, max_pages.saturating_sub(1));
                    for link in discovered {
                        if !visited.contains(&link) && frontier_seen.insert(link.clone()) {
                            frontier.push(link);
                        }
                    }
                }
            }
        }

        pages.push(page);
    }

    if pages.is_empty() {
        return Err(ScrapeError::AllStrategiesFailed);
    }

    let total_words = pages.iter().map(|p| p.word_count).sum();
    Ok(ScrapeResult {
        pages,
        total_words,
        strategy: first_strategy.unwrap_or_else(|| "http".to_string()),
        timestamp: Utc::now(),
    })
}

fn outcome_strategy_name(fetcher: &Fetcher, requested: ScrapeStrategy) -> String {
    match requested {
        ScrapeStrategy::Http => "http".to_string(),
        ScrapeStrategy::Browser => "browser".to_string(),
        ScrapeStrategy::Auto => {
            if fetcher.browser_available() {
                "browser".to_string()
            } else {
                "http".to_string()
            }
        }
    }
}

fn discover_links(html: &str, base: &Url, start: &Url, limit: usize) -> Vec<String> {
    use scraper::{Html, Selector};
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for el in doc.select(&sel) {
        if out.len() >= limit {
            break;
        }
        let Some(href) = el.value().attr("href") else { continue };
        let Ok(resolved) = base.join(href) else { continue };
        if !same_hostname(&resolved, start) {
            continue;
        }
        let canon = canonicalize(&resolved);
        if seen.insert(canon.clone()) {
            out.push(canon);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_fragment_and_trailing_slash() {
        let u = Url::parse("https://example.com/about/#section").unwrap();
        assert_eq!(canonicalize(&u), "https://example.com/about");
    }

    #[test]
    fn canonicalize_keeps_bare_root_slash() {
        let u = Url::parse("https://example.com/").unwrap();
        assert_eq!(canonicalize(&u), "https://example.com/");
    }

    #[test]
    fn discover_links_filters_cross_origin_and_caps_count() {
        let html = r#"<html><body>
            <a href="/a">A</a>
            <a href="/b">B</a>
            <a href="https://other.test/c">C</a>
        </body></html>"#;
        let base = Url::parse("https://example.com").unwrap();
        let links = discover_links(html, &base, &base, 1);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0], "https://example.com/a");
    }
}
