//! Strategy-plural fetcher (spec.md §4.2): a `browser` strategy (feature-gated,
//! headless-capable) and an `http` strategy, selected directly or via `auto`
//! (browser first, then http), each retried up to `attempts` times with an
//! exponential-ish backoff, grounded in the teacher's `RustScraper`/antibot
//! retry-and-rotate pattern.

mod browser_strategy;
mod http_strategy;

pub use browser_strategy::BrowserStrategy;
pub use http_strategy::HttpStrategy;

use crate::core::types::ScrapeStrategy;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DESKTOP_CHROME_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub html: String,
    pub final_url: String,
    pub status: u16,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("strategy unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Strategy: Send + Sync {
    async fn fetch_once(&self, url: &str, timeout_ms: u64) -> Result<FetchOutcome, FetchError>;
    fn name(&self) -> &'static str;
}

/// Owns both strategies and drives attempts/fallback per spec.md §4.2.
pub struct Fetcher {
    http: Arc<dyn Strategy>,
    browser: Option<Arc<dyn Strategy>>,
    timeout_ms: u64,
}

impl Fetcher {
    pub async fn new(timeout_ms: u64) -> Self {
        Self {
            http: Arc::new(HttpStrategy::new()),
            browser: BrowserStrategy::new_if_available().await,
            timeout_ms,
        }
    }

    /// Constructs a `Fetcher` over explicit strategies, bypassing strategy
    /// discovery. Used to exercise fallback behavior with fakes.
    pub fn with_strategies(http: Arc<dyn Strategy>, browser: Option<Arc<dyn Strategy>>, timeout_ms: u64) -> Self {
        Self { http, browser, timeout_ms }
    }

    pub fn browser_available(&self) -> bool {
        self.browser.is_some()
    }

    /// `fetch(url, strategy, attempts) -> {html, finalUrl} | error` (spec.md §4.2).
    pub async fn fetch(
        &self,
        url: &str,
        strategy: ScrapeStrategy,
        attempts: u32,
    ) -> Result<FetchOutcome, FetchError> {
        match strategy {
            ScrapeStrategy::Http => self.try_strategy(self.http.as_ref(), url, attempts).await,
            ScrapeStrategy::Browser => match &self.browser {
                Some(b) => self.try_strategy(b.as_ref(), url, attempts).await,
                None => Err(FetchError::Unavailable("browser strategy not available".into())),
            },
            ScrapeStrategy::Auto => {
                if let Some(browser) = &self.browser {
                    if let Ok(outcome) = self.try_strategy(browser.as_ref(), url, attempts).await {
                        return Ok(outcome);
                    }
                    tracing::warn!(url, "browser strategy exhausted, falling back to http");
                }
                self.try_strategy(self.http.as_ref(), url, attempts).await
            }
        }
    }

    async fn try_strategy(
        &self,
        strategy: &dyn Strategy,
        url: &str,
        attempts: u32,
    ) -> Result<FetchOutcome, FetchError> {
        let attempts = attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match strategy.fetch_once(url, self.timeout_ms).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => {
                    tracing::warn!(strategy = strategy.name(), attempt, url, error = %err, "fetch attempt failed");
                    last_err = Some(err);
                    if attempt < attempts {
                        let delay = Duration::from_millis(200u64.saturating_mul(attempt as u64));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| FetchError::Unavailable("no attempts made".into())))
    }
}
