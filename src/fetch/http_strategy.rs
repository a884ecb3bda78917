use super::{FetchError, FetchOutcome, Strategy, DESKTOP_CHROME_UA};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Plain HTTP GET strategy (spec.md §4.2): follows up to 5 redirects, accepts
/// gzip, carries a desktop-Chrome User-Agent; status >= 400 is an error.
pub struct HttpStrategy {
    client: Client,
}

impl HttpStrategy {
    pub fn new() -> Self {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .gzip(true)
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }
}

impl Default for HttpStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Strategy for HttpStrategy {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_once(&self, url: &str, timeout_ms: u64) -> Result<FetchOutcome, FetchError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", DESKTOP_CHROME_UA)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        if status >= 400 {
            return Err(FetchError::HttpStatus { status, url: url.to_string() });
        }

        let html = response.text().await.map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(FetchOutcome { html, final_url, status })
    }
}
