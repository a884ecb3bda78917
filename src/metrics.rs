//! MetricsClient (spec.md §4.6): batches seed keywords to the remote metrics
//! service and normalizes the response, grounded in the teacher's batched
//! remote-call pattern in `tools/deep_research.rs`.

use crate::core::types::{Competition, Keyword};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const BATCH_SIZE: usize = 50;
const METRICS_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics request failed: {0}")]
    Request(String),
    #[error("metrics service reported failure: {0}")]
    ServiceError(String),
}

#[async_trait]
pub trait MetricsClient: Send + Sync {
    async fn fetch_metrics(
        &self,
        seeds: &[String],
        country: &str,
        language: &str,
        min_search_volume: u64,
        max_keywords: usize,
    ) -> Result<Vec<Keyword>, MetricsError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsResponse {
    success: bool,
    #[serde(default)]
    keywords: Vec<MetricsKeywordWire>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsKeywordWire {
    keyword: String,
    search_volume: u64,
    competition: String,
    cpc: f64,
    #[serde(default)]
    cpc_high: Option<f64>,
}

/// Used when no metrics service is configured. Spec.md §9: no local mock
/// generation in the production path, so this fails rather than fabricates.
pub struct NullMetricsClient;

#[async_trait]
impl MetricsClient for NullMetricsClient {
    async fn fetch_metrics(
        &self,
        _seeds: &[String],
        _country: &str,
        _language: &str,
        _min_search_volume: u64,
        _max_keywords: usize,
    ) -> Result<Vec<Keyword>, MetricsError> {
        Err(MetricsError::ServiceError("metrics service not configured".into()))
    }
}

/// HTTP-backed client talking to `service_url` (spec.md §6 remote collaborator
/// contract): POST `{keywords, country, language}` -> `{success, keywords[]}`.
pub struct HttpMetricsClient {
    client: reqwest::Client,
    service_url: String,
    api_key: Option<String>,
}

impl HttpMetricsClient {
    pub fn new(service_url: String, api_key: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), service_url, api_key }
    }

    async fn fetch_batch(&self, batch: &[String], country: &str, language: &str) -> Result<Vec<Keyword>, MetricsError> {
        let mut request = self
            .client
            .post(&self.service_url)
            .timeout(Duration::from_secs(METRICS_TIMEOUT_SECS))
            .json(&serde_json::json!({
                "keywords": batch,
                "country": country,
                "language": language,
            }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| MetricsError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(MetricsError::Request(format!("status {}", response.status())));
        }

        let parsed: MetricsResponse = response.json().await.map_err(|e| MetricsError::Request(e.to_string()))?;
        if !parsed.success {
            return Err(MetricsError::ServiceError(parsed.error.unwrap_or_else(|| "unknown error".into())));
        }

        Ok(parsed
            .keywords
            .into_iter()
            .map(|k| Keyword {
                text: k.keyword,
                search_volume: k.search_volume,
                competition: Competition::parse(&k.competition),
                cpc_low: k.cpc / 1_000_000.0,
                cpc_high: k.cpc_high.unwrap_or(k.cpc) / 1_000_000.0,
            })
            .collect())
    }
}

#[async_trait]
impl MetricsClient for HttpMetricsClient {
    async fn fetch_metrics(
        &self,
        seeds: &[String],
        country: &str,
        language: &str,
        min_search_volume: u64,
        max_keywords: usize,
    ) -> Result<Vec<Keyword>, MetricsError> {
        let mut all = Vec::new();
        for batch in seeds.chunks(BATCH_SIZE) {
            let mut result = self.fetch_batch(batch, country, language).await?;
            all.append(&mut result);
        }

        all.retain(|k| k.search_volume >= min_search_volume);
        all.truncate(max_keywords);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpc_micros_converted_to_units() {
        let wire = MetricsKeywordWire {
            keyword: "seo".into(),
            search_volume: 100,
            competition: "High".into(),
            cpc: 1_500_000.0,
            cpc_high: None,
        };
        let kw = Keyword {
            text: wire.keyword,
            search_volume: wire.search_volume,
            competition: Competition::parse(&wire.competition),
            cpc_low: wire.cpc / 1_000_000.0,
            cpc_high: wire.cpc_high.unwrap_or(wire.cpc) / 1_000_000.0,
        };
        assert!((kw.cpc_low - 1.5).abs() < 1e-9);
        assert_eq!(kw.competition, Competition::High);
    }
}
