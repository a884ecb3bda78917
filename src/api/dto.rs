//! HTTP-facing request/response shapes (spec.md §6). Kept separate from the
//! internal `Job`/`Cluster` domain types so the wire format can camelCase
//! without leaking `internal` metadata.

use crate::core::types::{Cluster, Job, JobOptions, JobStatus, ScrapeStrategy, ClusterAlgorithm};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub url: String,
    pub country: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub language_label: Option<String>,
    #[serde(default)]
    pub options: Option<JobOptionsInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptionsInput {
    pub max_pages: Option<usize>,
    pub follow_links: Option<bool>,
    pub scrape_strategy: Option<String>,
    pub cluster_algorithm: Option<String>,
    pub min_cluster_size: Option<usize>,
    pub use_ai: Option<bool>,
}

impl JobOptionsInput {
    pub fn into_options(self) -> AppResult<JobOptions> {
        let defaults = JobOptions::default();

        let max_pages = self.max_pages.unwrap_or(defaults.max_pages).clamp(1, 100);

        let scrape_strategy = match self.scrape_strategy.as_deref() {
            None => defaults.scrape_strategy,
            Some("auto") => ScrapeStrategy::Auto,
            Some("browser") => ScrapeStrategy::Browser,
            Some("http") => ScrapeStrategy::Http,
            Some(other) => return Err(AppError::InvalidInput(format!("unknown scrapeStrategy: {other}"))),
        };

        let cluster_algorithm = match self.cluster_algorithm.as_deref() {
            None => defaults.cluster_algorithm,
            Some("kmeans") => ClusterAlgorithm::Kmeans,
            Some("dbscan") => ClusterAlgorithm::Dbscan,
            Some("semantic") => ClusterAlgorithm::Semantic,
            Some("hybrid") => ClusterAlgorithm::Hybrid,
            Some(other) => return Err(AppError::InvalidInput(format!("unknown clusterAlgorithm: {other}"))),
        };

        let min_cluster_size = self.min_cluster_size.unwrap_or(defaults.min_cluster_size).max(1);

        Ok(JobOptions {
            max_pages,
            follow_links: self.follow_links.unwrap_or(defaults.follow_links),
            scrape_strategy,
            cluster_algorithm,
            min_cluster_size,
            use_ai: self.use_ai.unwrap_or(defaults.use_ai),
        })
    }
}

/// Validate a job-creation request per spec.md §4.9: URL must parse with an
/// http(s) scheme; country must look like a numeric provider geo code.
pub fn validate_create_request(url: &str, country: &str) -> AppResult<url::Url> {
    let parsed = url::Url::parse(url).map_err(|e| AppError::InvalidInput(format!("invalid url: {e}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::InvalidInput("url must use http or https".into()));
    }
    if country.is_empty() || !country.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput("country must be a numeric geo code".into()));
    }
    Ok(parsed)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: uuid::Uuid,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: uuid::Uuid,
    pub url: String,
    pub country: String,
    pub requested_language: Option<String>,
    pub resolved_language: String,
    pub options: JobOptions,
    pub status: JobStatus,
    pub progress: u8,
    pub step: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub failed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub clusters: Option<Vec<Cluster>>,
    pub keyword_count: Option<usize>,
    pub total_search_volume: Option<u64>,
    pub processing_time_ms: Option<u64>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            url: job.url.clone(),
            country: job.country.clone(),
            requested_language: job.requested_language.clone(),
            resolved_language: job.resolved_language.clone(),
            options: job.options.clone(),
            status: job.status,
            progress: job.progress,
            step: job.step.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
            failed_at: job.failed_at,
            error: job.error.clone(),
            warnings: job.warnings.clone(),
            clusters: job.data.as_ref().map(|d| d.clusters.clone()),
            keyword_count: job.data.as_ref().map(|d| d.keyword_count),
            total_search_volume: job.data.as_ref().map(|d| d.total_search_volume),
            processing_time_ms: job.processing_time_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub job_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDto {
    pub code: &'static str,
    pub name: &'static str,
    pub default_language: &'static str,
    pub currency: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthServices {
    pub metrics: bool,
    pub ai: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: u64,
    pub services: HealthServices,
}
