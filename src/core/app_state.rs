use crate::ai::{AiEnhancer, NullAiEnhancer, OpenAiEnhancer};
use crate::core::config::{load_file_config, PipelineConfig};
use crate::fetch::Fetcher;
use crate::metrics::{HttpMetricsClient, MetricsClient, NullMetricsClient};
use crate::orchestrator::Orchestrator;
use crate::rate_limit::RateLimiter;
use crate::store::JobStore;
use std::sync::Arc;
use std::time::Instant;

/// Process-wide shared state (spec.md §5 "Shared-resource policy"): one
/// `JobStore`, one rate limiter, and the three pluggable collaborators
/// (fetcher, metrics, AI), each constructed once at startup and handed to
/// every request via axum's `State` extractor.
pub struct AppState {
    pub store: JobStore,
    pub orchestrator: Arc<Orchestrator>,
    pub rate_limiter: Arc<RateLimiter>,
    pub ai: Arc<dyn AiEnhancer>,
    pub metrics_configured: bool,
    started_at: Instant,
}

impl AppState {
    pub async fn new() -> Self {
        let file_config = load_file_config();
        let pipeline_config = Arc::new(PipelineConfig::default());

        let fetcher = Arc::new(Fetcher::new(pipeline_config.scraper_timeout_ms).await);

        let metrics_configured = file_config.metrics.resolve_service_url().is_some();
        let metrics: Arc<dyn MetricsClient> = match file_config.metrics.resolve_service_url() {
            Some(url) => Arc::new(HttpMetricsClient::new(url, file_config.metrics.resolve_api_key())),
            None => {
                tracing::warn!("no metrics service configured — research jobs will fail at the enriching stage");
                Arc::new(NullMetricsClient)
            }
        };

        let ai: Arc<dyn AiEnhancer> = if file_config.ai.resolve_enabled() {
            Arc::new(OpenAiEnhancer::new(
                file_config.ai.resolve_base_url(),
                file_config.ai.resolve_api_key(),
                file_config.ai.resolve_model(),
                file_config.ai.resolve_timeout_secs(),
            ))
        } else {
            Arc::new(NullAiEnhancer)
        };

        let orchestrator = Arc::new(Orchestrator::new(fetcher, metrics, ai.clone(), pipeline_config.clone()));

        let store = JobStore::new(pipeline_config.job_retention_hours);
        store.spawn_periodic_sweep();

        let rate_limiter = Arc::new(RateLimiter::new(pipeline_config.rate_limit_window_secs, pipeline_config.rate_limit_max_requests));

        Self { store, orchestrator, rate_limiter, ai, metrics_configured, started_at: Instant::now() }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
