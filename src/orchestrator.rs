//! Orchestrator (spec.md §4.9): drives one job through the pipeline's strictly
//! sequential stages, checking for cancellation at each stage boundary and
//! converting per-stage failures into a failed job rather than propagating a
//! process-level error — grounded in the teacher's `deep_research` tool's
//! staged-pipeline control flow.

use crate::ai::{AiEnhancer, ClusterEnhancement, RegroupSuggestions, ScrutinizeSuggestions, SiteContext};
use crate::cluster;
use crate::core::config::PipelineConfig;
use crate::core::types::{
    Cluster, JobResult, STEP_CLUSTERING, STEP_ENRICHING, STEP_EXTRACTING, STEP_FINALIZING, STEP_SCANNING,
};
use crate::error::AppError;
use crate::fetch::Fetcher;
use crate::metrics::MetricsClient;
use crate::scrape;
use crate::seeds;
use crate::store::JobStore;
use std::sync::Arc;
use uuid::Uuid;

pub struct Orchestrator {
    fetcher: Arc<Fetcher>,
    metrics: Arc<dyn MetricsClient>,
    ai: Arc<dyn AiEnhancer>,
    config: Arc<PipelineConfig>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<Fetcher>,
        metrics: Arc<dyn MetricsClient>,
        ai: Arc<dyn AiEnhancer>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self { fetcher, metrics, ai, config }
    }

    /// Runs the full pipeline for `job_id`, writing progress and the terminal
    /// result (or failure) back into `store`. Intended to be spawned as a
    /// background task immediately after job creation.
    pub async fn run(&self, store: JobStore, job_id: Uuid) {
        let _ = self.execute(&store, job_id).await;
    }

    async fn execute(&self, store: &JobStore, job_id: Uuid) -> Result<(), ()> {
        let Some(job) = store.get(job_id).await else {
            return Err(());
        };

        store.update(job_id, |j| j.set_progress(10, STEP_SCANNING)).await;

        let scrape_result = match scrape::scrape(
            &self.fetcher,
            &job.url,
            job.options.max_pages,
            job.options.follow_links,
            job.options.scrape_strategy,
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                let err = AppError::Unreachable(format!("no accessible URL: {e}"));
                store.update(job_id, |j| j.mark_failed(err.stage_label(), err.to_string())).await;
                return Err(());
            }
        };

        if cancelled(store, job_id).await {
            return Err(());
        }

        store
            .update(job_id, |j| {
                j.internal.scrape = Some(scrape_result.clone());
                j.set_progress(30, STEP_EXTRACTING);
            })
            .await;

        let seeds = seeds::generate_seed_keywords(
            self.ai.as_ref(),
            &scrape_result,
            &job.resolved_language,
            self.config.max_keywords,
        )
        .await;
        if seeds.is_empty() {
            let err = AppError::NoSeeds;
            store.update(job_id, |j| j.mark_failed(err.stage_label(), err.to_string())).await;
            return Err(());
        }

        if cancelled(store, job_id).await {
            return Err(());
        }

        store.update(job_id, |j| j.set_progress(50, STEP_ENRICHING)).await;

        let keywords = match self
            .metrics
            .fetch_metrics(&seeds, &job.country, &job.resolved_language, self.config.min_search_volume, self.config.max_keywords)
            .await
        {
            Ok(k) if !k.is_empty() => k,
            Ok(_) => {
                let err = AppError::NoMetrics;
                store.update(job_id, |j| j.mark_failed(err.stage_label(), err.to_string())).await;
                return Err(());
            }
            Err(e) => {
                let err = AppError::NoMetrics;
                store
                    .update(job_id, |j| j.mark_failed(err.stage_label(), format!("metrics service error: {e}")))
                    .await;
                return Err(());
            }
        };

        if cancelled(store, job_id).await {
            return Err(());
        }

        store
            .update(job_id, |j| {
                j.internal.keywords = keywords.clone();
                j.set_progress(70, STEP_CLUSTERING);
            })
            .await;

        let mut clusters = cluster::cluster_keywords(keywords.clone(), job.options.cluster_algorithm, job.options.min_cluster_size);
        if clusters.is_empty() {
            let err = AppError::ClusterEmpty;
            store.update(job_id, |j| j.mark_failed(err.stage_label(), err.to_string())).await;
            return Err(());
        }

        let site_context = SiteContext {
            url: job.url.clone(),
            title: scrape_result.pages.first().map(|p| p.title.clone()).unwrap_or_default(),
            description: scrape_result.pages.first().map(|p| p.meta_description.clone()).unwrap_or_default(),
        };

        let mut context_parts: Vec<String> = vec![job.url.clone(), site_context.title.clone(), site_context.description.clone()];
        for page in scrape_result.pages.iter().take(5) {
            context_parts.push(page.title.clone());
            context_parts.push(page.meta_description.clone());
            context_parts.extend(page.headings.iter_all().map(|s| s.to_string()));
        }
        let context_refs: Vec<&str> = context_parts.iter().map(|s| s.as_str()).collect();
        let relevance_context = cluster::RelevanceContext::build(&context_refs);

        clusters = cluster::apply_relevance_scores(clusters, &relevance_context, job.options.min_cluster_size);
        if clusters.is_empty() {
            let err = AppError::ClusterEmpty;
            store.update(job_id, |j| j.mark_failed(err.stage_label(), err.to_string())).await;
            return Err(());
        }

        if cancelled(store, job_id).await {
            return Err(());
        }

        if job.options.use_ai && self.ai.is_available() {
            self.run_ai_enhancement(store, job_id, &mut clusters, &keywords, &site_context, &job.resolved_language, job.options.min_cluster_size)
                .await;
        } else {
            fill_deterministic_narratives(&mut clusters, &site_context);
        }

        if cancelled(store, job_id).await {
            return Err(());
        }

        store.update(job_id, |j| j.set_progress(90, STEP_FINALIZING)).await;

        let clusters = cluster::sort_and_rank_clusters(clusters);
        let keyword_count = clusters.iter().map(|c| c.keyword_count()).sum();
        let total_search_volume = clusters.iter().map(|c| c.total_search_volume).sum();
        let result = JobResult { clusters, keyword_count, total_search_volume };

        store.update(job_id, |j| j.mark_completed(result)).await;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_ai_enhancement(
        &self,
        store: &JobStore,
        job_id: Uuid,
        clusters: &mut Vec<Cluster>,
        keywords: &[crate::core::types::Keyword],
        context: &SiteContext,
        language: &str,
        min_cluster_size: usize,
    ) {
        match self.ai.regroup_suggestions(clusters, context, keywords, language).await {
            Ok(suggestions) => apply_regroup(clusters, suggestions),
            Err(e) => {
                let err = AppError::AiUnavailable(format!("regroup: {e}"));
                store.update(job_id, |j| j.push_warning(err.to_string())).await;
            }
        }

        match self.ai.scrutinize(clusters, keywords, context, language).await {
            Ok(suggestions) => *clusters = apply_scrutinize(std::mem::take(clusters), suggestions),
            Err(e) => {
                let err = AppError::AiUnavailable(format!("scrutinize: {e}"));
                store.update(job_id, |j| j.push_warning(err.to_string())).await;
            }
        }

        *clusters = cluster::ensure_unique_keywords(std::mem::take(clusters), min_cluster_size);

        for c in clusters.iter_mut() {
            match self.ai.enhance_cluster(c, context, language).await {
                Ok(enhancement) => apply_enhancement(c, enhancement),
                Err(e) => {
                    let pillar = c.pillar_topic.clone();
                    let err = AppError::AiUnavailable(format!("enhance \"{pillar}\": {e}"));
                    store.update(job_id, |j| j.push_warning(err.to_string())).await;
                }
            }
            if c.ai_description.is_none() || c.ai_content_strategy.is_none() {
                let (desc, strategy) = crate::ai::deterministic_narrative(c, context);
                c.ai_description.get_or_insert(desc);
                c.ai_content_strategy.get_or_insert(strategy);
            }
        }
    }
}

async fn cancelled(store: &JobStore, job_id: Uuid) -> bool {
    store.get(job_id).await.is_none()
}

fn fill_deterministic_narratives(clusters: &mut [Cluster], context: &SiteContext) {
    for cluster in clusters.iter_mut() {
        let (description, strategy) = crate::ai::deterministic_narrative(cluster, context);
        cluster.ai_description = Some(description);
        cluster.ai_content_strategy = Some(strategy);
    }
}

fn apply_enhancement(cluster: &mut Cluster, enhancement: ClusterEnhancement) {
    if let Some(pillar) = enhancement.pillar_topic {
        if !pillar.trim().is_empty() {
            cluster.pillar_topic = pillar;
        }
    }
    cluster.ai_description = enhancement.description;
    cluster.ai_content_strategy = enhancement.content_strategy;
}

/// §4.8 item 2: apply per-cluster renames and priority flags.
fn apply_regroup(clusters: &mut [Cluster], suggestions: RegroupSuggestions) {
    for (index, name) in suggestions.renames {
        if let Some(cluster) = clusters.get_mut(index) {
            if !name.trim().is_empty() {
                cluster.pillar_topic = name;
            }
        }
    }
    for index in suggestions.priority_indices {
        if let Some(cluster) = clusters.get_mut(index) {
            cluster.ai_priority = Some(true);
        }
    }
}

/// §4.8 item 3: renames, then merges, then individual reassignments, then
/// drop any cluster left with zero keywords.
fn apply_scrutinize(mut clusters: Vec<Cluster>, suggestions: ScrutinizeSuggestions) -> Vec<Cluster> {
    for (cluster_id, name) in suggestions.renames {
        if let Some(cluster) = clusters.iter_mut().find(|c| c.id == cluster_id) {
            if !name.trim().is_empty() {
                cluster.pillar_topic = name;
            }
        }
    }

    for (a, b) in suggestions.merges {
        let Some(b_pos) = clusters.iter().position(|c| c.id == b) else { continue };
        let Some(a_pos) = clusters.iter().position(|c| c.id == a) else { continue };
        if a_pos == b_pos {
            continue;
        }
        let absorbed = clusters.remove(b_pos);
        let a_pos = clusters.iter().position(|c| c.id == a).unwrap_or(a_pos);
        clusters[a_pos].keywords.extend(absorbed.keywords);
    }

    for (keyword_text, target_id) in suggestions.reassignments {
        let canonical = keyword_text.trim().to_lowercase();
        let mut moved = None;
        for cluster in clusters.iter_mut() {
            if let Some(pos) = cluster.keywords.iter().position(|k| k.canonical() == canonical) {
                moved = Some(cluster.keywords.remove(pos));
                break;
            }
        }
        if let Some(keyword) = moved {
            if let Some(target) = clusters.iter_mut().find(|c| c.id == target_id) {
                if !target.contains_keyword(&canonical) {
                    target.keywords.push(keyword);
                }
            }
        }
    }

    for cluster in clusters.iter_mut() {
        cluster.recompute_metrics();
    }
    clusters.retain(|c| c.keyword_count() > 0);
    clusters
}
