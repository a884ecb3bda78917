//! AIEnhancer collaborator (spec.md §4.8): an optional, pluggable capability,
//! swapped by construction rather than reached through a global singleton —
//! grounded in the teacher's `deep_research` tool's OpenAI-compatible client
//! and its null-object fallback pattern.

use crate::core::types::{Cluster, Keyword, ScrapeResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("ai request failed: {0}")]
    Request(String),
    #[error("ai response could not be parsed: {0}")]
    Parse(String),
    #[error("ai disabled")]
    Disabled,
}

#[derive(Debug, Default, Clone)]
pub struct RegroupSuggestions {
    pub renames: Vec<(usize, String)>,
    pub priority_indices: Vec<usize>,
}

#[derive(Debug, Default, Clone)]
pub struct ScrutinizeSuggestions {
    pub reassignments: Vec<(String, Uuid)>,
    pub merges: Vec<(Uuid, Uuid)>,
    pub renames: Vec<(Uuid, String)>,
}

#[derive(Debug, Default, Clone)]
pub struct ClusterEnhancement {
    pub pillar_topic: Option<String>,
    pub description: Option<String>,
    pub content_strategy: Option<String>,
}

/// Site context passed to every AI call: enough to ground prompts without
/// handing over the entire scrape.
#[derive(Debug, Clone, Default)]
pub struct SiteContext {
    pub url: String,
    pub title: String,
    pub description: String,
}

#[async_trait]
pub trait AiEnhancer: Send + Sync {
    async fn generate_seed_keywords(
        &self,
        scrape: &ScrapeResult,
        language: &str,
        max: usize,
    ) -> Result<Vec<String>, AiError>;

    async fn regroup_suggestions(
        &self,
        clusters: &[Cluster],
        context: &SiteContext,
        all_keywords: &[Keyword],
        language: &str,
    ) -> Result<RegroupSuggestions, AiError>;

    async fn scrutinize(
        &self,
        clusters: &[Cluster],
        keywords: &[Keyword],
        context: &SiteContext,
        language: &str,
    ) -> Result<ScrutinizeSuggestions, AiError>;

    async fn enhance_cluster(
        &self,
        cluster: &Cluster,
        context: &SiteContext,
        language: &str,
    ) -> Result<ClusterEnhancement, AiError>;

    fn is_available(&self) -> bool;
}

/// Always-unavailable collaborator — used when `useAI=false` or no key is
/// configured, per spec.md §9 "null object" pluggable-collaborator design.
pub struct NullAiEnhancer;

#[async_trait]
impl AiEnhancer for NullAiEnhancer {
    async fn generate_seed_keywords(&self, _: &ScrapeResult, _: &str, _: usize) -> Result<Vec<String>, AiError> {
        Err(AiError::Disabled)
    }

    async fn regroup_suggestions(
        &self,
        _: &[Cluster],
        _: &SiteContext,
        _: &[Keyword],
        _: &str,
    ) -> Result<RegroupSuggestions, AiError> {
        Err(AiError::Disabled)
    }

    async fn scrutinize(
        &self,
        _: &[Cluster],
        _: &[Keyword],
        _: &SiteContext,
        _: &str,
    ) -> Result<ScrutinizeSuggestions, AiError> {
        Err(AiError::Disabled)
    }

    async fn enhance_cluster(&self, _: &Cluster, _: &SiteContext, _: &str) -> Result<ClusterEnhancement, AiError> {
        Err(AiError::Disabled)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// OpenAI-compatible chat-completions client (also serves Ollama/LM Studio
/// endpoints, which expose the same `/chat/completions` shape).
pub struct OpenAiEnhancer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl OpenAiEnhancer {
    pub fn new(base_url: String, api_key: Option<String>, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut req = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": 0.3,
            }));
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                req = req.bearer_auth(key);
            }
        }
        let response = req.send().await.map_err(|e| AiError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AiError::Request(format!("status {}", response.status())));
        }
        let body: Value = response.json().await.map_err(|e| AiError::Request(e.to_string()))?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AiError::Parse("missing choices[0].message.content".into()))
    }

    fn parse_json_array_of_strings(raw: &str) -> Result<Vec<String>, AiError> {
        let text = extract_json_fragment(raw);
        serde_json::from_str::<Vec<String>>(&text).map_err(|e| AiError::Parse(e.to_string()))
    }
}

/// Strips markdown code fences / surrounding prose the model may add around
/// the JSON payload, keeping only the first balanced `[...]` or `{...}` span.
fn extract_json_fragment(raw: &str) -> String {
    let trimmed = raw.trim();
    let start = trimmed.find(['[', '{']);
    let end = trimmed.rfind([']', '}']);
    match (start, end) {
        (Some(s), Some(e)) if e >= s => trimmed[s..=e].to_string(),
        _ => trimmed.to_string(),
    }
}

#[derive(Deserialize)]
struct RegroupWire {
    #[serde(default)]
    renames: Vec<RenameEntry>,
    #[serde(default)]
    priority_indices: Vec<usize>,
}

#[derive(Deserialize)]
struct RenameEntry {
    index: usize,
    name: String,
}

#[derive(Deserialize)]
struct ScrutinizeWire {
    #[serde(default)]
    reassignments: Vec<ReassignEntry>,
    #[serde(default)]
    merges: Vec<[Uuid; 2]>,
    #[serde(default)]
    renames: Vec<ClusterRenameEntry>,
}

#[derive(Deserialize)]
struct ReassignEntry {
    keyword: String,
    cluster_id: Uuid,
}

#[derive(Deserialize)]
struct ClusterRenameEntry {
    cluster_id: Uuid,
    name: String,
}

#[derive(Deserialize, Default)]
struct EnhanceWire {
    #[serde(default)]
    pillar_topic: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content_strategy: Option<String>,
}

#[async_trait]
impl AiEnhancer for OpenAiEnhancer {
    async fn generate_seed_keywords(
        &self,
        scrape: &ScrapeResult,
        language: &str,
        max: usize,
    ) -> Result<Vec<String>, AiError> {
        let sample: Vec<&str> = scrape.pages.iter().take(5).map(|p| p.title.as_str()).collect();
        let prompt = format!(
            "Given this website content (page titles: {:?}), return a JSON array of up to {} \
             short (1-3 word) marketing-focused keyword phrases in language \"{}\", ordered by relevance. \
             Respond with ONLY the JSON array.",
            sample, max, language
        );
        let raw = self.complete(&prompt).await?;
        let mut keywords = Self::parse_json_array_of_strings(&raw)?;
        keywords.truncate(max);
        Ok(keywords)
    }

    async fn regroup_suggestions(
        &self,
        clusters: &[Cluster],
        context: &SiteContext,
        _all_keywords: &[Keyword],
        language: &str,
    ) -> Result<RegroupSuggestions, AiError> {
        let pillars: Vec<&str> = clusters.iter().map(|c| c.pillar_topic.as_str()).collect();
        let prompt = format!(
            "Site: {} ({}). Clusters (by index): {:?}. Language: {}. \
             Return JSON {{\"renames\":[{{\"index\":N,\"name\":\"...\"}}],\"priority_indices\":[N,...]}} \
             with better pillar names where helpful and which cluster indices are highest business priority. \
             Respond with ONLY JSON.",
            context.url, context.title, pillars, language
        );
        let raw = self.complete(&prompt).await?;
        let wire: RegroupWire =
            serde_json::from_str(&extract_json_fragment(&raw)).map_err(|e| AiError::Parse(e.to_string()))?;
        Ok(RegroupSuggestions {
            renames: wire.renames.into_iter().map(|r| (r.index, r.name)).collect(),
            priority_indices: wire.priority_indices,
        })
    }

    async fn scrutinize(
        &self,
        clusters: &[Cluster],
        keywords: &[Keyword],
        context: &SiteContext,
        language: &str,
    ) -> Result<ScrutinizeSuggestions, AiError> {
        let cluster_summaries: Vec<(Uuid, &str, usize)> =
            clusters.iter().map(|c| (c.id, c.pillar_topic.as_str(), c.keyword_count())).collect();
        let prompt = format!(
            "Site: {} ({}). Clusters: {:?}. Total keywords: {}. Language: {}. \
             Find misplaced keywords, clusters worth merging, and better pillar names. \
             Return JSON {{\"reassignments\":[{{\"keyword\":\"...\",\"cluster_id\":\"...\"}}],\
             \"merges\":[[\"id1\",\"id2\"]],\"renames\":[{{\"cluster_id\":\"...\",\"name\":\"...\"}}]}}. \
             Respond with ONLY JSON.",
            context.url, context.title, cluster_summaries, keywords.len(), language
        );
        let raw = self.complete(&prompt).await?;
        let wire: ScrutinizeWire =
            serde_json::from_str(&extract_json_fragment(&raw)).map_err(|e| AiError::Parse(e.to_string()))?;
        Ok(ScrutinizeSuggestions {
            reassignments: wire.reassignments.into_iter().map(|r| (r.keyword, r.cluster_id)).collect(),
            merges: wire.merges.into_iter().map(|[a, b]| (a, b)).collect(),
            renames: wire.renames.into_iter().map(|r| (r.cluster_id, r.name)).collect(),
        })
    }

    async fn enhance_cluster(
        &self,
        cluster: &Cluster,
        context: &SiteContext,
        language: &str,
    ) -> Result<ClusterEnhancement, AiError> {
        let top: Vec<&str> = cluster.keywords.iter().take(4).map(|k| k.text.as_str()).collect();
        let prompt = format!(
            "Site: {} ({}). Cluster pillar: \"{}\". Top keywords: {:?}. Language: {}. \
             Return JSON {{\"pillar_topic\":\"...\",\"description\":\"...\",\"content_strategy\":\"...\"}}. \
             Respond with ONLY JSON.",
            context.url, context.title, cluster.pillar_topic, top, language
        );
        let raw = self.complete(&prompt).await?;
        let wire: EnhanceWire =
            serde_json::from_str(&extract_json_fragment(&raw)).unwrap_or_default();
        Ok(ClusterEnhancement {
            pillar_topic: wire.pillar_topic.filter(|s| !s.trim().is_empty()),
            description: wire.description.filter(|s| !s.trim().is_empty()),
            content_strategy: wire.content_strategy.filter(|s| !s.trim().is_empty()),
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Deterministic narrative fallback (spec.md §4.8) used whenever the AI
/// provider is unavailable or returns an empty description/strategy.
pub fn deterministic_narrative(cluster: &Cluster, context: &SiteContext) -> (String, String) {
    let top: Vec<&str> = cluster.keywords.iter().take(4).map(|k| k.text.as_str()).collect();
    let topic = &cluster.pillar_topic;
    let site = if context.title.is_empty() { context.url.as_str() } else { context.title.as_str() };

    let description = if top.is_empty() {
        format!("Content covering {topic}, relevant to {site}.")
    } else {
        format!(
            "Content covering {topic}, anchored by terms such as {}. Relevant to {site}.",
            top.join(", ")
        )
    };

    let strategy = format!(
        "Publish a pillar page targeting \"{topic}\" and supporting content around {}, \
         linking back to {site} to capture search demand across this topic.",
        if top.is_empty() { "its related terms".to_string() } else { top.join(", ") }
    );

    (description, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_fragment_strips_code_fence() {
        let raw = "Here you go:\n```json\n[\"a\", \"b\"]\n```";
        assert_eq!(extract_json_fragment(raw), "[\"a\", \"b\"]");
    }

    #[test]
    fn deterministic_narrative_includes_top_keywords() {
        let cluster = Cluster::new(
            "web design".to_string(),
            vec![Keyword {
                text: "web design services".to_string(),
                search_volume: 100,
                competition: crate::core::types::Competition::Low,
                cpc_low: 1.0,
                cpc_high: 2.0,
            }],
            "hybrid",
        );
        let ctx = SiteContext { url: "https://acme.test".into(), title: "Acme".into(), description: String::new() };
        let (description, strategy) = deterministic_narrative(&cluster, &ctx);
        assert!(description.contains("web design services"));
        assert!(strategy.contains("web design"));
    }
}
