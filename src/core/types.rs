use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PageContent / ScrapeResult — spec.md §3, produced by Extractor / Scraper.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
}

impl Headings {
    pub fn iter_all(&self) -> impl Iterator<Item = &str> {
        self.h1
            .iter()
            .chain(self.h2.iter())
            .chain(self.h3.iter())
            .map(|s| s.as_str())
    }
}

/// One crawled page, read-only once built by the Extractor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub headings: Headings,
    pub paragraphs: Vec<String>,
    pub list_items: Vec<String>,
    pub anchors: Vec<String>,
    pub image_alts: Vec<String>,
    pub word_count: usize,
}

/// Ordered sequence of pages produced by one crawl, plus the strategy that
/// produced the first page (spec.md §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub pages: Vec<PageContent>,
    pub total_words: usize,
    pub strategy: String,
    pub timestamp: DateTime<Utc>,
}

impl ScrapeResult {
    /// Invariant (spec.md §3): at least one page with word_count > 0 on success.
    pub fn is_valid(&self) -> bool {
        self.pages.iter().any(|p| p.word_count > 0)
    }
}

// ---------------------------------------------------------------------------
// Keyword / Competition — spec.md §3, produced by MetricsClient.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Competition {
    Low,
    Medium,
    High,
    Unknown,
}

impl Competition {
    /// Numeric weight used by clustering's coherence/score math: low=1, medium=2, high=3.
    /// `Unknown` is treated as `medium` for the purpose of numeric averaging, matching the
    /// teacher's practice of never letting an "unknown" enum value poison a weighted average.
    pub fn weight(&self) -> f64 {
        match self {
            Competition::Low => 1.0,
            Competition::Medium => 2.0,
            Competition::High => 3.0,
            Competition::Unknown => 2.0,
        }
    }

    /// spec.md §4.7.7: avg < 1.5 -> low, < 2.5 -> medium, else high.
    pub fn from_avg(avg: f64) -> Self {
        if avg < 1.5 {
            Competition::Low
        } else if avg < 2.5 {
            Competition::Medium
        } else {
            Competition::High
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Competition::Low,
            "medium" | "med" => Competition::Medium,
            "high" => Competition::High,
            _ => Competition::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub search_volume: u64,
    pub competition: Competition,
    pub cpc_low: f64,
    pub cpc_high: f64,
}

impl Keyword {
    /// Canonical form used for uniqueness comparisons (spec.md §3: "lowercase-trimmed").
    pub fn canonical(&self) -> String {
        self.text.trim().to_lowercase()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count().max(1)
    }
}

// ---------------------------------------------------------------------------
// Cluster — spec.md §3 / §4.7, created by ClusterEngine, mutated by AIEnhancer.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub pillar_topic: String,
    pub keywords: Vec<Keyword>,
    pub total_search_volume: u64,
    pub avg_search_volume: f64,
    pub avg_competition: Competition,
    pub relevance_score: f64,
    pub cluster_value_score: f64,
    pub algorithm: String,
    pub ai_description: Option<String>,
    pub ai_content_strategy: Option<String>,
    pub ai_priority: Option<bool>,
    pub rank: usize,
}

impl Cluster {
    pub fn new(pillar_topic: String, keywords: Vec<Keyword>, algorithm: &str) -> Self {
        let mut c = Self {
            id: Uuid::new_v4(),
            pillar_topic,
            keywords,
            total_search_volume: 0,
            avg_search_volume: 0.0,
            avg_competition: Competition::Unknown,
            relevance_score: 1.0,
            cluster_value_score: 0.0,
            algorithm: algorithm.to_string(),
            ai_description: None,
            ai_content_strategy: None,
            ai_priority: None,
            rank: 0,
        };
        c.recompute_metrics();
        c
    }

    /// Recompute every derived field from `keywords` and `relevance_score`.
    /// spec.md §9 open question: "design specifies recompute after every membership
    /// change" — callers must invoke this any time `keywords` is mutated.
    pub fn recompute_metrics(&mut self) {
        self.keywords.sort_by(|a, b| b.search_volume.cmp(&a.search_volume));
        self.total_search_volume = self.keywords.iter().map(|k| k.search_volume).sum();
        let n = self.keywords.len().max(1) as f64;
        self.avg_search_volume = self.total_search_volume as f64 / n;
        let avg_comp = if self.keywords.is_empty() {
            0.0
        } else {
            self.keywords.iter().map(|k| k.competition.weight()).sum::<f64>() / self.keywords.len() as f64
        };
        self.avg_competition = Competition::from_avg(avg_comp);
        self.cluster_value_score = crate::cluster::score::cluster_value_score(self);
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    pub fn contains_keyword(&self, canonical: &str) -> bool {
        self.keywords.iter().any(|k| k.canonical() == canonical)
    }
}

// ---------------------------------------------------------------------------
// Job options / status — spec.md §3, §4.9.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStrategy {
    Auto,
    Browser,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAlgorithm {
    Kmeans,
    Dbscan,
    Semantic,
    Hybrid,
}

impl ClusterAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterAlgorithm::Kmeans => "kmeans",
            ClusterAlgorithm::Dbscan => "dbscan",
            ClusterAlgorithm::Semantic => "semantic",
            ClusterAlgorithm::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    pub max_pages: usize,
    pub follow_links: bool,
    pub scrape_strategy: ScrapeStrategy,
    pub cluster_algorithm: ClusterAlgorithm,
    pub min_cluster_size: usize,
    pub use_ai: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            max_pages: 20,
            follow_links: true,
            scrape_strategy: ScrapeStrategy::Auto,
            cluster_algorithm: ClusterAlgorithm::Hybrid,
            min_cluster_size: 3,
            use_ai: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// Per-stage label, also used as the progress "step" field (spec.md §4.9).
pub const STEP_VALIDATING: &str = "validating";
pub const STEP_SCANNING: &str = "scanning";
pub const STEP_EXTRACTING: &str = "extracting";
pub const STEP_ENRICHING: &str = "enriching";
pub const STEP_CLUSTERING: &str = "clustering";
pub const STEP_FINALIZING: &str = "finalizing";
pub const STEP_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub clusters: Vec<Cluster>,
    pub keyword_count: usize,
    pub total_search_volume: u64,
}

/// Data the job owns exclusively but that never leaves the process boundary
/// (spec.md §3 "Ownership"; §6 "full job view minus internal metadata").
#[derive(Debug, Clone, Default)]
pub struct InternalMetadata {
    pub scrape: Option<ScrapeResult>,
    pub keywords: Vec<Keyword>,
    pub source_ip: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub url: String,
    pub country: String,
    pub requested_language: Option<String>,
    pub resolved_language: String,
    pub options: JobOptions,
    pub status: JobStatus,
    pub progress: u8,
    pub step: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub data: Option<JobResult>,
    pub processing_time_ms: Option<u64>,
    pub internal: InternalMetadata,
}

impl Job {
    pub fn new(url: String, country: String, requested_language: Option<String>, options: JobOptions, source_ip: Option<String>) -> Self {
        let resolved_language = crate::core::config::resolve_language(requested_language.as_deref(), &country);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            url,
            country,
            requested_language,
            resolved_language,
            options,
            status: JobStatus::Processing,
            progress: 5,
            step: STEP_VALIDATING.to_string(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            failed_at: None,
            error: None,
            warnings: Vec::new(),
            data: None,
            processing_time_ms: None,
            internal: InternalMetadata { source_ip, ..Default::default() },
        }
    }

    /// Advance progress, enforcing spec.md §5/§8: monotonic non-decreasing.
    pub fn set_progress(&mut self, progress: u8, step: &str) {
        if progress > self.progress {
            self.progress = progress;
        }
        self.step = step.to_string();
        self.updated_at = Utc::now();
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self, result: JobResult) {
        let now = Utc::now();
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.step = STEP_COMPLETED.to_string();
        self.processing_time_ms = Some((now - self.created_at).num_milliseconds().max(0) as u64);
        self.completed_at = Some(now);
        self.updated_at = now;
        self.data = Some(result);
    }

    pub fn mark_failed(&mut self, stage: &str, error: impl Into<String>) {
        let now = Utc::now();
        self.status = JobStatus::Failed;
        self.step = stage.to_string();
        self.error = Some(error.into());
        self.failed_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, JobStatus::Processing)
    }
}
