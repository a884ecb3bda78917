use std::path::Path;

// ---------------------------------------------------------------------------
// Config — file-based config loader (keyword-pipeline.json) with env-var fallback
// ---------------------------------------------------------------------------

/// AI collaborator sub-config (mirrors the `ai` key in keyword-pipeline.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct AiConfig {
    /// Whether AI enhancement is attempted at all. Defaults to presence of an API key.
    pub enabled: Option<bool>,
    /// LLM endpoint — e.g. `https://api.openai.com/v1` or `http://localhost:11434/v1` (Ollama).
    pub base_url: Option<String>,
    /// API key. Never logged. Leave blank for key-less local endpoints.
    pub api_key: Option<String>,
    /// Model name — e.g. `gpt-4o-mini`, `llama3`.
    pub model: Option<String>,
    /// Per-request timeout in seconds. Default: 45.
    pub timeout_secs: Option<u64>,
}

impl AiConfig {
    /// API key: JSON field → `AI_API_KEY` env var → `None`.
    ///
    /// When `api_key` is explicitly set to `""` in the config file, returns `Some("")`.
    /// This signals "no key required" (Ollama / LM Studio) — calls proceed without auth.
    /// Returns `None` only when the field is absent from config AND `AI_API_KEY` is unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(k) = &self.api_key {
            return Some(k.trim().to_string());
        }
        std::env::var("AI_API_KEY").ok().filter(|v| !v.trim().is_empty())
    }

    /// Base URL: JSON field → `AI_BASE_URL` env var → `https://api.openai.com/v1`.
    pub fn resolve_base_url(&self) -> String {
        if let Some(u) = &self.base_url {
            if !u.trim().is_empty() {
                return u.clone();
            }
        }
        std::env::var("AI_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
    }

    /// Model name: JSON field → `AI_MODEL` env var → `gpt-4o-mini`.
    pub fn resolve_model(&self) -> String {
        if let Some(m) = &self.model {
            if !m.trim().is_empty() {
                return m.clone();
            }
        }
        std::env::var("AI_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Timeout: JSON field → `AI_TIMEOUT_SECS` env var → 45.
    pub fn resolve_timeout_secs(&self) -> u64 {
        if let Some(n) = self.timeout_secs {
            return n;
        }
        std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(45)
    }

    /// Whether AI enhancement is enabled at all: JSON field → `AI_ENABLED` env var → key presence.
    pub fn resolve_enabled(&self) -> bool {
        if let Some(b) = self.enabled {
            return b;
        }
        if let Ok(v) = std::env::var("AI_ENABLED") {
            return !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        self.resolve_api_key().is_some()
    }
}

/// Metrics collaborator sub-config.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct MetricsConfig {
    pub service_url: Option<String>,
    pub api_key: Option<String>,
}

impl MetricsConfig {
    pub fn resolve_service_url(&self) -> Option<String> {
        if let Some(u) = &self.service_url {
            if !u.trim().is_empty() {
                return Some(u.clone());
            }
        }
        std::env::var("METRICS_SERVICE_URL").ok().filter(|v| !v.trim().is_empty())
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(k) = &self.api_key {
            return Some(k.trim().to_string());
        }
        std::env::var("METRICS_API_KEY").ok().filter(|v| !v.trim().is_empty())
    }
}

/// Top-level config loaded from `keyword-pipeline.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct FileConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Load `keyword-pipeline.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `./keyword-pipeline.json`
/// 2. `../keyword-pipeline.json`
/// 3. `KEYWORD_PIPELINE_CONFIG` env var path
///
/// Missing file → `FileConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `FileConfig::default()`.
pub fn load_file_config() -> FileConfig {
    let candidates: Vec<std::path::PathBuf> = {
        let mut v = vec![
            std::path::PathBuf::from("keyword-pipeline.json"),
            std::path::PathBuf::from("../keyword-pipeline.json"),
        ];
        if let Ok(env_path) = std::env::var("KEYWORD_PIPELINE_CONFIG") {
            v.insert(0, std::path::PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<FileConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("keyword-pipeline.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "keyword-pipeline.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return FileConfig::default();
                }
            },
            Err(_) => continue,
        }
    }

    FileConfig::default()
}

// ---------------------------------------------------------------------------
// Pipeline-wide numeric/behavioral knobs (spec.md §6)
// ---------------------------------------------------------------------------

/// Runtime knobs for the pipeline, resolved env-var → default at process start.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub max_pages_to_scan: usize,
    pub scraper_timeout_ms: u64,
    pub max_keywords: usize,
    pub min_search_volume: u64,
    pub min_cluster_size: usize,
    pub job_retention_hours: i64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages_to_scan: env_or("MAX_PAGES_TO_SCAN", 20),
            scraper_timeout_ms: env_or("SCRAPER_TIMEOUT", 30_000),
            max_keywords: env_or("MAX_KEYWORDS", 500),
            min_search_volume: env_or("MIN_SEARCH_VOLUME", 10),
            min_cluster_size: env_or("MIN_CLUSTER_SIZE", 3),
            job_retention_hours: env_or("JOB_RETENTION_HOURS", 24),
            rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW_SECS", 3600),
            rate_limit_max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 10),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Whether the development error-detail mode is on (`APP_ENV=development`).
/// Only affects how much detail `AppError::Internal` exposes in HTTP bodies.
pub fn is_development() -> bool {
    std::env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("development"))
        .unwrap_or(false)
}

/// One supported market: ISO country code, display name, default language, currency.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CountryInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub default_language: &'static str,
    pub currency: &'static str,
}

/// Small static table consulted by job-creation language resolution
/// (spec.md §4.9: "else default-by-country map; else en").
pub const COUNTRIES: &[CountryInfo] = &[
    CountryInfo { code: "2840", name: "United States", default_language: "en", currency: "USD" },
    CountryInfo { code: "2826", name: "United Kingdom", default_language: "en", currency: "GBP" },
    CountryInfo { code: "2276", name: "Germany", default_language: "de", currency: "EUR" },
    CountryInfo { code: "2250", name: "France", default_language: "fr", currency: "EUR" },
    CountryInfo { code: "2724", name: "Spain", default_language: "es", currency: "EUR" },
    CountryInfo { code: "2380", name: "Italy", default_language: "it", currency: "EUR" },
    CountryInfo { code: "2756", name: "Switzerland", default_language: "de", currency: "CHF" },
    CountryInfo { code: "2124", name: "Canada", default_language: "en", currency: "CAD" },
    CountryInfo { code: "2036", name: "Australia", default_language: "en", currency: "AUD" },
    CountryInfo { code: "2392", name: "Japan", default_language: "ja", currency: "JPY" },
];

pub const SUPPORTED_LANGUAGES: &[&str] =
    &["en", "de", "fr", "es", "it", "pt", "nl", "sv", "ja", "zh"];

/// Resolve `(explicit code, country code)` to a language per spec.md §4.9:
/// explicit code → lower-cased; else default-by-country map; else `en`.
pub fn resolve_language(explicit: Option<&str>, country: &str) -> String {
    if let Some(lang) = explicit {
        let lang = lang.trim().to_ascii_lowercase();
        if !lang.is_empty() {
            return lang;
        }
    }
    COUNTRIES
        .iter()
        .find(|c| c.code == country)
        .map(|c| c.default_language.to_string())
        .unwrap_or_else(|| "en".to_string())
}

/// Optional override check used by setup-style preflight diagnostics.
pub fn path_exists(p: &str) -> bool {
    Path::new(p).exists()
}
