//! SeedGenerator (spec.md §4.5): AI-backed seed keyword generation with a
//! deterministic TF-IDF fallback, grounded in the teacher's
//! `nlp::rerank` term-scoring approach.

use crate::ai::AiEnhancer;
use crate::core::types::ScrapeResult;
use crate::textkit::{self, TfIdf};
use std::collections::HashMap;

const GENERIC_NAV_WORDS: &[&str] = &["click", "page", "here", "more", "learn", "read", "view", "see"];
const FALLBACK_CAP: usize = 150;
const PAGES_SAMPLED: usize = 5;

/// `generateSeedKeywords`: try the AI collaborator first, fall back to a
/// deterministic TF-IDF-scored candidate list on any failure.
pub async fn generate_seed_keywords(
    ai: &dyn AiEnhancer,
    scrape: &ScrapeResult,
    language: &str,
    max: usize,
) -> Vec<String> {
    if ai.is_available() {
        match ai.generate_seed_keywords(scrape, language, max).await {
            Ok(seeds) if !seeds.is_empty() => return seeds,
            _ => {}
        }
    }
    fallback_seed_keywords(scrape, max.min(FALLBACK_CAP))
}

fn page_text_blob(scrape: &ScrapeResult) -> Vec<String> {
    scrape
        .pages
        .iter()
        .take(PAGES_SAMPLED)
        .map(|page| {
            let mut parts = vec![page.title.clone(), page.meta_description.clone()];
            parts.extend(page.headings.h1.iter().take(5).cloned());
            parts.extend(page.headings.h2.iter().take(5).cloned());
            parts.extend(page.headings.h3.iter().take(5).cloned());
            parts.join(" ")
        })
        .collect()
}

/// Deterministic fallback path (spec.md §4.5): single-token and 2-3 word
/// phrase candidates scored by frequency + max TF-IDF + a length bonus.
fn fallback_seed_keywords(scrape: &ScrapeResult, max: usize) -> Vec<String> {
    let documents = page_text_blob(scrape);
    if documents.iter().all(|d| d.trim().is_empty()) {
        return Vec::new();
    }
    let tfidf = TfIdf::new(&documents);

    let mut frequency: HashMap<String, usize> = HashMap::new();
    let mut max_weight: HashMap<String, f64> = HashMap::new();

    for (doc_index, doc) in documents.iter().enumerate() {
        let words: Vec<String> = textkit::content_tokens(doc);
        let doc_max_tfidf = tfidf.max_weight(doc_index);

        for word in &words {
            if word.len() < 3 || is_generic(word) {
                continue;
            }
            *frequency.entry(word.clone()).or_insert(0) += 1;
            let entry = max_weight.entry(word.clone()).or_insert(0.0);
            if doc_max_tfidf > *entry {
                *entry = doc_max_tfidf;
            }
        }

        for window in 2..=3 {
            for chunk in words.windows(window) {
                let content_ratio = chunk.iter().filter(|w| !textkit::STOP_WORDS.contains(&w.as_str())).count() as f64
                    / chunk.len() as f64;
                if content_ratio < 0.5 {
                    continue;
                }
                let phrase = chunk.join(" ");
                if phrase.split_whitespace().any(is_generic) {
                    continue;
                }
                *frequency.entry(phrase.clone()).or_insert(0) += 1;
                let entry = max_weight.entry(phrase).or_insert(0.0);
                if doc_max_tfidf > *entry {
                    *entry = doc_max_tfidf;
                }
            }
        }
    }

    let mut scored: Vec<(String, f64)> = frequency
        .into_iter()
        .filter(|(_, freq)| *freq >= 2)
        .map(|(candidate, freq)| {
            let weight = *max_weight.get(&candidate).unwrap_or(&0.0);
            let is_multi_word = candidate.contains(' ');
            let length_bonus = if is_multi_word { 1.2 } else { 1.0 };
            let score = 0.3 * ((freq as f64 + 1.0).ln() / 10.0) + 0.5 * weight + length_bonus;
            (candidate, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(max).map(|(candidate, _)| candidate).collect()
}

fn is_generic(word: &str) -> bool {
    GENERIC_NAV_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Headings, PageContent};
    use chrono::Utc;

    fn sample_scrape() -> ScrapeResult {
        let page = PageContent {
            url: "https://acme.test".into(),
            title: "Acme Web Development Agency".into(),
            meta_description: "Acme provides web development and web design services.".into(),
            headings: Headings {
                h1: vec!["Web Development Services".into()],
                h2: vec!["Web Design Portfolio".into()],
                h3: vec![],
            },
            paragraphs: vec![],
            list_items: vec![],
            anchors: vec![],
            image_alts: vec![],
            word_count: 20,
        };
        ScrapeResult { pages: vec![page.clone(), page], total_words: 40, strategy: "http".into(), timestamp: Utc::now() }
    }

    #[test]
    fn fallback_produces_multi_word_candidates() {
        let scrape = sample_scrape();
        let seeds = fallback_seed_keywords(&scrape, 10);
        assert!(!seeds.is_empty());
        assert!(seeds.iter().any(|s| s.contains(' ')), "expected at least one multi-word seed: {seeds:?}");
    }

    #[test]
    fn fallback_drops_generic_nav_words() {
        let scrape = sample_scrape();
        let seeds = fallback_seed_keywords(&scrape, 50);
        assert!(!seeds.iter().any(|s| GENERIC_NAV_WORDS.contains(&s.as_str())));
    }

    #[test]
    fn fallback_empty_scrape_yields_no_seeds() {
        let empty = ScrapeResult { pages: vec![], total_words: 0, strategy: "http".into(), timestamp: Utc::now() };
        assert!(fallback_seed_keywords(&empty, 50).is_empty());
    }
}
