//! ClusterEngine — the algorithmic core (spec.md §4.7): vectorization,
//! k-means/DBSCAN/semantic/hybrid clustering, refinement, uniqueness
//! enforcement, relevance filtering, and scoring/ranking.

mod dbscan;
mod kmeans;
pub mod refine;
pub mod score;
mod semantic;
mod vectorize;

use crate::core::types::{Cluster, ClusterAlgorithm, Keyword};
use crate::textkit::{self, similarity};
use std::collections::{HashMap, HashSet};
use vectorize::Vectorizer;

/// Pillar selection (spec.md §4.7.5): maximize
/// `log(volume+1) * lengthMultiplier + 0.5 * substringContainmentCount`.
pub fn select_pillar(keywords: &[Keyword]) -> String {
    if keywords.is_empty() {
        return String::new();
    }
    let mut best_score = f64::NEG_INFINITY;
    let mut best_text = keywords[0].text.clone();

    for candidate in keywords {
        let words = candidate.word_count();
        let length_multiplier = match words {
            1 => 0.8,
            2 | 3 => 1.2,
            n if n > 4 => 0.7,
            _ => 1.0,
        };
        let lower = candidate.text.to_lowercase();
        let substring_count = keywords
            .iter()
            .filter(|other| other.text != candidate.text && other.text.to_lowercase().contains(&lower))
            .count() as f64;

        let score = (candidate.search_volume as f64 + 1.0).ln() * length_multiplier + 0.5 * substring_count;
        if score > best_score {
            best_score = score;
            best_text = candidate.text.clone();
        }
    }
    best_text
}

fn build_clusters(groups: Vec<Vec<Keyword>>, algorithm: &str) -> Vec<Cluster> {
    groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|members| Cluster::new(select_pillar(&members), members, algorithm))
        .collect()
}

/// `clusterKeywords` (spec.md §4.7.2 / §8 boundaries): dispatches to the
/// chosen algorithm, then always enforces keyword uniqueness across clusters.
pub fn cluster_keywords(keywords: Vec<Keyword>, algorithm: ClusterAlgorithm, min_cluster_size: usize) -> Vec<Cluster> {
    if keywords.is_empty() {
        return Vec::new();
    }
    if keywords.len() < min_cluster_size {
        let pillar = select_pillar(&keywords);
        return vec![Cluster::new(pillar, keywords, algorithm.as_str())];
    }

    let clusters = match algorithm {
        ClusterAlgorithm::Kmeans => {
            let vectorizer = Vectorizer::new(&keywords);
            let vectors = vectorizer.vectorize_all(&keywords);
            let k = kmeans::choose_k(keywords.len());
            let assignments = kmeans::kmeans(&vectors, k);
            let mut groups: Vec<Vec<Keyword>> = vec![Vec::new(); k];
            for (keyword, assignment) in keywords.into_iter().zip(assignments.into_iter()) {
                groups[assignment].push(keyword);
            }
            build_clusters(groups, algorithm.as_str())
        }
        ClusterAlgorithm::Dbscan => build_clusters(dbscan::run(keywords, min_cluster_size), algorithm.as_str()),
        ClusterAlgorithm::Semantic => build_clusters(semantic::run(keywords, min_cluster_size), algorithm.as_str()),
        ClusterAlgorithm::Hybrid => {
            let vectorizer = Vectorizer::new(&keywords);
            let vectors = vectorizer.vectorize_all(&keywords);
            let k = kmeans::choose_k(keywords.len());
            let assignments = kmeans::kmeans(&vectors, k);
            let mut groups: Vec<Vec<Keyword>> = vec![Vec::new(); k];
            for (keyword, assignment) in keywords.into_iter().zip(assignments.into_iter()) {
                groups[assignment].push(keyword);
            }
            let clusters = build_clusters(groups, algorithm.as_str());
            let clusters = refine::refine_with_semantics(clusters, min_cluster_size);
            let clusters = refine::merge_similar_clusters(clusters);
            refine::split_mixed_clusters(clusters, min_cluster_size)
        }
    };

    ensure_unique_keywords(clusters, min_cluster_size)
}

/// `ensureUniqueKeywords` (spec.md §4.7.4): resolve multi-membership by
/// highest pillar similarity (ties to the earlier cluster), then salvage
/// keywords orphaned by now-undersized clusters into the best remaining one.
pub fn ensure_unique_keywords(mut clusters: Vec<Cluster>, min_cluster_size: usize) -> Vec<Cluster> {
    let mut canonical_to_clusters: HashMap<String, Vec<usize>> = HashMap::new();
    for (ci, cluster) in clusters.iter().enumerate() {
        for keyword in &cluster.keywords {
            canonical_to_clusters.entry(keyword.canonical()).or_default().push(ci);
        }
    }

    let mut touched = false;
    for (canonical, cluster_indices) in canonical_to_clusters.iter() {
        if cluster_indices.len() < 2 {
            continue;
        }
        let sample_text = clusters[cluster_indices[0]]
            .keywords
            .iter()
            .find(|k| &k.canonical() == canonical)
            .map(|k| k.text.clone())
            .unwrap_or_default();

        let mut best_idx = cluster_indices[0];
        let mut best_sim = f64::NEG_INFINITY;
        for &ci in cluster_indices {
            let sim = similarity(&sample_text, &clusters[ci].pillar_topic);
            if sim > best_sim {
                best_sim = sim;
                best_idx = ci;
            }
        }
        for &ci in cluster_indices {
            if ci != best_idx {
                clusters[ci].keywords.retain(|k| &k.canonical() != canonical);
                touched = true;
            }
        }
    }

    if touched {
        for cluster in clusters.iter_mut() {
            cluster.recompute_metrics();
        }
    }

    loop {
        if clusters.len() <= 1 {
            break;
        }
        let Some(idx) = clusters.iter().position(|c| c.keyword_count() < min_cluster_size) else {
            break;
        };
        let orphaned = clusters.remove(idx);
        for keyword in orphaned.keywords {
            let canonical = keyword.canonical();
            let mut best_idx = None;
            let mut best_sim = f64::NEG_INFINITY;
            for (ci, candidate) in clusters.iter().enumerate() {
                if candidate.contains_keyword(&canonical) {
                    continue;
                }
                let sim = similarity(&keyword.text, &candidate.pillar_topic);
                if sim > best_sim {
                    best_sim = sim;
                    best_idx = Some(ci);
                }
            }
            if let Some(ci) = best_idx {
                clusters[ci].keywords.push(keyword);
            }
        }
        for cluster in clusters.iter_mut() {
            cluster.recompute_metrics();
        }
    }

    clusters.retain(|c| !c.keywords.is_empty());
    clusters
}

/// Site-context token set consulted by relevance filtering (spec.md §4.7.6):
/// built from URL, title, meta description, page titles/descriptions, and any
/// extra focus terms (e.g. headings) the caller wants folded in.
pub struct RelevanceContext {
    tokens: HashSet<String>,
    normalized_text: String,
}

impl RelevanceContext {
    pub fn build(parts: &[&str]) -> Self {
        let combined = parts.join(" ");
        Self { tokens: textkit::content_tokens(&combined).into_iter().collect(), normalized_text: combined.to_lowercase() }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn keyword_relevance(keyword: &Keyword, context: &RelevanceContext) -> f64 {
    let keyword_tokens: HashSet<String> = textkit::content_tokens(&keyword.text).into_iter().collect();

    let match_ratio = if keyword_tokens.is_empty() {
        0.0
    } else {
        keyword_tokens.intersection(&context.tokens).count() as f64 / keyword_tokens.len() as f64
    };

    let union = keyword_tokens.union(&context.tokens).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        keyword_tokens.intersection(&context.tokens).count() as f64 / union as f64
    };

    let mut relevance = (0.7 * match_ratio + 0.3 * jaccard).min(1.0);

    if context.normalized_text.contains(&keyword.text.to_lowercase()) {
        relevance = relevance.max(0.9);
    }
    if match_ratio >= 0.6 && keyword_tokens.len() <= 3 {
        relevance = relevance.max(0.75);
    }

    relevance
}

/// `applyRelevanceScores` (spec.md §4.7.6): drops near-irrelevant keywords,
/// recomputes per-cluster relevance, and drops clusters that fall below
/// `min_cluster_size` as a result. A no-op (besides re-deriving scores) when
/// the context carries no tokens at all.
pub fn apply_relevance_scores(mut clusters: Vec<Cluster>, context: &RelevanceContext, min_cluster_size: usize) -> Vec<Cluster> {
    if context.is_empty() {
        return clusters;
    }

    for cluster in clusters.iter_mut() {
        cluster.keywords.retain(|keyword| {
            let keyword_tokens_empty = textkit::content_tokens(&keyword.text).is_empty();
            let relevance = keyword_relevance(keyword, context);
            keyword_tokens_empty || relevance > 0.01
        });

        if cluster.keywords.is_empty() {
            cluster.relevance_score = 0.0;
            continue;
        }

        let weighted: Vec<(f64, f64)> = cluster
            .keywords
            .iter()
            .map(|k| (keyword_relevance(k, context), (k.search_volume as f64 + 10.0).log10().max(1.0)))
            .collect();
        let weight_sum: f64 = weighted.iter().map(|(_, w)| w).sum();
        let weighted_avg = if weight_sum > 0.0 {
            weighted.iter().map(|(r, w)| r * w).sum::<f64>() / weight_sum
        } else {
            0.0
        };
        let max_relevance = weighted.iter().map(|(r, _)| *r).fold(0.0, f64::max);
        cluster.relevance_score = 0.7 * weighted_avg + 0.3 * max_relevance;
        cluster.recompute_metrics();
    }

    clusters.retain(|c| c.keyword_count() >= min_cluster_size);
    clusters
}

/// `sortAndRankClusters` (spec.md §4.7.7): sort by value desc, relevance desc,
/// total volume desc, keyword count desc; assign ranks `1..K`.
pub fn sort_and_rank_clusters(mut clusters: Vec<Cluster>) -> Vec<Cluster> {
    clusters.sort_by(|a, b| {
        b.cluster_value_score
            .partial_cmp(&a.cluster_value_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| b.total_search_volume.cmp(&a.total_search_volume))
            .then_with(|| b.keyword_count().cmp(&a.keyword_count()))
    });
    for (i, cluster) in clusters.iter_mut().enumerate() {
        cluster.rank = i + 1;
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Competition;

    fn kw(text: &str, volume: u64, competition: Competition) -> Keyword {
        Keyword { text: text.into(), search_volume: volume, competition, cpc_low: 1.0, cpc_high: 2.0 }
    }

    fn s1_keywords() -> Vec<Keyword> {
        vec![
            kw("web development", 10000, Competition::Medium),
            kw("web design", 8000, Competition::Low),
            kw("frontend development", 5000, Competition::Medium),
            kw("backend development", 4000, Competition::High),
            kw("seo services", 12000, Competition::High),
            kw("seo optimization", 9000, Competition::Medium),
            kw("digital marketing", 15000, Competition::High),
            kw("content marketing", 7000, Competition::Medium),
        ]
    }

    #[test]
    fn s1_tiny_valid_pipeline() {
        let clusters = cluster_keywords(s1_keywords(), ClusterAlgorithm::Hybrid, 2);
        assert!(clusters.len() >= 2, "expected >=2 clusters, got {}", clusters.len());

        let mut seen: HashSet<String> = HashSet::new();
        for cluster in &clusters {
            for keyword in &cluster.keywords {
                assert!(seen.insert(keyword.canonical()), "duplicate keyword across clusters: {}", keyword.text);
            }
        }
        assert_eq!(seen.len(), 8);

        let has_seo_together = clusters.iter().any(|c| c.contains_keyword("seo services") && c.contains_keyword("seo optimization"));
        assert!(has_seo_together, "expected seo services/optimization in same cluster");

        for cluster in &clusters {
            assert!((0.0..=100.0).contains(&cluster.cluster_value_score));
        }

        let ranked = sort_and_rank_clusters(clusters);
        let mut ranks: Vec<usize> = ranked.iter().map(|c| c.rank).collect();
        ranks.sort();
        assert_eq!(ranks, (1..=ranked.len()).collect::<Vec<_>>());
    }

    #[test]
    fn s2_uniqueness_under_merge() {
        let a = Cluster::new(
            "seo".into(),
            vec![kw("seo services", 100, Competition::Medium), kw("seo audit", 90, Competition::Medium)],
            "kmeans",
        );
        let b = Cluster::new(
            "marketing".into(),
            vec![kw("seo services", 100, Competition::Medium), kw("content marketing", 80, Competition::Medium)],
            "kmeans",
        );
        let resolved = ensure_unique_keywords(vec![a, b], 1);
        let a_has = resolved[0].contains_keyword("seo services");
        let b_has = resolved.get(1).map(|c| c.contains_keyword("seo services")).unwrap_or(false);
        assert!(a_has && !b_has, "expected seo services to stay only in the seo cluster");
    }

    #[test]
    fn s3_relevance_filtering_drops_irrelevant_keyword() {
        let cluster = Cluster::new(
            "dental cleaning".into(),
            vec![kw("dental cleaning", 500, Competition::Low), kw("car insurance", 1000, Competition::High)],
            "hybrid",
        );
        let context = RelevanceContext::build(&["example.com/dentistry", "Family Dentistry in Zurich"]);
        let filtered = apply_relevance_scores(vec![cluster], &context, 1);
        assert!(!filtered.iter().any(|c| c.contains_keyword("car insurance")));
    }

    #[test]
    fn boundary_below_min_cluster_size_yields_one_cluster() {
        let keywords = vec![kw("a", 1, Competition::Low), kw("b", 1, Competition::Low)];
        let clusters = cluster_keywords(keywords, ClusterAlgorithm::Hybrid, 5);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].keyword_count(), 2);
    }

    #[test]
    fn boundary_zero_keywords_yields_empty() {
        let clusters = cluster_keywords(Vec::new(), ClusterAlgorithm::Hybrid, 3);
        assert!(clusters.is_empty());
    }

    #[test]
    fn ensure_unique_keywords_is_idempotent_on_unique_input() {
        let clusters = cluster_keywords(s1_keywords(), ClusterAlgorithm::Hybrid, 2);
        let again = ensure_unique_keywords(clusters.clone(), 2);
        let total_before: usize = clusters.iter().map(|c| c.keyword_count()).sum();
        let total_after: usize = again.iter().map(|c| c.keyword_count()).sum();
        assert_eq!(total_before, total_after);
    }
}
