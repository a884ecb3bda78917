//! Cluster refinement passes used by the `hybrid` algorithm (spec.md §4.7.3).

use super::kmeans;
use super::vectorize::Vectorizer;
use crate::core::types::{Cluster, Keyword};
use crate::textkit::similarity;

const MERGE_THRESHOLD: f64 = 0.6;
const SPLIT_COHERENCE_THRESHOLD: f64 = 0.3;
const SPLIT_SIZE_THRESHOLD: usize = 10;
const MIXED_SIZE_THRESHOLD: usize = 30;
const COHERENCE_SAMPLE: usize = 10;

/// Average pairwise similarity over up to the first 10 keywords.
pub fn coherence(cluster: &Cluster) -> f64 {
    let sample: Vec<&Keyword> = cluster.keywords.iter().take(COHERENCE_SAMPLE).collect();
    if sample.len() < 2 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..sample.len() {
        for j in (i + 1)..sample.len() {
            total += similarity(&sample[i].text, &sample[j].text);
            pairs += 1;
        }
    }
    if pairs == 0 {
        1.0
    } else {
        total / pairs as f64
    }
}

fn pillar_for(keywords: &[Keyword]) -> String {
    super::select_pillar(keywords)
}

/// `splitCluster`: re-run k-means on the cluster's own vectors with
/// `k = min(3, floor(size/5))`. If any resulting sub-cluster falls below
/// `min_cluster_size`, the split is abandoned and the original is kept.
pub fn split_cluster(cluster: &Cluster, min_cluster_size: usize) -> Vec<Cluster> {
    let k = (cluster.keyword_count() / 5).min(3);
    if k < 2 {
        return vec![cluster.clone()];
    }

    let vectorizer = Vectorizer::new(&cluster.keywords);
    let vectors = vectorizer.vectorize_all(&cluster.keywords);
    let assignments = kmeans::kmeans(&vectors, k);

    let mut groups: Vec<Vec<Keyword>> = vec![Vec::new(); k];
    for (keyword, assignment) in cluster.keywords.iter().zip(assignments.iter()) {
        groups[*assignment].push(keyword.clone());
    }
    groups.retain(|g| !g.is_empty());

    if groups.iter().any(|g| g.len() < min_cluster_size) {
        return vec![cluster.clone()];
    }

    groups
        .into_iter()
        .map(|members| {
            let pillar = pillar_for(&members);
            Cluster::new(pillar, members, &cluster.algorithm)
        })
        .collect()
}

/// `refineWithSemantics`: clusters with coherence < 0.3 and size > 10 are
/// split; everything else is kept as-is.
pub fn refine_with_semantics(clusters: Vec<Cluster>, min_cluster_size: usize) -> Vec<Cluster> {
    let mut out = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        if coherence(&cluster) < SPLIT_COHERENCE_THRESHOLD && cluster.keyword_count() > SPLIT_SIZE_THRESHOLD {
            out.extend(split_cluster(&cluster, min_cluster_size));
        } else {
            out.push(cluster);
        }
    }
    out
}

/// `splitMixedClusters`: any cluster with size > 30 is split.
pub fn split_mixed_clusters(clusters: Vec<Cluster>, min_cluster_size: usize) -> Vec<Cluster> {
    let mut out = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        if cluster.keyword_count() > MIXED_SIZE_THRESHOLD {
            out.extend(split_cluster(&cluster, min_cluster_size));
        } else {
            out.push(cluster);
        }
    }
    out
}

fn top5_cross_similarity(a: &[Keyword], b: &[Keyword]) -> f64 {
    let top_a: Vec<&Keyword> = a.iter().take(5).collect();
    let top_b: Vec<&Keyword> = b.iter().take(5).collect();
    if top_a.is_empty() || top_b.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    let mut count = 0usize;
    for x in &top_a {
        for y in &top_b {
            total += similarity(&x.text, &y.text);
            count += 1;
        }
    }
    total / count as f64
}

fn cluster_similarity(a: &Cluster, b: &Cluster) -> f64 {
    0.4 * similarity(&a.pillar_topic, &b.pillar_topic) + 0.6 * top5_cross_similarity(&a.keywords, &b.keywords)
}

/// `mergeSimilarClusters`: pairwise merge when `clusterSimilarity > 0.6`,
/// folding the later cluster into the earlier one and recomputing metrics.
pub fn merge_similar_clusters(mut clusters: Vec<Cluster>) -> Vec<Cluster> {
    loop {
        let mut merge_pair: Option<(usize, usize)> = None;
        'outer: for i in 0..clusters.len() {
            for j in (i + 1)..clusters.len() {
                if cluster_similarity(&clusters[i], &clusters[j]) > MERGE_THRESHOLD {
                    merge_pair = Some((i, j));
                    break 'outer;
                }
            }
        }

        match merge_pair {
            Some((i, j)) => {
                let absorbed = clusters.remove(j);
                clusters[i].keywords.extend(absorbed.keywords);
                clusters[i].recompute_metrics();
            }
            None => break,
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Competition;

    fn kw(text: &str, volume: u64) -> Keyword {
        Keyword { text: text.into(), search_volume: volume, competition: Competition::Medium, cpc_low: 1.0, cpc_high: 2.0 }
    }

    #[test]
    fn coherence_of_identical_keywords_is_one() {
        let cluster = Cluster::new("seo".into(), vec![kw("seo", 10), kw("seo", 10)], "hybrid");
        assert!((coherence(&cluster) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn merge_combines_near_duplicate_clusters() {
        let a = Cluster::new("seo services".into(), vec![kw("seo services", 100), kw("seo audit", 90), kw("seo help", 80)], "hybrid");
        let b = Cluster::new("seo service".into(), vec![kw("seo service", 95), kw("seo tips", 70), kw("seo advice", 60)], "hybrid");
        let merged = merge_similar_clusters(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].keyword_count(), 6);
    }

    #[test]
    fn split_cluster_falls_back_when_too_small() {
        let cluster = Cluster::new("misc".into(), vec![kw("a", 1), kw("b", 1), kw("c", 1)], "hybrid");
        let result = split_cluster(&cluster, 3);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].keyword_count(), 3);
    }
}
