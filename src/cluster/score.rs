//! `clusterValueScore` (spec.md §4.7.7): a pure function of a cluster's
//! keywords and relevance score.

use crate::core::types::Cluster;

/// Computes `clusterValueScore`, clamped to `[0, 100]` and rounded.
pub fn cluster_value_score(cluster: &Cluster) -> f64 {
    let total_volume_score = (((cluster.total_search_volume as f64) + 1.0).log10() * 20.0).min(40.0);
    let avg_volume_score = ((cluster.avg_search_volume + 1.0).ln() * 10.0).min(25.0);

    let avg_competition_value = cluster.avg_competition.weight();
    let competition_score = (1.0 - ((avg_competition_value - 1.0) / 2.0).clamp(0.0, 1.0)) * 20.0;
    let competition_score = competition_score.clamp(0.0, 20.0);

    let size_score = ((1.0 + cluster.keyword_count() as f64).ln() * 4.0).min(10.0);
    let relevance_component = cluster.relevance_score * 25.0;

    let total = total_volume_score + avg_volume_score + competition_score + size_score + relevance_component;
    total.clamp(0.0, 100.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Competition, Keyword};

    fn kw(text: &str, volume: u64, competition: Competition) -> Keyword {
        Keyword { text: text.into(), search_volume: volume, competition, cpc_low: 1.0, cpc_high: 2.0 }
    }

    #[test]
    fn score_is_within_bounds() {
        let cluster = Cluster::new(
            "seo services".into(),
            vec![
                kw("seo services", 10000, Competition::High),
                kw("seo audit", 5000, Competition::Medium),
                kw("seo consultant", 3000, Competition::Low),
            ],
            "hybrid",
        );
        let score = cluster_value_score(&cluster);
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn higher_volume_scores_at_least_as_high() {
        let small = Cluster::new("topic".into(), vec![kw("topic", 10, Competition::Medium)], "hybrid");
        let large = Cluster::new("topic".into(), vec![kw("topic", 100_000, Competition::Medium)], "hybrid");
        assert!(cluster_value_score(&large) >= cluster_value_score(&small));
    }
}
