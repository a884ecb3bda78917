//! Greedy center-first clustering (spec.md §4.7.2 "Semantic").

use crate::core::types::Keyword;
use crate::textkit::similarity;

const ABSORB_THRESHOLD: f64 = 0.4;
const REASSIGN_THRESHOLD: f64 = 0.3;

pub fn run(mut keywords: Vec<Keyword>, min_cluster_size: usize) -> Vec<Vec<Keyword>> {
    keywords.sort_by(|a, b| b.search_volume.cmp(&a.search_volume));

    let n = keywords.len();
    let mut assigned = vec![false; n];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for i in 0..n {
        if assigned[i] {
            continue;
        }
        let mut members = vec![i];
        assigned[i] = true;
        for j in 0..n {
            if assigned[j] {
                continue;
            }
            if similarity(&keywords[i].text, &keywords[j].text) > ABSORB_THRESHOLD {
                members.push(j);
                assigned[j] = true;
            }
        }
        clusters.push(members);
    }

    let mut kept: Vec<Vec<usize>> = Vec::new();
    let mut released: Vec<usize> = Vec::new();
    for cluster in clusters {
        if cluster.len() >= min_cluster_size {
            kept.push(cluster);
        } else {
            released.extend(cluster);
        }
    }

    let mut misc: Vec<usize> = Vec::new();
    for idx in released {
        let best = kept
            .iter()
            .enumerate()
            .map(|(ci, members)| (ci, avg_similarity(&keywords[idx], members, &keywords)))
            .filter(|(_, sim)| *sim > REASSIGN_THRESHOLD)
            .fold(None, |best: Option<(usize, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });
        match best {
            Some((ci, _)) => kept[ci].push(idx),
            None => misc.push(idx),
        }
    }

    if misc.len() >= min_cluster_size {
        kept.push(misc);
    } else if !misc.is_empty() {
        if let Some(largest) = kept.iter_mut().max_by_key(|c| c.len()) {
            largest.extend(misc);
        } else {
            kept.push(misc);
        }
    }

    kept.into_iter()
        .map(|members| members.into_iter().map(|idx| keywords[idx].clone()).collect())
        .collect()
}

fn avg_similarity(candidate: &Keyword, members: &[usize], keywords: &[Keyword]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let sims: Vec<f64> = members.iter().take(5).map(|&idx| similarity(&candidate.text, &keywords[idx].text)).collect();
    sims.iter().sum::<f64>() / sims.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Competition;

    fn kw(text: &str, volume: u64) -> Keyword {
        Keyword { text: text.into(), search_volume: volume, competition: Competition::Medium, cpc_low: 1.0, cpc_high: 2.0 }
    }

    #[test]
    fn groups_keywords_by_similarity() {
        let keywords = vec![
            kw("seo services", 1000),
            kw("seo services near me", 500),
            kw("seo audit", 400),
            kw("bakery recipes", 300),
            kw("bread baking recipes", 250),
        ];
        let groups = run(keywords, 2);
        assert!(!groups.is_empty());
        assert!(groups.iter().all(|g| g.len() >= 2));
    }

    #[test]
    fn below_min_size_merges_into_misc_or_largest() {
        let keywords = vec![kw("alpha", 10), kw("beta", 9), kw("gamma", 8)];
        let groups = run(keywords, 5);
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, 3);
    }
}
