//! DBSCAN over a custom text/volume distance (spec.md §4.7.2).

use crate::core::types::Keyword;
use crate::textkit::similarity;

const EPS: f64 = 0.3;
const MIN_PTS: usize = 2;

fn distance(a: &Keyword, b: &Keyword) -> f64 {
    let text_component = 1.0 - similarity(&a.text, &b.text);
    let volume_component =
        0.2 * ((a.search_volume as f64 + 1.0).ln() - (b.search_volume as f64 + 1.0).ln()).abs() / 10.0;
    text_component + volume_component
}

fn neighbors(index: usize, distances: &[Vec<f64>]) -> Vec<usize> {
    distances[index]
        .iter()
        .enumerate()
        .filter(|(j, d)| *j != index && **d <= EPS)
        .map(|(j, _)| j)
        .collect()
}

/// Returns a per-point label: `Some(cluster_id)` or `None` for noise.
fn label_points(distances: &[Vec<f64>]) -> Vec<Option<usize>> {
    let n = distances.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut next_cluster = 0usize;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let mut neighbor_set = neighbors(i, distances);
        if neighbor_set.len() + 1 < MIN_PTS {
            continue;
        }

        let cluster_id = next_cluster;
        next_cluster += 1;
        labels[i] = Some(cluster_id);

        let mut queue = neighbor_set.clone();
        let mut queued: std::collections::HashSet<usize> = neighbor_set.drain(..).collect();
        let mut qi = 0;
        while qi < queue.len() {
            let j = queue[qi];
            qi += 1;
            if !visited[j] {
                visited[j] = true;
                let j_neighbors = neighbors(j, distances);
                if j_neighbors.len() + 1 >= MIN_PTS {
                    for candidate in j_neighbors {
                        if queued.insert(candidate) {
                            queue.push(candidate);
                        }
                    }
                }
            }
            if labels[j].is_none() {
                labels[j] = Some(cluster_id);
            }
        }
    }

    labels
}

/// Runs DBSCAN and resolves noise points per spec.md §4.7.2, returning final
/// keyword groups (each group is what becomes one cluster).
pub fn run(keywords: Vec<Keyword>, min_cluster_size: usize) -> Vec<Vec<Keyword>> {
    let n = keywords.len();
    if n == 0 {
        return Vec::new();
    }

    let mut distances = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distance(&keywords[i], &keywords[j]);
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }

    let labels = label_points(&distances);
    let cluster_count = labels.iter().filter_map(|l| *l).max().map(|m| m + 1).unwrap_or(0);

    let mut groups: Vec<Vec<Keyword>> = vec![Vec::new(); cluster_count];
    let mut noise_indices = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        match label {
            Some(cluster_id) => groups[*cluster_id].push(keywords[i].clone()),
            None => noise_indices.push(i),
        }
    }

    let mut misc = Vec::new();
    for i in noise_indices {
        let candidate = &keywords[i];
        let best = groups
            .iter()
            .enumerate()
            .map(|(gi, group)| (gi, top5_avg_similarity(candidate, group)))
            .filter(|(_, sim)| *sim > 0.3)
            .fold(None, |best: Option<(usize, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });

        match best {
            Some((gi, _)) => groups[gi].push(candidate.clone()),
            None => misc.push(candidate.clone()),
        }
    }

    if misc.len() >= min_cluster_size {
        groups.push(misc);
    } else {
        // Too few to stand alone: fold back into the largest group, if any exists.
        if let Some(largest) = groups.iter_mut().max_by_key(|g| g.len()) {
            largest.extend(misc);
        } else if !misc.is_empty() {
            groups.push(misc);
        }
    }

    groups.retain(|g| !g.is_empty());
    groups
}

fn top5_avg_similarity(candidate: &Keyword, group: &[Keyword]) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    let top5 = group.iter().take(5);
    let sims: Vec<f64> = top5.map(|k| similarity(&candidate.text, &k.text)).collect();
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
    fn groups_similar_keywords_together() {
        let keywords = vec![
            kw("seo services", 100),
            kw("seo optimization", 90),
            kw("seo audit", 80),
            kw("bakery recipes", 50),
            kw("bread recipes", 45),
        ];
        let groups = run(keywords, 2);
        assert!(groups.iter().any(|g| g.len() >= 2));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(run(Vec::new(), 3).is_empty());
    }
}
