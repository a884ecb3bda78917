//! K-means over dense feature vectors (spec.md §4.7.2): k-means++ init,
//! at most 100 iterations, convergence tolerance 1e-4.

use super::vectorize::{centroid, euclidean_distance};
use rand::RngExt;

pub const MIN_CLUSTERS: usize = 3;
pub const MAX_CLUSTERS: usize = 20;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-4;

/// `k = clamp(floor(sqrt(n/2)), [MIN_CLUSTERS, MAX_CLUSTERS])`.
pub fn choose_k(n: usize) -> usize {
    let raw = ((n as f64 / 2.0).sqrt()).floor() as usize;
    raw.clamp(MIN_CLUSTERS, MAX_CLUSTERS).min(n.max(1))
}

fn kmeans_plus_plus_init(vectors: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let mut rng = rand::rng();
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    let first = rng.random_range(0..vectors.len());
    centroids.push(vectors[first].clone());

    while centroids.len() < k {
        let distances: Vec<f64> = vectors
            .iter()
            .map(|v| {
                centroids
                    .iter()
                    .map(|c| euclidean_distance(v, c))
                    .fold(f64::INFINITY, f64::min)
                    .powi(2)
            })
            .collect();
        let total: f64 = distances.iter().sum();
        if total <= 0.0 {
            let idx = rng.random_range(0..vectors.len());
            centroids.push(vectors[idx].clone());
            continue;
        }
        let mut target = rng.random_range(0.0..total);
        let mut chosen = vectors.len() - 1;
        for (i, d) in distances.iter().enumerate() {
            if target < *d {
                chosen = i;
                break;
            }
            target -= d;
        }
        centroids.push(vectors[chosen].clone());
    }
    centroids
}

/// Runs k-means, returning the cluster index assigned to each input vector.
/// `k` is clamped to `[1, vectors.len()]`.
pub fn kmeans(vectors: &[Vec<f64>], k: usize) -> Vec<usize> {
    if vectors.is_empty() {
        return Vec::new();
    }
    let k = k.clamp(1, vectors.len());
    if k == 1 {
        return vec![0; vectors.len()];
    }
    let dims = vectors[0].len();

    let mut centroids = kmeans_plus_plus_init(vectors, k);
    let mut assignments = vec![0usize; vectors.len()];

    for _ in 0..MAX_ITERATIONS {
        for (i, v) in vectors.iter().enumerate() {
            let (best, _) = centroids
                .iter()
                .enumerate()
                .map(|(ci, c)| (ci, euclidean_distance(v, c)))
                .fold((0usize, f64::INFINITY), |acc, cur| if cur.1 < acc.1 { cur } else { acc });
            assignments[i] = best;
        }

        let mut max_shift = 0.0f64;
        for ci in 0..k {
            let members: Vec<&Vec<f64>> =
                vectors.iter().zip(assignments.iter()).filter(|(_, a)| **a == ci).map(|(v, _)| v).collect();
            if members.is_empty() {
                continue;
            }
            let new_centroid = centroid(&members, dims);
            let shift = euclidean_distance(&new_centroid, &centroids[ci]);
            if shift > max_shift {
                max_shift = shift;
            }
            centroids[ci] = new_centroid;
        }

        if max_shift < TOLERANCE {
            break;
        }
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choose_k_respects_bounds() {
        assert_eq!(choose_k(0), MIN_CLUSTERS.min(1));
        assert_eq!(choose_k(8), MIN_CLUSTERS);
        assert_eq!(choose_k(10000), MAX_CLUSTERS);
    }

    #[test]
    fn kmeans_separates_obvious_clusters() {
        let vectors = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
        ];
        let assignments = kmeans(&vectors, 2);
        assert_eq!(assignments[0], assignments[1]);
        assert_eq!(assignments[2], assignments[3]);
        assert_ne!(assignments[0], assignments[2]);
    }

    #[test]
    fn kmeans_k_one_assigns_all_to_single_cluster() {
        let vectors = vec![vec![0.0], vec![5.0], vec![10.0]];
        let assignments = kmeans(&vectors, 1);
        assert!(assignments.iter().all(|a| *a == 0));
    }
}
