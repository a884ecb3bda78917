//! Feature vectorization (spec.md §4.7.1): TF-IDF over stemmed keyword tokens
//! plus four dense features, used by k-means and by split/merge sub-clustering.

use crate::core::types::{Competition, Keyword};
use crate::textkit::{self, TfIdf};
use std::collections::{HashMap, HashSet};

pub struct Vectorizer {
    vocabulary: Vec<String>,
    tfidf: TfIdf,
}

impl Vectorizer {
    pub fn new(keywords: &[Keyword]) -> Self {
        let texts: Vec<String> = keywords.iter().map(|k| k.text.clone()).collect();
        let mut vocab: HashSet<String> = HashSet::new();
        for text in &texts {
            vocab.extend(textkit::stemmed_tokens(text));
        }
        let mut vocabulary: Vec<String> = vocab.into_iter().collect();
        vocabulary.sort();
        Self { vocabulary, tfidf: TfIdf::new(&texts) }
    }

    pub fn dimensions(&self) -> usize {
        self.vocabulary.len() + 4
    }

    /// Dense feature vector for keyword at `index`: TF-IDF weights across the
    /// shared vocabulary, then `[log(volume+1)/10, competition, wordCount/5, log(cpcLow+1)/5]`.
    pub fn vectorize(&self, index: usize, keyword: &Keyword) -> Vec<f64> {
        let weights: HashMap<String, f64> = self.tfidf.list_terms(index).into_iter().collect();
        let mut vector: Vec<f64> = self.vocabulary.iter().map(|term| *weights.get(term).unwrap_or(&0.0)).collect();

        vector.push((keyword.search_volume as f64 + 1.0).ln() / 10.0);
        vector.push(match keyword.competition {
            Competition::Low => 1.0,
            Competition::Medium | Competition::Unknown => 0.5,
            Competition::High => 0.0,
        });
        vector.push(keyword.word_count() as f64 / 5.0);
        vector.push((keyword.cpc_low + 1.0).ln() / 5.0);
        vector
    }

    pub fn vectorize_all(&self, keywords: &[Keyword]) -> Vec<Vec<f64>> {
        keywords.iter().enumerate().map(|(i, k)| self.vectorize(i, k)).collect()
    }
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

pub fn centroid(vectors: &[&Vec<f64>], dims: usize) -> Vec<f64> {
    if vectors.is_empty() {
        return vec![0.0; dims];
    }
    let mut sum = vec![0.0; dims];
    for v in vectors {
        for (i, value) in v.iter().enumerate() {
            sum[i] += value;
        }
    }
    let n = vectors.len() as f64;
    sum.into_iter().map(|s| s / n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(text: &str, volume: u64) -> Keyword {
        Keyword { text: text.into(), search_volume: volume, competition: Competition::Medium, cpc_low: 1.0, cpc_high: 2.0 }
    }

    #[test]
    fn vector_has_vocabulary_plus_four_dims() {
        let keywords = vec![kw("web design", 100), kw("web development", 50)];
        let vectorizer = Vectorizer::new(&keywords);
        let vector = vectorizer.vectorize(0, &keywords[0]);
        assert_eq!(vector.len(), vectorizer.dimensions());
    }

    #[test]
    fn euclidean_distance_zero_for_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(euclidean_distance(&v, &v), 0.0);
    }
}
