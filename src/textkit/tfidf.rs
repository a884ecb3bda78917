use std::collections::HashMap;

/// TF-IDF scorer over a fixed document set (spec.md §4.1).
/// `tf = termCount / docLen`, `idf = ln((N+1)/(df+1)) + 1`.
pub struct TfIdf {
    doc_tokens: Vec<Vec<String>>,
    doc_freq: HashMap<String, usize>,
}

impl TfIdf {
    pub fn new(documents: &[String]) -> Self {
        let doc_tokens: Vec<Vec<String>> = documents.iter().map(|d| super::stemmed_tokens(d)).collect();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for tokens in &doc_tokens {
            let unique: std::collections::HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }
        Self { doc_tokens, doc_freq }
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.doc_tokens.len() as f64;
        let df = *self.doc_freq.get(term).unwrap_or(&0) as f64;
        ((n + 1.0) / (df + 1.0)).ln() + 1.0
    }

    /// (term, tfidf) pairs for one document, sorted by weight descending.
    pub fn list_terms(&self, doc_index: usize) -> Vec<(String, f64)> {
        let Some(tokens) = self.doc_tokens.get(doc_index) else {
            return Vec::new();
        };
        if tokens.is_empty() {
            return Vec::new();
        }
        let doc_len = tokens.len() as f64;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for t in tokens {
            *counts.entry(t.as_str()).or_insert(0) += 1;
        }

        let mut out: Vec<(String, f64)> = counts
            .into_iter()
            .map(|(term, count)| {
                let tf = count as f64 / doc_len;
                (term.to_string(), tf * self.idf(term))
            })
            .collect();
        out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    /// Max tfidf weight for a single term within one document — used by the
    /// seed-keyword fallback scorer (spec.md §4.5).
    pub fn max_weight(&self, doc_index: usize) -> f64 {
        self.list_terms(doc_index).first().map(|(_, w)| *w).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_decreases_with_document_frequency() {
        let docs = vec![
            "web development services".to_string(),
            "web design services".to_string(),
            "bakery recipes".to_string(),
        ];
        let tfidf = TfIdf::new(&docs);
        let terms0: HashMap<String, f64> = tfidf.list_terms(0).into_iter().collect();
        // "web" and "servic" appear in 2/3 docs, "development" in 1/3 -> development should score higher.
        let development = terms0.get("development").copied().unwrap_or(0.0);
        let web = terms0.get("web").copied().unwrap_or(0.0);
        assert!(development > web, "development={development} web={web}");
    }

    #[test]
    fn empty_document_has_no_terms() {
        let docs = vec!["".to_string(), "content here".to_string()];
        let tfidf = TfIdf::new(&docs);
        assert!(tfidf.list_terms(0).is_empty());
    }
}
