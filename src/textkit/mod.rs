//! Pure, dependency-free text primitives shared by seed generation and clustering
//! (spec.md §4.1). No I/O, no shared mutable state — safe to call from any task.

mod tfidf;
mod stopwords;

pub use stopwords::STOP_WORDS;
pub use tfidf::TfIdf;

/// Lower-case, Unicode letter/digit runs. Empty input yields an empty vec.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in lower.chars() {
        if ch.is_alphanumeric() {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn contains_vowel(s: &str) -> bool {
    s.chars().any(is_vowel)
}

/// Collapse a double trailing consonant to one, e.g. "runn" -> "run".
fn undouble_consonant(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() >= 2 {
        let last = chars[chars.len() - 1];
        let second_last = chars[chars.len() - 2];
        if last == second_last && !is_vowel(last) {
            return chars[..chars.len() - 1].iter().collect();
        }
    }
    chars.into_iter().collect()
}

/// Light suffix-stripping stemmer (spec.md §4.1). Tokens shorter than 4 chars
/// are returned unchanged; at most one rule fires per token.
pub fn stem(token: &str) -> String {
    let lower = token.to_lowercase();
    if lower.chars().count() < 4 {
        return lower;
    }

    if lower.ends_with("ies") && lower.len() > 4 {
        return format!("{}y", &lower[..lower.len() - 3]);
    }

    for suffix in ["sses", "shes", "ches", "xes"] {
        if lower.ends_with(suffix) {
            return lower[..lower.len() - 2].to_string();
        }
    }

    if lower.ends_with("ing") && lower.len() > 3 + 3 {
        let stripped = &lower[..lower.len() - 3];
        if contains_vowel(stripped) {
            return undouble_consonant(stripped);
        }
    }

    if lower.ends_with("ed") && lower.len() > 3 + 2 {
        let stripped = &lower[..lower.len() - 2];
        if contains_vowel(stripped) {
            return undouble_consonant(stripped);
        }
    }

    if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 4 {
        return lower[..lower.len() - 1].to_string();
    }

    lower
}

/// Tokenize then stem every token.
pub fn stemmed_tokens(text: &str) -> Vec<String> {
    tokenize(text).iter().map(|t| stem(t)).collect()
}

/// Stemmed tokens with stop words removed — used wherever content tokens
/// (as opposed to raw tokens) are required, e.g. relevance scoring.
pub fn content_tokens(text: &str) -> Vec<String> {
    stemmed_tokens(text)
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Similarity in [0,1]: max of Jaccard-on-stemmed-tokens with two bonuses
/// (spec.md §4.1): +0.3 if one string contains the other; +0.2 if last tokens
/// match (both multi-word) else +0.15 if first tokens match; capped at 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;

    let tokens_a: HashSet<String> = stemmed_tokens(a).into_iter().collect();
    let tokens_b: HashSet<String> = stemmed_tokens(b).into_iter().collect();

    let jaccard = if tokens_a.is_empty() && tokens_b.is_empty() {
        1.0
    } else {
        let intersection = tokens_a.intersection(&tokens_b).count() as f64;
        let union = tokens_a.union(&tokens_b).count() as f64;
        if union == 0.0 {
            0.0
        } else {
            intersection / union
        }
    };

    let mut score = jaccard;

    let la = a.trim().to_lowercase();
    let lb = b.trim().to_lowercase();
    if !la.is_empty() && !lb.is_empty() && (la.contains(&lb) || lb.contains(&la)) {
        score += 0.3;
    }

    let words_a: Vec<&str> = la.split_whitespace().collect();
    let words_b: Vec<&str> = lb.split_whitespace().collect();
    if words_a.len() > 1 && words_b.len() > 1 {
        if words_a.last() == words_b.last() {
            score += 0.2;
        } else if words_a.first() == words_b.first() {
            score += 0.15;
        }
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn tokenize_splits_on_non_alphanumeric() {
        assert_eq!(tokenize("SEO-Optimization, Fast!"), vec!["seo", "optimization", "fast"]);
    }

    #[test]
    fn stem_short_tokens_unchanged() {
        assert_eq!(stem("cat"), "cat");
        assert_eq!(stem("ad"), "ad");
    }

    #[test]
    fn stem_plural_ies() {
        assert_eq!(stem("companies"), "company");
    }

    #[test]
    fn stem_ing_with_double_consonant() {
        assert_eq!(stem("running"), "run");
    }

    #[test]
    fn stem_trailing_s() {
        assert_eq!(stem("keywords"), "keyword");
    }

    #[test]
    fn stem_ss_not_stripped() {
        assert_eq!(stem("glass"), "glass");
    }

    #[test]
    fn similarity_reflexive() {
        for s in ["web development", "seo", "", "a b c d"] {
            assert!((similarity(s, s) - 1.0).abs() < 1e-9, "similarity({s:?}, {s:?})");
        }
    }

    #[test]
    fn similarity_symmetric() {
        let pairs = [("seo services", "seo audit"), ("web design", "digital marketing")];
        for (a, b) in pairs {
            assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn similarity_substring_bonus() {
        let s = similarity("seo", "seo services");
        assert!(s > 0.3);
    }

    #[test]
    fn similarity_shared_last_token() {
        let s = similarity("seo services company", "web design company");
        let base = similarity("seo services", "web design");
        assert!(s >= base);
    }
}
