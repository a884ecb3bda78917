/// Fixed, small stop-word set: generic English + navigation terms and their stems
/// (spec.md §4.1). Used to drop non-content tokens during relevance scoring and
/// the deterministic seed-keyword fallback.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "with", "this", "that",
    "from", "have", "has", "will", "can", "about", "our", "more", "than", "then",
    "into", "out", "use", "used", "using", "all", "any", "get", "got",
    "home", "page", "site", "website", "welcome", "contact", "privacy", "terms",
    "cookie", "cookies", "menu", "navigation", "nav", "search", "login", "logout",
    "sign", "signup", "subscribe", "newsletter", "copyright", "reserved", "rights",
    "click", "here", "learn", "read", "view", "see", "what", "how", "why", "who",
    "when", "where", "which", "who's", "was", "were", "been", "being", "also",
    "just", "such", "some", "each", "other", "most", "only", "own", "same", "very",
];
