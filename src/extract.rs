//! HTML -> PageContent extraction (spec.md §4.3), grounded in the teacher's
//! `scraper`-based readability pass.

use crate::core::types::{Headings, PageContent};
use scraper::{Html, Selector};
use std::collections::HashSet;

const REMOVED_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "nav", "footer", "header", "aside"];
const REMOVED_HINTS: &[&str] = &[
    "sidebar", "menu", "navigation", "cookie", "popup", "modal", "advertisement", "ads", "comments",
];
const MAX_ANCHORS: usize = 50;

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("static selector must parse")
}

fn is_noise_element(class_and_id: &str) -> bool {
    let lower = class_and_id.to_ascii_lowercase();
    REMOVED_HINTS.iter().any(|hint| lower.contains(hint))
}

fn element_text(el: &scraper::ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn attrs_blob(el: &scraper::ElementRef<'_>) -> String {
    let mut blob = String::new();
    if let Some(c) = el.value().attr("class") {
        blob.push_str(c);
        blob.push(' ');
    }
    if let Some(id) = el.value().attr("id") {
        blob.push_str(id);
    }
    blob
}

fn is_noise_ancestry(el: &scraper::ElementRef<'_>) -> bool {
    let mut cur = Some(*el);
    while let Some(node) = cur {
        let tag = node.value().name();
        if REMOVED_TAGS.contains(&tag) {
            return true;
        }
        if is_noise_element(&attrs_blob(&node)) {
            return true;
        }
        cur = node.parent().and_then(scraper::ElementRef::wrap);
    }
    false
}

fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.clone()) {
            out.push(trimmed);
        }
    }
    out
}

fn extract_headings(doc: &Html, level: &str) -> Vec<String> {
    let sel = selector(level);
    let raw: Vec<String> = doc
        .select(&sel)
        .filter(|el| !is_noise_ancestry(el))
        .map(|el| element_text(&el))
        .collect();
    dedup_preserve_order(raw)
}

/// Parse HTML into a `PageContent` per spec.md §4.3: strips noise elements,
/// pulls title/meta/headings/paragraphs/list items/anchors/image alts, and
/// sets `word_count` over the concatenation of every extracted field.
pub fn extract(html: &str, url: &str) -> PageContent {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&selector("title"))
        .next()
        .map(|el| element_text(&el))
        .filter(|s| !s.is_empty())
        .or_else(|| doc.select(&selector("h1")).next().map(|el| element_text(&el)))
        .unwrap_or_default();

    let meta_description = doc
        .select(&selector("meta[name=description]"))
        .next()
        .and_then(|el| el.value().attr("content"))
        .or_else(|| {
            doc.select(&selector("meta[property=\"og:description\"]"))
                .next()
                .and_then(|el| el.value().attr("content"))
        })
        .unwrap_or("")
        .trim()
        .to_string();

    let headings = Headings {
        h1: extract_headings(&doc, "h1"),
        h2: extract_headings(&doc, "h2"),
        h3: extract_headings(&doc, "h3"),
    };

    let paragraph_sel = selector("p");
    let paragraphs: Vec<String> = doc
        .select(&paragraph_sel)
        .filter(|el| !is_noise_ancestry(el))
        .map(|el| element_text(&el))
        .filter(|text| text.split_whitespace().count() >= 10)
        .collect();

    let list_sel = selector("li");
    let list_items: Vec<String> = doc
        .select(&list_sel)
        .filter(|el| !is_noise_ancestry(el))
        .map(|el| element_text(&el))
        .filter(|text| text.trim().len() > 10)
        .collect();

    let anchor_sel = selector("a");
    let anchors_raw: Vec<String> = doc
        .select(&anchor_sel)
        .filter(|el| !is_noise_ancestry(el))
        .filter(|el| !matches!(el.value().attr("href"), Some(href) if href.starts_with('#')))
        .map(|el| element_text(&el))
        .filter(|text| text.trim().len() > 3)
        .collect();
    let mut anchors = dedup_preserve_order(anchors_raw);
    anchors.truncate(MAX_ANCHORS);

    let image_sel = selector("img");
    let image_alts: Vec<String> = doc
        .select(&image_sel)
        .filter_map(|el| el.value().attr("alt"))
        .map(|alt| alt.trim().to_string())
        .filter(|alt| alt.len() > 3)
        .collect();

    let word_count = [title.as_str(), meta_description.as_str()]
        .iter()
        .map(|s| s.split_whitespace().count())
        .sum::<usize>()
        + headings.iter_all().map(|s| s.split_whitespace().count()).sum::<usize>()
        + paragraphs.iter().map(|s| s.split_whitespace().count()).sum::<usize>()
        + list_items.iter().map(|s| s.split_whitespace().count()).sum::<usize>()
        + anchors.iter().map(|s| s.split_whitespace().count()).sum::<usize>()
        + image_alts.iter().map(|s| s.split_whitespace().count()).sum::<usize>();

    PageContent {
        url: url.to_string(),
        title,
        meta_description,
        headings,
        paragraphs,
        list_items,
        anchors,
        image_alts,
        word_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_meta() {
        let html = r#"<html><head><title>Acme Web Design</title>
            <meta name="description" content="We build great websites for small businesses."></head>
            <body><h1>Welcome</h1><p>This is a paragraph with more than ten words in it for sure.</p></body></html>"#;
        let page = extract(html, "https://acme.test");
        assert_eq!(page.title, "Acme Web Design");
        assert!(page.meta_description.contains("great websites"));
        assert_eq!(page.paragraphs.len(), 1);
    }

    #[test]
    fn falls_back_to_h1_when_title_missing() {
        let html = "<html><body><h1>Our Services</h1></body></html>";
        let page = extract(html, "https://acme.test");
        assert_eq!(page.title, "Our Services");
    }

    #[test]
    fn strips_nav_and_footer_content() {
        let html = r#"<html><body>
            <nav><a href="/x">Some nav link text</a></nav>
            <footer><p>Copyright notice paragraph with more than ten words here indeed.</p></footer>
            <main><p>Real content paragraph with more than ten words inside it too.</p></main>
        </body></html>"#;
        let page = extract(html, "https://acme.test");
        assert_eq!(page.paragraphs.len(), 1);
        assert!(page.anchors.is_empty());
    }

    #[test]
    fn dedups_headings_preserving_order() {
        let html = "<html><body><h2>Pricing</h2><h2>Pricing</h2><h2>Features</h2></body></html>";
        let page = extract(html, "https://acme.test");
        assert_eq!(page.headings.h2, vec!["Pricing".to_string(), "Features".to_string()]);
    }

    #[test]
    fn anchors_require_min_length_and_no_hash_href() {
        let html = r##"<html><body>
            <a href="#top">Up</a>
            <a href="/about">About Us Page</a>
            <a href="/x">Hi</a>
        </body></html>"##;
        let page = extract(html, "https://acme.test");
        assert_eq!(page.anchors, vec!["About Us Page".to_string()]);
    }

    #[test]
    fn image_alts_filtered_by_length() {
        let html = r#"<html><body>
            <img src="a.png" alt="ok">
            <img src="b.png" alt="A detailed logo">
        </body></html>"#;
        let page = extract(html, "https://acme.test");
        assert_eq!(page.image_alts, vec!["A detailed logo".to_string()]);
    }
}
