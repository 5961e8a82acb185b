//! Document body text extraction.
//!
//! Walks the `<body>` subtree and collects every non-empty, trimmed text
//! node, joined with newlines. Script-like elements contribute nothing.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text is never part of the readable page content.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Extract the body text of an HTML document. Returns an empty string for
/// documents without a `<body>` or without visible text.
pub fn extract_body_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let body_sel = Selector::parse("body").unwrap();

    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };

    let mut lines = Vec::new();
    collect_text(body, &mut lines);
    lines.join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}
