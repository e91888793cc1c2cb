//! Read-only view of a rendered document
//!
//! Extractors only ever ask two things of a page: "which nodes match this
//! selector" and "what is this node's text or attribute". [`Document`] is that
//! capability; [`HtmlDocument`] backs it with a `scraper` parse of the HTML the
//! browser rendered.

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::warn;

/// A matched element, detached from the tree it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    tag: String,
    text: String,
    raw_text: String,
    inner_html: String,
    attrs: BTreeMap<String, String>,
}

impl Node {
    /// Lowercase element name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Visible text with whitespace collapsed; script and style content excluded
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text content exactly as it appears in the tree, including script bodies
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Selector-based queries over a rendered page
pub trait Document {
    /// All matches in document order. Invalid selectors match nothing.
    fn find_all(&self, selector: &str) -> Vec<Node>;

    fn find_first(&self, selector: &str) -> Option<Node> {
        self.find_all(selector).into_iter().next()
    }
}

/// Parsed HTML snapshot of a page or frame
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument").finish_non_exhaustive()
    }
}

impl Document for HtmlDocument {
    fn find_all(&self, selector: &str) -> Vec<Node> {
        let selector = match Selector::parse(selector) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Ignoring invalid selector '{}': {}", selector, e);
                return Vec::new();
            }
        };

        self.html.select(&selector).map(to_node).collect()
    }
}

fn to_node(element: ElementRef<'_>) -> Node {
    let value = element.value();
    Node {
        tag: value.name().to_ascii_lowercase(),
        text: visible_text(element),
        raw_text: element.text().collect(),
        inner_html: element.inner_html(),
        attrs: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if !hidden {
            parts.push(text);
        }
    }

    parts
        .iter()
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
          <title>Careers | AEI</title>
          <meta property="og:title" content="Engineering Data Analyst">
        </head><body>
          <h1 class="title">  Engineering
             Data <em>Analyst</em> </h1>
          <div id="x">Visible<script>var hidden = 1;</script><style>.a{}</style> text</div>
          <dl><dt>Category</dt><dd>Engineering</dd></dl>
        </body></html>
    "#;

    #[test]
    fn text_is_collapsed_and_skips_scripts() {
        let doc = HtmlDocument::parse(PAGE);
        let h1 = doc.find_first("h1").unwrap();
        assert_eq!(h1.text(), "Engineering Data Analyst");
        assert_eq!(h1.tag(), "h1");
        assert_eq!(h1.attr("class"), Some("title"));

        let div = doc.find_first("#x").unwrap();
        assert_eq!(div.text(), "Visible text");
        assert!(div.raw_text().contains("var hidden"));
    }

    #[test]
    fn selector_lists_come_back_in_document_order() {
        let doc = HtmlDocument::parse(PAGE);
        let tags: Vec<String> = doc
            .find_all("dd, dt")
            .iter()
            .map(|n| n.tag().to_string())
            .collect();
        assert_eq!(tags, vec!["dt", "dd"]);
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = HtmlDocument::parse(PAGE);
        assert!(doc.find_all("h1[").is_empty());
        assert!(doc.find_first("article").is_none());
    }

    #[test]
    fn reads_meta_attributes() {
        let doc = HtmlDocument::parse(PAGE);
        let meta = doc.find_first("meta[property='og:title']").unwrap();
        assert_eq!(meta.attr("content"), Some("Engineering Data Analyst"));
    }
}
