//! Extraction passes over a rendered [`Document`]
//!
//! - `structured` reads schema.org `JobPosting` JSON-LD blocks
//! - `fallback` fills whatever is still missing from the visible tree
//!
//! Both passes express their heuristics as ordered [`Locator`] lists so the
//! priority of each source is visible in one place.

mod fallback;
mod structured;

pub use fallback::{FallbackReport, definition_pairs, fill_from_dom};
pub use structured::{StructuredExtraction, extract_structured};

use crate::document::Document;

/// One way of finding a raw value in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Visible text of the first non-empty match
    Text(&'static str),
    /// Inner HTML of the first match whose visible text has at least `min_chars` characters
    Block {
        selector: &'static str,
        min_chars: usize,
    },
    /// Attribute value of the first match carrying a non-empty value
    Attr {
        selector: &'static str,
        attr: &'static str,
    },
    /// `<dd>` whose preceding `<dt>` label contains one of the keywords
    Labelled(&'static [&'static str]),
    /// First `<dd>` that reads like a place: has a comma or mentions remote work
    PlaceLike,
}

impl Locator {
    /// Raw, unnormalized value, or `None` if this locator finds nothing
    pub fn locate(&self, doc: &dyn Document) -> Option<String> {
        match *self {
            Locator::Text(selector) => doc
                .find_all(selector)
                .into_iter()
                .map(|node| node.text().to_string())
                .find(|text| !text.is_empty()),
            Locator::Block {
                selector,
                min_chars,
            } => doc
                .find_all(selector)
                .into_iter()
                .find(|node| node.text().chars().count() >= min_chars)
                .map(|node| node.inner_html().to_string()),
            Locator::Attr { selector, attr } => doc
                .find_all(selector)
                .into_iter()
                .filter_map(|node| node.attr(attr).map(str::trim).map(str::to_string))
                .find(|value| !value.is_empty()),
            Locator::Labelled(keywords) => definition_pairs(doc)
                .into_iter()
                .find(|(label, _)| {
                    let label = label.to_lowercase();
                    keywords.iter().any(|k| label.contains(k))
                })
                .map(|(_, value)| value),
            Locator::PlaceLike => doc
                .find_all("dd")
                .into_iter()
                .map(|node| node.text().to_string())
                .find(|text| text.contains(',') || text.to_lowercase().contains("remote")),
        }
    }

    /// Short label for logs and traces
    pub fn describe(&self) -> String {
        match self {
            Locator::Text(selector) => format!("text({selector})"),
            Locator::Block { selector, .. } => format!("block({selector})"),
            Locator::Attr { selector, attr } => format!("attr({selector}@{attr})"),
            Locator::Labelled(keywords) => format!("label({})", keywords.join("|")),
            Locator::PlaceLike => "place-like <dd>".to_string(),
        }
    }
}

/// Try locators in order; the first whose raw value survives `normalize` wins
///
/// Returns the index of the winning locator alongside the normalized value.
pub fn first_match<T>(
    doc: &dyn Document,
    locators: &[Locator],
    normalize: impl Fn(&str) -> Option<T>,
) -> Option<(usize, T)> {
    locators.iter().enumerate().find_map(|(idx, locator)| {
        let raw = locator.locate(doc)?;
        normalize(&raw).map(|value| (idx, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    const PAGE: &str = r#"
        <html><head>
          <title>Data Analyst | Careers</title>
          <meta property="og:title" content="  ">
          <meta name="description" content="Short summary">
        </head><body>
          <h1></h1>
          <h1>Engineering Data Analyst</h1>
          <dl>
            <dt>Job Locations</dt><dd>US-PA-Pittsburgh, Pittsburgh</dd>
            <dt>Position Type:</dt><dd>Full Time</dd>
          </dl>
        </body></html>
    "#;

    #[test]
    fn text_skips_empty_matches() {
        let doc = HtmlDocument::parse(PAGE);
        assert_eq!(
            Locator::Text("h1").locate(&doc).as_deref(),
            Some("Engineering Data Analyst")
        );
    }

    #[test]
    fn attr_skips_blank_values() {
        let doc = HtmlDocument::parse(PAGE);
        let og = Locator::Attr {
            selector: "meta[property='og:title']",
            attr: "content",
        };
        assert_eq!(og.locate(&doc), None);
    }

    #[test]
    fn labelled_matches_on_keyword() {
        let doc = HtmlDocument::parse(PAGE);
        assert_eq!(
            Locator::Labelled(&["position type"]).locate(&doc).as_deref(),
            Some("Full Time")
        );
        assert_eq!(Locator::Labelled(&["salary"]).locate(&doc), None);
    }

    #[test]
    fn first_match_respects_order_and_normalization() {
        let doc = HtmlDocument::parse(PAGE);
        let chain = [
            Locator::Text("h2"),
            Locator::Text("title"),
            Locator::Text("h1"),
        ];
        let (idx, value) = first_match(&doc, &chain, |raw| Some(raw.to_string())).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(value, "Data Analyst | Careers");

        // A locator whose value fails normalization hands over to the next one
        let (idx, _) = first_match(&doc, &chain, |raw| {
            (!raw.contains('|')).then(|| raw.to_string())
        })
        .unwrap();
        assert_eq!(idx, 2);
    }

    #[test]
    fn place_like_dd() {
        let doc = HtmlDocument::parse(PAGE);
        assert_eq!(
            Locator::PlaceLike.locate(&doc).as_deref(),
            Some("US-PA-Pittsburgh, Pittsburgh")
        );
    }
}
