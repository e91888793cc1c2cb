use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("tag pattern is valid"));

static ESCAPED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&lt;/?[a-z][^&]*&gt;").expect("escaped tag pattern is valid"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern is valid"));

/// Backslash escapes `html2md` puts in front of markdown punctuation
static MD_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\([\\`*_{}\[\]()#+\-.!])").expect("markdown escape pattern is valid")
});

/// Clean a description into plain, lightly-marked text
///
/// Markup (including entity-escaped markup, as some portals emit inside
/// JSON-LD) is converted with `html2md`, so list items and paragraphs stay on
/// their own lines. Runs of spaces collapse, blank-line runs shrink to one.
/// Empty results are "not found".
pub fn clean_description(raw: &str) -> Option<String> {
    let mut text = raw.trim().to_string();
    if text.is_empty() {
        return None;
    }

    if ESCAPED_TAG.is_match(&text) {
        text = decode_entities(&text);
    }

    if TAG.is_match(&text) {
        text = MD_ESCAPE
            .replace_all(&html2md::parse_html(&text), "$1")
            .into_owned();
    } else if text.contains('&') {
        text = decode_entities(&text);
    }

    let lines: Vec<String> = text
        .replace("\r\n", "\n")
        .replace('\u{a0}', " ")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    let joined = BLANK_RUN.replace_all(&lines.join("\n"), "\n\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// Single-line cleanup for short fields (title, company, location, ...)
pub fn clean_inline(raw: &str) -> Option<String> {
    let decoded = if raw.contains('&') {
        decode_entities(raw)
    } else {
        raw.to_string()
    };
    let stripped = TAG.replace_all(&decoded, " ");
    let collapsed = stripped
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Map schema.org employment codes (`FULL_TIME`) and free-text variants
/// (`Full Time`, `full-time`) to one spelling; unknown values are kept, cleaned
pub fn normalize_employment_type(raw: &str) -> Option<String> {
    let cleaned = clean_inline(raw)?;
    let key = cleaned.to_ascii_lowercase().replace(['_', '-'], " ");
    let canonical = match key.as_str() {
        "full time" | "fulltime" => "Full-time",
        "part time" | "parttime" => "Part-time",
        "contractor" | "contract" => "Contractor",
        "temporary" | "temp" => "Temporary",
        "intern" | "internship" => "Intern",
        "volunteer" => "Volunteer",
        "per diem" => "Per diem",
        "other" => "Other",
        _ => return Some(cleaned),
    };
    Some(canonical.to_string())
}

fn decode_entities(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment.root_element().text().collect()
}
