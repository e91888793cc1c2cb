//! schema.org `JobPosting` extraction from JSON-LD blocks
//!
//! Every `<script type="application/ld+json">` block is parsed in document
//! order. Blocks that are not valid JSON, and job-typed objects whose fields
//! have the wrong shape, are skipped. The first well-formed `JobPosting`
//! object wins.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::normalizer::{
    PayPeriod, Salary, SalaryRange, clean_description, clean_inline, normalize_date,
    normalize_employment_type, parse_salary,
};
use crate::posting::PartialPosting;
use crate::utils::ScrapeError;

const JSONLD_SELECTOR: &str = "script[type*='ld+json']";

const JOB_POSTING_TYPE: &str = "JobPosting";

/// Keys mapped onto canonical fields; everything else overflows into `additional_info`
const MAPPED_KEYS: &[&str] = &[
    "title",
    "hiringOrganization",
    "jobLocation",
    "jobLocationType",
    "employmentType",
    "description",
    "datePosted",
    "baseSalary",
];

/// Result of the structured-data pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredExtraction {
    pub fields: PartialPosting,
    /// Whether a well-formed `JobPosting` block was found
    pub found: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Named {
    Text(String),
    Object { name: Option<String> },
}

impl Named {
    fn name(&self) -> Option<&str> {
        match self {
            Named::Text(text) => Some(text),
            Named::Object { name } => name.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostalAddress {
    address_locality: Option<String>,
    address_region: Option<String>,
    address_country: Option<Named>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Address {
    Text(String),
    Postal(PostalAddress),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Place {
    Text(String),
    Object { address: Option<Address> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
    Value(f64),
    Text(String),
}

impl Number {
    fn value(&self) -> Option<f64> {
        match self {
            Number::Value(v) => Some(*v),
            Number::Text(text) => text.trim().replace(',', "").parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuantitativeValue {
    value: Option<Number>,
    min_value: Option<Number>,
    max_value: Option<Number>,
    unit_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SalaryValue {
    Figure(Number),
    Quantitative(QuantitativeValue),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BaseSalary {
    Figure(Number),
    Monetary {
        currency: Option<String>,
        value: Option<SalaryValue>,
    },
}

/// Expected shape of a `JobPosting` object; a mismatch rejects the block
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobPostingLd {
    title: Option<String>,
    hiring_organization: Option<Named>,
    job_location: Option<OneOrMany<Place>>,
    job_location_type: Option<OneOrMany<String>>,
    employment_type: Option<OneOrMany<String>>,
    description: Option<String>,
    date_posted: Option<String>,
    base_salary: Option<BaseSalary>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Scan the document for JSON-LD and map the first `JobPosting` onto canonical fields
pub fn extract_structured(doc: &dyn Document) -> StructuredExtraction {
    let mut objects: Vec<Value> = Vec::new();

    for (index, node) in doc.find_all(JSONLD_SELECTOR).into_iter().enumerate() {
        let text = node.raw_text().trim();
        if text.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => flatten_objects(value, &mut objects),
            Err(e) => warn!(
                "{}",
                ScrapeError::MetadataParse {
                    index,
                    reason: e.to_string(),
                }
            ),
        }
    }

    debug!("Found {} JSON-LD object(s)", objects.len());

    let mut selected = None;
    for (position, object) in objects.iter().enumerate() {
        if !is_job_posting(object) {
            continue;
        }
        match JobPostingLd::deserialize(object) {
            Ok(posting) => {
                selected = Some((position, posting));
                break;
            }
            Err(e) => warn!(
                "{}",
                ScrapeError::MetadataParse {
                    index: position,
                    reason: format!("JobPosting has unexpected shape: {e}"),
                }
            ),
        }
    }

    let Some((position, posting)) = selected else {
        info!("No usable JobPosting structured data found");
        return StructuredExtraction::default();
    };

    let mut fields = map_posting(posting);

    // Scalar keys from sibling blocks (Organization, WebPage, ...) fill gaps only
    for (_, other) in objects.iter().enumerate().filter(|(i, _)| *i != position) {
        let Some(map) = other.as_object() else { continue };
        for (key, value) in map {
            if key.starts_with('@') || MAPPED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(text) = scalar_text(value) {
                fields.insert_info(key.as_str(), text);
            }
        }
    }

    info!("JobPosting structured data extracted");
    StructuredExtraction {
        fields,
        found: true,
    }
}

/// Expand top-level arrays and `@graph` containers into individual objects
fn flatten_objects(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_objects(item, out);
            }
        }
        Value::Object(mut map) => match map.remove("@graph") {
            Some(graph) => flatten_objects(graph, out),
            None => out.push(Value::Object(map)),
        },
        _ => {}
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == JOB_POSTING_TYPE,
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some(JOB_POSTING_TYPE)),
        _ => false,
    }
}

fn map_posting(posting: JobPostingLd) -> PartialPosting {
    let location_types: Vec<String> = posting
        .job_location_type
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .iter()
        .filter_map(|t| clean_inline(t))
        .collect();
    let (location, location_from_type) = location_text(posting.job_location, &location_types);

    let mut fields = PartialPosting {
        job_title: posting.title.as_deref().and_then(clean_inline),
        company: posting
            .hiring_organization
            .as_ref()
            .and_then(Named::name)
            .and_then(clean_inline),
        location,
        employment_type: posting.employment_type.and_then(|kinds| {
            let kinds: Vec<String> = kinds
                .into_vec()
                .iter()
                .filter_map(|k| normalize_employment_type(k))
                .collect();
            (!kinds.is_empty()).then(|| kinds.join(", "))
        }),
        description: posting.description.as_deref().and_then(clean_description),
        posted_date: posting.date_posted.as_deref().and_then(normalize_date),
        salary: posting
            .base_salary
            .map(salary_from_ld)
            .filter(|s| *s != Salary::NotFound),
        ..Default::default()
    };

    for (key, value) in posting.extra {
        if key.starts_with('@') {
            continue;
        }
        let text = match key.as_str() {
            "identifier" => identifier_text(&value),
            _ => scalar_text(&value).or_else(|| Some(value.to_string())),
        };
        if let Some(text) = text {
            fields.insert_info(key, text);
        }
    }

    // An address took the location slot; keep the remote flag as information
    if !location_from_type && !location_types.is_empty() {
        fields.insert_info("jobLocationType", location_types.join(", "));
    }

    fields
}

/// Location from `jobLocation`, else `Remote` for a `TELECOMMUTE` type.
/// The flag is true when the type supplied the value.
fn location_text(
    places: Option<OneOrMany<Place>>,
    location_types: &[String],
) -> (Option<String>, bool) {
    let parts: Vec<String> = places
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|place| match place {
            Place::Text(text) => clean_inline(&text),
            Place::Object { address } => match address? {
                Address::Text(text) => clean_inline(&text),
                Address::Postal(postal) => postal_text(&postal),
            },
        })
        .collect();

    if !parts.is_empty() {
        return (Some(parts.join("; ")), false);
    }

    let remote = location_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case("TELECOMMUTE"));
    (remote.then(|| "Remote".to_string()), remote)
}

fn postal_text(postal: &PostalAddress) -> Option<String> {
    let joined = [postal.address_locality.as_deref(), postal.address_region.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(clean_inline)
        .collect::<Vec<_>>()
        .join(", ");

    let trimmed = joined.trim_matches(|c: char| c == ',' || c.is_whitespace());
    if !trimmed.is_empty() {
        return Some(trimmed.to_string());
    }
    postal
        .address_country
        .as_ref()
        .and_then(Named::name)
        .and_then(clean_inline)
}

fn salary_from_ld(base: BaseSalary) -> Salary {
    match base {
        BaseSalary::Figure(number) => figure_salary(number, None),
        BaseSalary::Monetary { currency, value } => match value {
            None => Salary::NotFound,
            Some(SalaryValue::Figure(number)) => figure_salary(number, currency),
            Some(SalaryValue::Quantitative(q)) => {
                let single = q.value.as_ref().and_then(Number::value);
                let min = q.min_value.as_ref().and_then(Number::value).or(single);
                let max = q.max_value.as_ref().and_then(Number::value).or(single).or(min);
                let period = q.unit_text.as_deref().and_then(PayPeriod::from_unit_text);
                match (min.or(max), max) {
                    (Some(low), Some(high)) => SalaryRange::new(low, high, currency, period)
                        .map(Salary::Range)
                        .unwrap_or(Salary::NotFound),
                    _ => Salary::NotFound,
                }
            }
        },
    }
}

/// A plain number (`55000`, `"80,000"`) is taken as is; other text goes through the free-text parser
fn figure_salary(number: Number, currency: Option<String>) -> Salary {
    if let Some(value) = number.value() {
        return figure_range(Some(value), currency, None);
    }
    let Number::Text(text) = number else {
        return Salary::NotFound;
    };
    match parse_salary(Some(&text)) {
        Salary::Range(mut range) if range.currency.is_none() => {
            range.currency = currency.map(|c| c.trim().to_ascii_uppercase());
            Salary::Range(range)
        }
        other => other,
    }
}

fn figure_range(value: Option<f64>, currency: Option<String>, period: Option<PayPeriod>) -> Salary {
    value
        .and_then(|v| SalaryRange::new(v, v, currency, period))
        .map(Salary::Range)
        .unwrap_or(Salary::NotFound)
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("value").and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    fn page(blocks: &[&str]) -> HtmlDocument {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect();
        HtmlDocument::parse(&format!("<html><head>{scripts}</head><body></body></html>"))
    }

    const AEI_POSTING: &str = r#"{
        "@context": "https://schema.org",
        "@type": "JobPosting",
        "title": "Engineering Data Analyst",
        "hiringOrganization": {"@type": "Organization", "name": "AEI Engineering"},
        "jobLocation": {"@type": "Place", "address": {"@type": "PostalAddress",
            "addressLocality": "Pittsburgh", "addressRegion": "PA", "addressCountry": "US"}},
        "employmentType": "FULL_TIME",
        "description": "&lt;p&gt;Analyze engineering data.&lt;/p&gt;",
        "datePosted": "2025-10-01",
        "identifier": {"@type": "PropertyValue", "name": "AEI", "value": "2025-5417"},
        "industry": "Engineering"
    }"#;

    #[test]
    fn maps_job_posting_fields() {
        let result = extract_structured(&page(&[AEI_POSTING]));
        assert!(result.found);

        let f = &result.fields;
        assert_eq!(f.job_title.as_deref(), Some("Engineering Data Analyst"));
        assert_eq!(f.company.as_deref(), Some("AEI Engineering"));
        assert_eq!(f.location.as_deref(), Some("Pittsburgh, PA"));
        assert_eq!(f.employment_type.as_deref(), Some("Full-time"));
        assert_eq!(f.description.as_deref(), Some("Analyze engineering data."));
        assert_eq!(f.posted_date.as_deref(), Some("2025-10-01T00:00:00Z"));
        assert_eq!(f.salary, None);
        assert_eq!(f.additional_info["identifier"], "2025-5417");
        assert_eq!(f.additional_info["industry"], "Engineering");
        assert!(!f.additional_info.contains_key("@context"));
    }

    #[test]
    fn malformed_block_is_skipped() {
        let result = extract_structured(&page(&[r#"{"@type": "JobPosting", "title": "#]));
        assert!(!result.found);
        assert_eq!(result.fields, PartialPosting::default());
    }

    #[test]
    fn wrong_shape_is_rejected_and_next_candidate_used() {
        let bad = r#"{"@type": "JobPosting", "title": 42}"#;
        let good = r#"{"@type": "JobPosting", "title": "Second"}"#;
        let result = extract_structured(&page(&[bad, good]));
        assert!(result.found);
        assert_eq!(result.fields.job_title.as_deref(), Some("Second"));
    }

    #[test]
    fn first_job_posting_wins_over_other_types() {
        let org = r#"{"@type": "Organization", "name": "AEI", "telephone": "555-0100", "industry": "Org value"}"#;
        let result = extract_structured(&page(&[org, AEI_POSTING]));
        assert!(result.found);
        assert_eq!(result.fields.job_title.as_deref(), Some("Engineering Data Analyst"));
        assert_eq!(result.fields.company.as_deref(), Some("AEI Engineering"));
        // Non-colliding scalar keys overflow; the job block keeps its own values
        assert_eq!(result.fields.additional_info["telephone"], "555-0100");
        assert_eq!(result.fields.additional_info["name"], "AEI");
        assert_eq!(result.fields.additional_info["industry"], "Engineering");
    }

    #[test]
    fn graph_and_arrays_are_scanned() {
        let graph = r#"{"@context": "https://schema.org", "@graph": [
            {"@type": "BreadcrumbList"},
            {"@type": ["JobPosting"], "title": "From Graph", "jobLocationType": "TELECOMMUTE"}
        ]}"#;
        let result = extract_structured(&page(&[graph]));
        assert!(result.found);
        assert_eq!(result.fields.job_title.as_deref(), Some("From Graph"));
        assert_eq!(result.fields.location.as_deref(), Some("Remote"));
    }

    #[test]
    fn remote_flag_next_to_address_is_kept_as_info() {
        let hybrid = r#"{"@type": "JobPosting", "jobLocationType": "TELECOMMUTE",
            "jobLocation": {"address": {"addressLocality": "Columbus", "addressRegion": "OH"}}}"#;
        let result = extract_structured(&page(&[hybrid]));
        assert_eq!(result.fields.location.as_deref(), Some("Columbus, OH"));
        assert_eq!(result.fields.additional_info["jobLocationType"], "TELECOMMUTE");

        let remote_only = r#"{"@type": "JobPosting", "jobLocationType": "TELECOMMUTE"}"#;
        let result = extract_structured(&page(&[remote_only]));
        assert_eq!(result.fields.location.as_deref(), Some("Remote"));
        assert!(!result.fields.additional_info.contains_key("jobLocationType"));
    }

    #[test]
    fn base_salary_shapes() {
        let ranged = r#"{"@type": "JobPosting", "baseSalary": {"@type": "MonetaryAmount",
            "currency": "USD", "value": {"@type": "QuantitativeValue",
            "minValue": 80000, "maxValue": "95,000", "unitText": "YEAR"}}}"#;
        let result = extract_structured(&page(&[ranged]));
        let range = result.fields.salary.as_ref().and_then(Salary::range).unwrap();
        assert_eq!((range.min, range.max), (80_000.0, 95_000.0));
        assert_eq!(range.currency.as_deref(), Some("USD"));
        assert_eq!(range.period, Some(PayPeriod::Year));

        let withheld = r#"{"@type": "JobPosting", "baseSalary": "Not disclosed"}"#;
        let result = extract_structured(&page(&[withheld]));
        assert_eq!(result.fields.salary, Some(Salary::NotDisclosed));

        let text_figure = r#"{"@type": "JobPosting", "baseSalary": {"currency": "usd", "value": "80,000"}}"#;
        let result = extract_structured(&page(&[text_figure]));
        let range = result.fields.salary.as_ref().and_then(Salary::range).unwrap();
        assert_eq!((range.min, range.max), (80_000.0, 80_000.0));
        assert_eq!(range.currency.as_deref(), Some("USD"));

        let single = r#"{"@type": "JobPosting", "baseSalary": {"currency": "EUR", "value": 55000}}"#;
        let result = extract_structured(&page(&[single]));
        let range = result.fields.salary.as_ref().and_then(Salary::range).unwrap();
        assert_eq!((range.min, range.max), (55_000.0, 55_000.0));
        assert_eq!(range.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn no_blocks_means_not_found() {
        let result = extract_structured(&HtmlDocument::parse("<h1>Title</h1>"));
        assert!(!result.found);
    }
}
