//! Heuristic extraction from the visible document tree
//!
//! Only fields listed as missing are touched. Each field has an ordered
//! locator chain, most portal-specific first, generic page-level sources last.

use std::collections::BTreeSet;
use tracing::debug;

use super::{Locator, first_match};
use crate::document::Document;
use crate::normalizer::{
    Salary, clean_description, clean_inline, normalize_date, normalize_employment_type,
    parse_salary,
};
use crate::posting::{CanonicalField, PartialPosting};
use crate::utils::constants::MIN_DESCRIPTION_CHARS;

const TITLE_LOCATORS: &[Locator] = &[
    Locator::Text("h1.iCIMS_JobsTable h2"),
    Locator::Text(".iCIMS_Header"),
    Locator::Text("h1"),
    Locator::Text("h2.iCIMS_InfoMsg_Job"),
    Locator::Text(".iCIMS_JobsTable h2"),
    Locator::Text("title"),
    Locator::Attr {
        selector: "meta[property='og:title']",
        attr: "content",
    },
];

const COMPANY_LOCATORS: &[Locator] = &[
    Locator::Labelled(&["company", "organization", "employer"]),
    Locator::Text("[itemprop='hiringOrganization']"),
    Locator::Attr {
        selector: "meta[property='og:site_name']",
        attr: "content",
    },
];

const LOCATION_LOCATORS: &[Locator] = &[
    Locator::Labelled(&["location"]),
    Locator::Text("[itemprop='jobLocation']"),
    Locator::PlaceLike,
];

const EMPLOYMENT_TYPE_LOCATORS: &[Locator] = &[
    Locator::Labelled(&["position type", "employment type", "job type"]),
    Locator::Text("[itemprop='employmentType']"),
];

const DESCRIPTION_LOCATORS: &[Locator] = &[
    Locator::Block {
        selector: ".iCIMS_InfoMsg.iCIMS_InfoField_Job",
        min_chars: MIN_DESCRIPTION_CHARS,
    },
    Locator::Block {
        selector: ".iCIMS_JobContent",
        min_chars: MIN_DESCRIPTION_CHARS,
    },
    Locator::Block {
        selector: "div[class*='JobDescription']",
        min_chars: MIN_DESCRIPTION_CHARS,
    },
    Locator::Block {
        selector: "div.iCIMS_Expandable_Container",
        min_chars: MIN_DESCRIPTION_CHARS,
    },
    Locator::Attr {
        selector: "meta[name='description']",
        attr: "content",
    },
];

const POSTED_DATE_LOCATORS: &[Locator] = &[
    Locator::Attr {
        selector: "meta[itemprop='datePosted']",
        attr: "content",
    },
    Locator::Attr {
        selector: "time[datetime]",
        attr: "datetime",
    },
    Locator::Labelled(&["posted"]),
];

const SALARY_LOCATORS: &[Locator] = &[
    Locator::Labelled(&["salary", "compensation", "pay range", "pay rate"]),
    Locator::Text("[itemprop='baseSalary']"),
    Locator::Text("[class*='salary']"),
];

/// Locator chain consulted for a field
pub fn locators_for(field: CanonicalField) -> &'static [Locator] {
    match field {
        CanonicalField::JobTitle => TITLE_LOCATORS,
        CanonicalField::Company => COMPANY_LOCATORS,
        CanonicalField::Location => LOCATION_LOCATORS,
        CanonicalField::EmploymentType => EMPLOYMENT_TYPE_LOCATORS,
        CanonicalField::Description => DESCRIPTION_LOCATORS,
        CanonicalField::PostedDate => POSTED_DATE_LOCATORS,
        CanonicalField::Salary => SALARY_LOCATORS,
    }
}

/// What the fallback pass contributed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackReport {
    /// Fields filled, with the locator that supplied each
    pub filled: Vec<(CanonicalField, String)>,
    /// `additional_info` keys added from definition lists
    pub info_keys: Vec<String>,
}

/// Fill exactly the `missing` fields from the visible tree, then harvest
/// `<dt>`/`<dd>` pairs into `additional_info` without replacing existing keys
///
/// Fields already set in `fields` are never modified, even if listed as missing.
pub fn fill_from_dom(
    doc: &dyn Document,
    fields: &mut PartialPosting,
    missing: &BTreeSet<CanonicalField>,
) -> FallbackReport {
    let mut report = FallbackReport::default();

    for &field in missing {
        if fields.is_set(field) {
            continue;
        }
        let locators = locators_for(field);

        let filled_by = if field == CanonicalField::Salary {
            first_match(doc, locators, |raw| match parse_salary(Some(raw)) {
                Salary::NotFound => None,
                found => Some(found),
            })
            .map(|(idx, salary)| {
                fields.salary = Some(salary);
                idx
            })
        } else {
            let normalize = text_normalizer(field);
            first_match(doc, locators, normalize)
                .filter(|(_, value)| fields.fill_text(field, value.clone()))
                .map(|(idx, _)| idx)
        };

        match filled_by {
            Some(idx) => {
                let via = locators[idx].describe();
                debug!("Fallback filled {} via {}", field, via);
                report.filled.push((field, via));
            }
            None => debug!("Fallback found nothing for {}", field),
        }
    }

    for (label, value) in definition_pairs(doc) {
        if fields.insert_info(label.clone(), value) {
            report.info_keys.push(label);
        }
    }

    report
}

fn text_normalizer(field: CanonicalField) -> fn(&str) -> Option<String> {
    match field {
        CanonicalField::Description => clean_description,
        CanonicalField::PostedDate => normalize_date,
        CanonicalField::EmploymentType => normalize_employment_type,
        _ => clean_inline,
    }
}

/// `<dt>`/`<dd>` pairs in document order, labels without a trailing colon
///
/// A `<dd>` pairs with the nearest preceding unpaired `<dt>`.
pub fn definition_pairs(doc: &dyn Document) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut pending: Option<String> = None;

    for node in doc.find_all("dt, dd") {
        match node.tag() {
            "dt" => {
                let label = node.text().trim().trim_end_matches(':').trim().to_string();
                pending = (!label.is_empty()).then_some(label);
            }
            "dd" => {
                if let Some(label) = pending.take() {
                    let value = node.text().trim().to_string();
                    if !value.is_empty() {
                        pairs.push((label, value));
                    }
                }
            }
            _ => {}
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    const ICIMS_FRAME: &str = r#"
        <html><head><title>Careers</title></head><body>
          <div class="iCIMS_Header">Engineering Data Analyst</div>
          <dl>
            <dt>Job Locations</dt><dd>US-PA-Pittsburgh</dd>
            <dt>ID</dt><dd>2025-5417</dd>
            <dt>Category:</dt><dd>Engineering</dd>
            <dt>Position Type</dt><dd>Regular Full-Time</dd>
            <dt>Posted Date</dt><dd>10/01/2025</dd>
            <dt>Salary</dt><dd>$70,000 - $85,000 per year</dd>
          </dl>
          <div class="iCIMS_InfoMsg iCIMS_InfoField_Job">Short</div>
          <div class="iCIMS_InfoMsg iCIMS_InfoField_Job">
            <p>AEI Engineering is looking for an Engineering Data Analyst to join our team in Pittsburgh.</p>
            <ul><li>Build dashboards</li><li>Model engineering data</li></ul>
          </div>
        </body></html>
    "#;

    #[test]
    fn fills_missing_fields_from_portal_markup() {
        let doc = HtmlDocument::parse(ICIMS_FRAME);
        let mut fields = PartialPosting::default();
        let missing = fields.missing_fields();

        let report = fill_from_dom(&doc, &mut fields, &missing);

        assert_eq!(fields.job_title.as_deref(), Some("Engineering Data Analyst"));
        assert_eq!(fields.location.as_deref(), Some("US-PA-Pittsburgh"));
        assert_eq!(fields.employment_type.as_deref(), Some("Regular Full-Time"));
        assert_eq!(fields.posted_date.as_deref(), Some("2025-10-01T00:00:00Z"));
        assert_eq!(fields.company, None);

        let salary = fields.salary.as_ref().and_then(Salary::range).unwrap();
        assert_eq!((salary.min, salary.max), (70_000.0, 85_000.0));

        let description = fields.description.as_deref().unwrap();
        assert!(description.starts_with("AEI Engineering is looking"));
        assert!(description.lines().count() >= 3);

        assert_eq!(fields.additional_info["Category"], "Engineering");
        assert_eq!(fields.additional_info["ID"], "2025-5417");
        assert!(report.filled.iter().any(|(f, via)| *f == CanonicalField::JobTitle
            && via == "text(.iCIMS_Header)"));
    }

    #[test]
    fn never_touches_fields_outside_missing_set() {
        let doc = HtmlDocument::parse(ICIMS_FRAME);
        let mut fields = PartialPosting {
            job_title: Some("From Metadata".into()),
            ..Default::default()
        };
        fields.insert_info("Category", "Metadata Category");

        // Even if a caller lists a populated field, it stays as it was
        let missing: BTreeSet<_> = CanonicalField::ALL.into_iter().collect();
        let report = fill_from_dom(&doc, &mut fields, &missing);

        assert_eq!(fields.job_title.as_deref(), Some("From Metadata"));
        assert_eq!(fields.additional_info["Category"], "Metadata Category");
        assert!(!report.filled.iter().any(|(f, _)| *f == CanonicalField::JobTitle));
        assert!(!report.info_keys.contains(&"Category".to_string()));
    }

    #[test]
    fn empty_document_leaves_fields_absent() {
        let doc = HtmlDocument::parse("<html><body></body></html>");
        let mut fields = PartialPosting::default();
        let missing = fields.missing_fields();
        let report = fill_from_dom(&doc, &mut fields, &missing);

        assert!(report.filled.is_empty());
        assert_eq!(fields, PartialPosting::default());
    }

    #[test]
    fn unparseable_date_falls_through_to_absent() {
        let doc = HtmlDocument::parse("<dl><dt>Posted Date</dt><dd>a while ago</dd></dl>");
        let mut fields = PartialPosting::default();
        let missing = BTreeSet::from([CanonicalField::PostedDate]);
        fill_from_dom(&doc, &mut fields, &missing);
        assert_eq!(fields.posted_date, None);
    }

    #[test]
    fn pairs_skip_orphan_dd() {
        let doc = HtmlDocument::parse("<dl><dd>orphan</dd><dt>Key:</dt><dd>Value</dd></dl>");
        assert_eq!(
            definition_pairs(&doc),
            vec![("Key".to_string(), "Value".to_string())]
        );
    }
}
