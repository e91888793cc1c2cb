//! Canonical job-posting record and the partial form extractors fill in

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::normalizer::{Salary, SalaryRange};

/// Canonical fields an extraction pass can populate
///
/// `job_id` and `url` are absent on purpose: both come from the URL alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    JobTitle,
    Company,
    Location,
    EmploymentType,
    Description,
    PostedDate,
    Salary,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 7] = [
        CanonicalField::JobTitle,
        CanonicalField::Company,
        CanonicalField::Location,
        CanonicalField::EmploymentType,
        CanonicalField::Description,
        CanonicalField::PostedDate,
        CanonicalField::Salary,
    ];

    /// Name used in the JSON output
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::JobTitle => "job_title",
            CanonicalField::Company => "company",
            CanonicalField::Location => "location",
            CanonicalField::EmploymentType => "employment_type",
            CanonicalField::Description => "description",
            CanonicalField::PostedDate => "posted_date",
            CanonicalField::Salary => "salary",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields gathered by one extraction pass, all already normalized
///
/// `salary` is `None` when not evaluated, `Some(Salary::NotDisclosed)` when the
/// page states it is withheld.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialPosting {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description: Option<String>,
    pub posted_date: Option<String>,
    pub salary: Option<Salary>,
    pub additional_info: BTreeMap<String, String>,
}

impl PartialPosting {
    pub fn is_set(&self, field: CanonicalField) -> bool {
        match field {
            CanonicalField::JobTitle => self.job_title.is_some(),
            CanonicalField::Company => self.company.is_some(),
            CanonicalField::Location => self.location.is_some(),
            CanonicalField::EmploymentType => self.employment_type.is_some(),
            CanonicalField::Description => self.description.is_some(),
            CanonicalField::PostedDate => self.posted_date.is_some(),
            CanonicalField::Salary => self
                .salary
                .as_ref()
                .is_some_and(|s| !matches!(s, Salary::NotFound)),
        }
    }

    pub fn missing_fields(&self) -> BTreeSet<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| !self.is_set(*field))
            .collect()
    }

    /// Set a text field. Returns false, leaving the value untouched, if it was already set.
    pub fn fill_text(&mut self, field: CanonicalField, value: String) -> bool {
        let slot = match field {
            CanonicalField::JobTitle => &mut self.job_title,
            CanonicalField::Company => &mut self.company,
            CanonicalField::Location => &mut self.location,
            CanonicalField::EmploymentType => &mut self.employment_type,
            CanonicalField::Description => &mut self.description,
            CanonicalField::PostedDate => &mut self.posted_date,
            CanonicalField::Salary => return false,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// First-seen wins: an existing key is never overwritten
    pub fn insert_info(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        if key.trim().is_empty() || value.trim().is_empty() {
            return false;
        }
        match self.additional_info.entry(key) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }
}

/// Which strategy supplied a field in the final record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Structured,
    Fallback,
    Url,
    NotFound,
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldSource::Structured => "structured",
            FieldSource::Fallback => "fallback",
            FieldSource::Url => "url",
            FieldSource::NotFound => "not found",
        };
        f.write_str(label)
    }
}

/// The normalized record produced by one pipeline run
///
/// Fields are read-only once the pipeline hands the record out. Every
/// canonical field serializes, "not found" as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    url: String,
    job_id: Option<String>,
    job_title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    employment_type: Option<String>,
    description: Option<String>,
    posted_date: Option<String>,
    salary: Option<SalaryRange>,
    additional_info: BTreeMap<String, String>,
}

impl JobPosting {
    pub(crate) fn assemble(url: String, job_id: Option<String>, fields: PartialPosting) -> Self {
        Self {
            url,
            job_id,
            job_title: fields.job_title,
            company: fields.company,
            location: fields.location,
            employment_type: fields.employment_type,
            description: fields.description,
            posted_date: fields.posted_date,
            salary: fields.salary.and_then(Salary::into_range),
            additional_info: fields.additional_info,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn job_title(&self) -> Option<&str> {
        self.job_title.as_deref()
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn employment_type(&self) -> Option<&str> {
        self.employment_type.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn posted_date(&self) -> Option<&str> {
        self.posted_date.as_deref()
    }

    pub fn salary(&self) -> Option<&SalaryRange> {
        self.salary.as_ref()
    }

    pub fn additional_info(&self) -> &BTreeMap<String, String> {
        &self.additional_info
    }
}
