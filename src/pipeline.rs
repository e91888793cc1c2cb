//! End-to-end extraction: acquire, read metadata, fill gaps, assemble
//!
//! Strategies run in a fixed priority order. A value set by an earlier
//! strategy is never replaced by a later one.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::acquirer::PageSource;
use crate::extractors::{FallbackReport, extract_structured, fill_from_dom};
use crate::normalizer::{Salary, job_id_from_url};
use crate::output::save_posting;
use crate::posting::{CanonicalField, FieldSource, JobPosting};
use crate::utils::ScrapeError;

/// Provenance of one output field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub field: &'static str,
    pub source: FieldSource,
    /// Locator or other detail, when the source has one worth showing
    pub detail: Option<String>,
}

/// Which strategy supplied each field of a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionTrace {
    pub entries: Vec<TraceEntry>,
    /// A JSON-LD `JobPosting` block was found and used
    pub structured_found: bool,
    /// Extraction ran inside the job frame rather than the top-level page
    pub frame_switched: bool,
}

impl ExtractionTrace {
    pub fn source_of(&self, field: &str) -> Option<FieldSource> {
        self.entries
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.source)
    }

    fn record(&mut self, field: &'static str, source: FieldSource, detail: Option<String>) {
        self.entries.push(TraceEntry {
            field,
            source,
            detail,
        });
    }

    /// One log line per field
    pub fn emit(&self) {
        info!(
            "Extraction trace (structured metadata: {}, frame: {})",
            if self.structured_found { "found" } else { "absent" },
            if self.frame_switched { "yes" } else { "no" }
        );
        for entry in &self.entries {
            match &entry.detail {
                Some(detail) => info!("  {:<16} {} ({})", entry.field, entry.source, detail),
                None => info!("  {:<16} {}", entry.field, entry.source),
            }
        }
    }
}

impl fmt::Display for ExtractionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "{}: {}", entry.field, entry.source)?;
            if let Some(detail) = &entry.detail {
                write!(f, " ({detail})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Extraction {
    pub posting: JobPosting,
    pub trace: ExtractionTrace,
}

/// Runs every strategy for one URL against a [`PageSource`]
pub struct ExtractionPipeline<S> {
    source: S,
    debug: bool,
}

impl<S: PageSource> ExtractionPipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            debug: false,
        }
    }

    /// Emit the per-field trace through `info!` after each run
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Produce one normalized record for `url`
    ///
    /// Only acquisition failures are returned as errors. Missing fields are
    /// `None` in the record and `not found` in the trace.
    pub async fn run(&self, url: &str) -> Result<Extraction, ScrapeError> {
        info!("Extracting job posting from {}", url);
        let page = self.source.acquire(url).await?;

        let structured = extract_structured(&page.document);
        let mut fields = structured.fields;
        let from_metadata: BTreeSet<CanonicalField> = CanonicalField::ALL
            .into_iter()
            .filter(|field| fields.is_set(*field))
            .collect();

        let missing = fields.missing_fields();
        let report = if missing.is_empty() {
            debug!("Metadata covered every field, skipping fallback");
            FallbackReport::default()
        } else {
            fill_from_dom(&page.document, &mut fields, &missing)
        };

        let job_id = job_id_from_url(url);

        let mut trace = ExtractionTrace {
            structured_found: structured.found,
            frame_switched: page.frame_switched,
            ..Default::default()
        };
        trace.record(
            "job_id",
            if job_id.is_some() {
                FieldSource::Url
            } else {
                FieldSource::NotFound
            },
            None,
        );
        for field in CanonicalField::ALL {
            let withheld = field == CanonicalField::Salary
                && matches!(fields.salary, Some(Salary::NotDisclosed));
            let withheld_note = withheld.then(|| "not disclosed".to_string());

            if from_metadata.contains(&field) {
                trace.record(field.name(), FieldSource::Structured, withheld_note);
            } else if let Some((_, via)) = report.filled.iter().find(|(f, _)| *f == field) {
                let detail = withheld_note.unwrap_or_else(|| via.clone());
                trace.record(field.name(), FieldSource::Fallback, Some(detail));
            } else {
                debug!("{}", ScrapeError::FieldNotFound(field.name()));
                trace.record(field.name(), FieldSource::NotFound, None);
            }
        }

        if self.debug {
            trace.emit();
        }

        Ok(Extraction {
            posting: JobPosting::assemble(page.url, job_id, fields),
            trace,
        })
    }

    /// Run and write the record to `path`; nothing is written when the run fails
    pub async fn run_to_file(&self, url: &str, path: &Path) -> anyhow::Result<Extraction> {
        let extraction = self.run(url).await?;
        save_posting(&extraction.posting, path)?;
        Ok(extraction)
    }
}
