//! Field normalization
//!
//! Pure, total conversions from raw page text into canonical field values.
//! Each function returns `None` ("not found") rather than a guessed value when
//! the input does not match a recognized format.

mod date;
mod ident;
mod salary;
mod text;

pub use date::normalize_date;
pub use ident::job_id_from_url;
pub use salary::{PayPeriod, Salary, SalaryRange, parse_salary};
pub use text::{clean_description, clean_inline, normalize_employment_type};

use crate::utils::ScrapeError;

/// Record a value that was present but unrecognized
pub(crate) fn ambiguous(field: &'static str, raw: &str) {
    tracing::debug!(
        "{}",
        ScrapeError::NormalizationAmbiguous {
            field,
            raw: raw.chars().take(120).collect(),
        }
    );
}
