use thiserror::Error;

use crate::browser::BrowserError;

/// Errors raised while turning a career-portal page into a [`crate::JobPosting`]
///
/// Only [`ScrapeError::Navigation`] and [`ScrapeError::LoadTimeout`] abort a run.
/// [`ScrapeError::Browser`] is an environmental failure (no usable Chrome) raised
/// before any page is touched. The remaining kinds are built, logged and absorbed
/// where they occur so the affected field simply ends up absent.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Navigation failed for '{url}': {reason}")]
    Navigation { url: String, reason: String },

    #[error("Page '{url}' not ready after {timeout_ms}ms (waiting for '{condition}')")]
    LoadTimeout {
        url: String,
        condition: String,
        timeout_ms: u128,
    },

    #[error("No embedded frame matched {selectors:?}")]
    FrameNotFound { selectors: Vec<String> },

    #[error("Structured data block #{index} rejected: {reason}")]
    MetadataParse { index: usize, reason: String },

    #[error("Field '{0}' not found by any strategy")]
    FieldNotFound(&'static str),

    #[error("Value for '{field}' did not match a known format: {raw:?}")]
    NormalizationAmbiguous { field: &'static str, raw: String },

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

impl ScrapeError {
    /// Whether this error terminates the run without producing a record
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScrapeError::Navigation { .. } | ScrapeError::LoadTimeout { .. } | ScrapeError::Browser(_)
        )
    }

    pub(crate) fn navigation(url: &str, reason: impl ToString) -> Self {
        ScrapeError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Rejected configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Timeout cannot exceed {max_ms}ms ({max_minutes} minutes). Received: {received_ms}ms")]
    TimeoutTooLarge {
        max_ms: u64,
        max_minutes: u64,
        received_ms: u64,
    },

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,
}
