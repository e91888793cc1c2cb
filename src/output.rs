//! Persisting and presenting a finished record

use anyhow::Context;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::posting::JobPosting;

/// Characters of description shown in the console summary
const DESCRIPTION_PREVIEW_CHARS: usize = 400;

/// Write the record as pretty-printed JSON, replacing any previous file wholesale
pub fn save_posting(posting: &JobPosting, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(posting).context("Failed to serialize job posting")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write job posting to {}", path.display()))?;
    info!("Saved job posting to {}", path.display());
    Ok(())
}

/// Human-readable summary of a record
pub fn summary(posting: &JobPosting) -> String {
    let mut out = String::new();
    let show = |value: Option<&str>| value.unwrap_or("N/A").to_string();

    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "JOB POSTING");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "URL:             {}", posting.url());
    let _ = writeln!(out, "Job ID:          {}", show(posting.job_id()));
    let _ = writeln!(out, "Title:           {}", show(posting.job_title()));
    let _ = writeln!(out, "Company:         {}", show(posting.company()));
    let _ = writeln!(out, "Location:        {}", show(posting.location()));
    let _ = writeln!(out, "Employment Type: {}", show(posting.employment_type()));
    let _ = writeln!(out, "Posted:          {}", show(posting.posted_date()));
    let salary = posting
        .salary()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let _ = writeln!(out, "Salary:          {}", salary);

    if !posting.additional_info().is_empty() {
        let _ = writeln!(out, "\nAdditional Information:");
        for (key, value) in posting.additional_info() {
            let _ = writeln!(out, "  {}: {}", key, value);
        }
    }

    if let Some(description) = posting.description() {
        let _ = writeln!(out, "\nDescription:");
        let _ = writeln!(out, "{}", preview(description, DESCRIPTION_PREVIEW_CHARS));
    }

    out
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
