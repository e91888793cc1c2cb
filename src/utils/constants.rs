//! Shared configuration constants
//!
//! Default values used by config, the acquirer and the binary so the same
//! numbers are not repeated across modules.

/// Chrome user agent string for stealth mode
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Posting scraped when no URL is configured
pub const DEFAULT_JOB_URL: &str = "https://careers-aeieng.icims.com/jobs/5417/engineering-data-analyst/job?mobile=false&width=1920&height=500&bga=true&needsRedirect=false&jan1offset=330&jun1offset=330";

pub const DEFAULT_OUTPUT_FILE: &str = "job_posting.json";

pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 15_000;

pub const DEFAULT_READINESS_SELECTOR: &str = "body";

/// How long to look for a job frame before settling for the top-level page
pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 5_000;

/// Frames that carry the job widget on iCIMS-style portals, most specific first
pub const DEFAULT_FRAME_SELECTORS: &[&str] = &["#icims_content_iframe", "iframe[src*='in_iframe=1']"];

/// Visible descriptions shorter than this are treated as navigation chrome
pub const MIN_DESCRIPTION_CHARS: usize = 100;
