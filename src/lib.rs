//! Job posting extraction from career portals
//!
//! Renders a posting in headless Chrome via chromiumoxide, reads schema.org
//! JSON-LD metadata, fills the gaps from the visible page, and normalizes the
//! result into one [`JobPosting`] record.

pub mod acquirer;
mod browser;
pub mod browser_setup;
pub mod document;
pub mod extractors;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod posting;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use utils::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub browser: BrowserConfig,
}

/// What to scrape and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_url")]
    pub url: String,

    /// Log the per-field provenance trace
    #[serde(default = "default_debug")]
    pub debug: bool,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,

    /// Selector that must be present before the page counts as loaded
    #[serde(default = "default_readiness_selector")]
    pub readiness_selector: String,

    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,

    /// Frames that may hold the job content, tried as one selector list
    #[serde(default = "default_frame_selectors")]
    pub frame_selectors: Vec<String>,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_url() -> String {
    constants::DEFAULT_JOB_URL.to_string()
}
fn default_debug() -> bool {
    true
}
fn default_output() -> PathBuf {
    PathBuf::from(constants::DEFAULT_OUTPUT_FILE)
}
fn default_navigation_timeout_ms() -> u64 {
    constants::DEFAULT_NAVIGATION_TIMEOUT_MS
}
fn default_readiness_timeout_ms() -> u64 {
    constants::DEFAULT_READINESS_TIMEOUT_MS
}
fn default_readiness_selector() -> String {
    constants::DEFAULT_READINESS_SELECTOR.to_string()
}
fn default_frame_timeout_ms() -> u64 {
    constants::DEFAULT_FRAME_TIMEOUT_MS
}
fn default_frame_selectors() -> Vec<String> {
    constants::DEFAULT_FRAME_SELECTORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_headless() -> bool {
    true
}

fn default_disable_security() -> bool {
    false // SECURE BY DEFAULT
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            debug: default_debug(),
            output: default_output(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            readiness_timeout_ms: default_readiness_timeout_ms(),
            readiness_selector: default_readiness_selector(),
            frame_timeout_ms: default_frame_timeout_ms(),
            frame_selectors: default_frame_selectors(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            disable_security: default_disable_security(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

/// Default config location: `config.yaml` in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Load config from `path`, or from `config.yaml` in the working directory
///
/// A missing file yields defaults. A file that exists but does not parse is an error.
pub fn load_yaml_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    if config_path.exists() {
        let contents = fs::read_to_string(config_path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

pub use acquirer::{AcquireSettings, AcquiredPage, ChromePageAcquirer, PageSource};
pub use browser::{BrowserError, BrowserResult, RenderSession, find_browser_executable};
pub use document::{Document, HtmlDocument, Node};
pub use pipeline::{Extraction, ExtractionPipeline, ExtractionTrace, TraceEntry};
pub use posting::{CanonicalField, FieldSource, JobPosting, PartialPosting};
pub use utils::{ConfigError, ScrapeError};
