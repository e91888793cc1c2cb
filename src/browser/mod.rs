//! Browser infrastructure for launching and owning a Chrome instance
//!
//! One [`RenderSession`] backs one pipeline run. Sessions are never shared
//! between concurrent runs.

mod wrapper;

pub use crate::browser_setup::find_browser_executable;
pub use wrapper::RenderSession;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to find browser executable: {0}")]
    NotFound(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for BrowserError {
    fn from(err: std::io::Error) -> Self {
        BrowserError::IoError(err.to_string())
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;
