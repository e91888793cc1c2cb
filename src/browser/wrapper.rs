//! Rendering session lifecycle
//!
//! Owns the chromiumoxide browser, its CDP handler task and the temporary
//! profile directory for exactly one pipeline run.

use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{BrowserError, BrowserResult};
use crate::BrowserConfig;

/// Wrapper for Browser and its event handler task
///
/// `close()` is the normal release path. `Drop` is the backstop for panics and
/// early returns: it aborts the handler, and dropping `Browser` kills the
/// Chrome child process.
pub struct RenderSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl RenderSession {
    /// Launch a headless browser with a profile directory unique to this session
    pub async fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        let user_data_dir = std::env::temp_dir().join(format!(
            "kodegen_jobscrape_{}_{}",
            std::process::id(),
            chrono::Utc::now().timestamp_millis()
        ));

        let (browser, handler) =
            crate::browser_setup::launch_browser(config, user_data_dir.clone()).await?;

        info!("Render session started (profile: {})", user_data_dir.display());
        Ok(Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        })
    }

    /// Create a blank page; navigation happens afterwards so launch flags apply first
    pub async fn new_page(&self) -> BrowserResult<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))
    }

    /// Close the browser, wait for the process to exit, then remove the profile
    ///
    /// Chrome must have exited before the directory is removed, otherwise
    /// locked files are left behind on Windows.
    pub async fn close(mut self) {
        info!("Shutting down render session");

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }

        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }

        self.cleanup_temp_dir();
    }

    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.handler.abort();

        if let Some(path) = self.user_data_dir.as_ref() {
            warn!(
                "RenderSession dropped without close(). Temp directory will be orphaned: {}",
                path.display()
            );
        }
    }
}
