//! Page acquisition
//!
//! Loads one URL in a headless Chrome, waits for a readiness selector, and
//! switches into the job widget's iframe when the portal embeds one. The
//! rendering session is closed before `acquire` returns, on every path.

use async_trait::async_trait;
use chromiumoxide::Page;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::RenderSession;
use crate::document::HtmlDocument;
use crate::utils::{ConfigError, ScrapeError, constants, validate_navigation_timeout, wait_for_element};
use crate::{BrowserConfig, Config};

/// A rendered document ready for extraction
#[derive(Debug)]
pub struct AcquiredPage {
    pub document: HtmlDocument,
    /// Final top-level URL after redirects
    pub url: String,
    /// True when `document` is the embedded frame rather than the top-level page
    pub frame_switched: bool,
}

/// Anything that can turn a URL into a rendered document
///
/// Futures are not `Send`: one run owns one session on the current task.
#[async_trait(?Send)]
pub trait PageSource {
    async fn acquire(&self, url: &str) -> Result<AcquiredPage, ScrapeError>;
}

/// Timeouts and selectors that drive acquisition
#[derive(Debug, Clone)]
pub struct AcquireSettings {
    pub navigation_timeout: Duration,
    pub readiness_timeout: Duration,
    pub frame_timeout: Duration,
    pub readiness_selector: String,
    pub frame_selectors: Vec<String>,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_millis(constants::DEFAULT_NAVIGATION_TIMEOUT_MS),
            readiness_timeout: Duration::from_millis(constants::DEFAULT_READINESS_TIMEOUT_MS),
            frame_timeout: Duration::from_millis(constants::DEFAULT_FRAME_TIMEOUT_MS),
            readiness_selector: constants::DEFAULT_READINESS_SELECTOR.to_string(),
            frame_selectors: constants::DEFAULT_FRAME_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AcquireSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let scrape = &config.scrape;
        Ok(Self {
            navigation_timeout: validate_navigation_timeout(
                Some(scrape.navigation_timeout_ms),
                constants::DEFAULT_NAVIGATION_TIMEOUT_MS,
            )?,
            readiness_timeout: validate_navigation_timeout(
                Some(scrape.readiness_timeout_ms),
                constants::DEFAULT_READINESS_TIMEOUT_MS,
            )?,
            frame_timeout: validate_navigation_timeout(
                Some(scrape.frame_timeout_ms),
                constants::DEFAULT_FRAME_TIMEOUT_MS,
            )?,
            readiness_selector: scrape.readiness_selector.clone(),
            frame_selectors: scrape.frame_selectors.clone(),
        })
    }
}

/// [`PageSource`] backed by a freshly launched headless Chrome per call
pub struct ChromePageAcquirer {
    browser: BrowserConfig,
    settings: AcquireSettings,
}

/// HTML captured while the session was alive
struct Rendered {
    url: String,
    top_html: String,
    frame_html: Result<String, ScrapeError>,
}

impl ChromePageAcquirer {
    pub fn new(browser: BrowserConfig, settings: AcquireSettings) -> Self {
        Self { browser, settings }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.browser.clone(),
            AcquireSettings::from_config(config)?,
        ))
    }

    async fn render(&self, session: &RenderSession, url: &str) -> Result<Rendered, ScrapeError> {
        let page = session.new_page().await?;

        self.navigate(&page, url).await?;
        wait_for_element(
            &page,
            url,
            &self.settings.readiness_selector,
            self.settings.readiness_timeout,
        )
        .await?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());
        if final_url != url {
            info!("Redirected: {} → {}", url, final_url);
        }

        let top_html = page
            .content()
            .await
            .map_err(|e| ScrapeError::navigation(&final_url, e))?;

        let frame_html = self.frame_html(&page, &final_url).await;

        Ok(Rendered {
            url: final_url,
            top_html,
            frame_html,
        })
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<(), ScrapeError> {
        let timeout = self.settings.navigation_timeout;
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| ScrapeError::LoadTimeout {
                url: url.to_string(),
                condition: "navigation".to_string(),
                timeout_ms: timeout.as_millis(),
            })?
            .map_err(|e| ScrapeError::navigation(url, e))?;
        Ok(())
    }

    /// Locate the job frame and return its rendered HTML
    ///
    /// Same-origin frames are read in place through `contentDocument`.
    /// Otherwise the page follows the frame's `src` so the frame becomes the
    /// top-level document.
    async fn frame_html(&self, page: &Page, page_url: &str) -> Result<String, ScrapeError> {
        let not_found = || ScrapeError::FrameNotFound {
            selectors: self.settings.frame_selectors.clone(),
        };
        if self.settings.frame_selectors.is_empty() {
            return Err(not_found());
        }

        let combined = self.settings.frame_selectors.join(", ");
        let frame = wait_for_element(page, page_url, &combined, self.settings.frame_timeout)
            .await
            .map_err(|_| not_found())?;
        info!("Job frame found via '{}'", combined);

        if let Some(html) = self.poll_frame_document(page, &combined).await {
            debug!("Read frame document in place ({} bytes)", html.len());
            return Ok(html);
        }

        let src = frame.attribute("src").await.ok().flatten().ok_or_else(not_found)?;
        let frame_url = resolve_frame_url(page_url, &src).ok_or_else(not_found)?;
        info!("Frame is not readable in place, following src: {}", frame_url);

        self.navigate(page, &frame_url).await.map_err(|e| {
            warn!("Following frame src failed: {}", e);
            not_found()
        })?;
        wait_for_element(
            page,
            &frame_url,
            &self.settings.readiness_selector,
            self.settings.readiness_timeout,
        )
        .await
        .map_err(|_| not_found())?;

        page.content().await.map_err(|_| not_found())
    }

    /// Poll the frame's `contentDocument` until it finished loading
    async fn poll_frame_document(&self, page: &Page, selector: &str) -> Option<String> {
        let script = frame_document_script(selector)?;
        let start = std::time::Instant::now();
        let mut poll_interval = Duration::from_millis(100);

        loop {
            let html = page
                .evaluate(script.as_str())
                .await
                .ok()
                .and_then(|result| result.into_value::<String>().ok())
                .filter(|html| !html.is_empty());
            if html.is_some() {
                return html;
            }

            let elapsed = start.elapsed();
            if elapsed >= self.settings.frame_timeout {
                return None;
            }
            tokio::time::sleep(poll_interval.min(self.settings.frame_timeout - elapsed)).await;
            poll_interval = (poll_interval * 2).min(Duration::from_secs(1));
        }
    }
}

#[async_trait(?Send)]
impl PageSource for ChromePageAcquirer {
    async fn acquire(&self, url: &str) -> Result<AcquiredPage, ScrapeError> {
        validate_locator(url)?;

        let session = RenderSession::launch(&self.browser).await?;
        let rendered = self.render(&session, url).await;
        session.close().await;

        let rendered = rendered?;
        Ok(select_context(rendered.url, rendered.top_html, rendered.frame_html))
    }
}

/// Reject anything that is not an absolute http(s) URL before launching a browser
pub fn validate_locator(url: &str) -> Result<Url, ScrapeError> {
    let parsed = Url::parse(url).map_err(|e| ScrapeError::navigation(url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ScrapeError::navigation(
            url,
            format!("unsupported scheme '{other}', expected http or https"),
        )),
    }
}

/// Choose the extraction context: the frame when one was read, the top-level page otherwise
pub fn select_context(
    url: String,
    top_html: String,
    frame_html: Result<String, ScrapeError>,
) -> AcquiredPage {
    match frame_html {
        Ok(html) => AcquiredPage {
            document: HtmlDocument::parse(&html),
            url,
            frame_switched: true,
        },
        Err(e) => {
            warn!("{}; continuing on the top-level document", e);
            AcquiredPage {
                document: HtmlDocument::parse(&top_html),
                url,
                frame_switched: false,
            }
        }
    }
}

fn resolve_frame_url(page_url: &str, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("about:") || src.starts_with("javascript:") {
        return None;
    }
    Url::parse(page_url)
        .ok()?
        .join(src)
        .ok()
        .map(|u| u.to_string())
}

/// Returns the frame's outer HTML once loaded, or "" when absent, cross-origin, or still loading
fn frame_document_script(selector: &str) -> Option<String> {
    let selector = serde_json::to_string(selector).ok()?;
    Some(format!(
        r#"(() => {{
            const frame = document.querySelector({selector});
            if (!frame) return "";
            try {{
                const doc = frame.contentDocument;
                if (!doc || doc.readyState !== "complete" || !doc.documentElement) return "";
                return doc.documentElement.outerHTML;
            }} catch (e) {{
                return "";
            }}
        }})()"#
    ))
}
