//! Readiness polling for dynamically rendered portals
//!
//! Career portals inject their job widget with JavaScript after the load event,
//! so readiness is a selector that must appear rather than a fixed sleep.

use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::element::Element;

use super::errors::ScrapeError;

/// Wait for an element to appear in the DOM using exponential backoff polling
///
/// # Arguments
/// * `page` - The chromiumoxide Page to search in
/// * `selector` - CSS selector for the readiness marker
/// * `timeout` - Maximum time to wait for the element
///
/// # Returns
/// * `Ok(Element)` - The element was found
/// * `Err(ScrapeError::LoadTimeout)` - Timeout exceeded
///
/// # Polling Strategy
/// - Starts at 100ms intervals
/// - Doubles each retry (exponential backoff)
/// - Caps at 1 second maximum interval
/// - Total duration limited by timeout parameter
pub async fn wait_for_element(
    page: &Page,
    url: &str,
    selector: &str,
    timeout: Duration,
) -> Result<Element, ScrapeError> {
    let start = std::time::Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(ScrapeError::LoadTimeout {
                url: url.to_string(),
                condition: selector.to_string(),
                timeout_ms: timeout.as_millis(),
            });
        }

        // Never sleep past the deadline
        let remaining = timeout - elapsed;
        tokio::time::sleep(poll_interval.min(remaining)).await;

        poll_interval = (poll_interval * 2).min(max_interval);
    }
}
