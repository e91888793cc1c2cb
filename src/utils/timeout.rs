//! Timeout validation utilities for browser operations

use std::time::Duration;

use super::errors::ConfigError;

/// Maximum timeout for browser navigation and readiness waits (5 minutes)
/// Covers slow-loading sites, heavy SPAs, and network delays
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000; // 5 minutes

/// Validate timeout for navigation operations (navigate, readiness wait)
///
/// # Arguments
/// * `timeout_ms` - Optional timeout in milliseconds
/// * `default_ms` - Default timeout if None provided
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err(ConfigError)` - If timeout is zero or exceeds MAX_NAVIGATION_TIMEOUT_MS
pub fn validate_navigation_timeout(
    timeout_ms: Option<u64>,
    default_ms: u64,
) -> Result<Duration, ConfigError> {
    let ms = timeout_ms.unwrap_or(default_ms);

    if ms == 0 {
        return Err(ConfigError::ZeroTimeout);
    }

    if ms > MAX_NAVIGATION_TIMEOUT_MS {
        return Err(ConfigError::TimeoutTooLarge {
            max_ms: MAX_NAVIGATION_TIMEOUT_MS,
            max_minutes: MAX_NAVIGATION_TIMEOUT_MS / 60_000,
            received_ms: ms,
        });
    }

    Ok(Duration::from_millis(ms))
}
