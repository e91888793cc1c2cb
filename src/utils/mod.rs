pub mod constants;
mod errors;
mod timeout;
mod wait_for_element;

pub use errors::{ConfigError, ScrapeError};
pub use timeout::{MAX_NAVIGATION_TIMEOUT_MS, validate_navigation_timeout};
pub use wait_for_element::wait_for_element;
