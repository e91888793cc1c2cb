//! Locating and launching Chrome for a render session

use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::Handler;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::BrowserConfig;
use crate::browser::{BrowserError, BrowserResult};
use crate::utils::constants::CHROME_USER_AGENT;

/// Environment variable that pins the browser executable
pub const CHROMIUM_PATH_VAR: &str = "CHROMIUM_PATH";

/// Flags that make headless Chrome look like a regular desktop browser
/// and keep it from doing background work during a scrape
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-infobars",
    "--disable-notifications",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-breakpad",
    "--disable-features=TranslateUI",
    "--no-first-run",
    "--no-default-browser-check",
    "--password-store=basic",
    "--use-mock-keychain",
    "--hide-scrollbars",
    "--mute-audio",
];

const INSECURE_ARGS: &[&str] = &[
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
    "--ignore-certificate-errors",
];

const NO_SANDBOX_ARGS: &[&str] = &["--no-sandbox", "--disable-setuid-sandbox"];

/// Removes a freshly created profile directory unless launch succeeds
struct TempDirGuard {
    path: PathBuf,
    armed: bool,
}

impl TempDirGuard {
    fn create(path: PathBuf) -> BrowserResult<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self { path, armed: true })
    }

    /// Hand the directory over to the caller
    fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed profile dir after failed launch: {}", self.path.display()),
            Err(e) => warn!("Failed to remove profile dir {}: {}", self.path.display(), e),
        }
    }
}

/// Well-known install locations for the current platform
fn candidate_paths() -> Vec<PathBuf> {
    let raw: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    raw.iter().filter_map(|p| expand_path(p)).collect()
}

fn expand_path(raw: &str) -> Option<PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    if raw.contains('%') {
        return Some(PathBuf::from(expand_windows_env_vars(raw)));
    }
    Some(PathBuf::from(raw))
}

/// Look a binary up on `PATH` through `which`
fn which(binary: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(binary).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!found.is_empty()).then(|| PathBuf::from(found))
}

/// Find a Chrome/Chromium executable
///
/// Order: `CHROMIUM_PATH`, platform install locations, then `which` on unix.
/// A missing browser is an environment problem, reported before any page work starts.
pub async fn find_browser_executable() -> BrowserResult<PathBuf> {
    if let Ok(pinned) = std::env::var(CHROMIUM_PATH_VAR) {
        let pinned = PathBuf::from(pinned);
        if pinned.exists() {
            info!("Using browser from {}: {}", CHROMIUM_PATH_VAR, pinned.display());
            return Ok(pinned);
        }
        warn!(
            "{} points to a missing file, searching elsewhere: {}",
            CHROMIUM_PATH_VAR,
            pinned.display()
        );
    }

    if let Some(found) = candidate_paths().into_iter().find(|p| p.exists()) {
        info!("Found browser at: {}", found.display());
        return Ok(found);
    }

    if !cfg!(target_os = "windows") {
        let on_path = ["chromium", "chromium-browser", "google-chrome", "chrome"]
            .into_iter()
            .find_map(which);
        if let Some(found) = on_path {
            info!("Found browser on PATH: {}", found.display());
            return Ok(found);
        }
    }

    Err(BrowserError::NotFound(format!(
        "no Chrome/Chromium installation found; install one or set {CHROMIUM_PATH_VAR}"
    )))
}

/// Replace `%VAR%` tokens with environment values; unknown variables are left as written
fn expand_windows_env_vars(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Containers cannot use the setuid sandbox
fn in_container() -> bool {
    Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}

/// Launch flags beyond the ones `BrowserConfigBuilder` sets itself
fn launch_args(config: &BrowserConfig, containerized: bool) -> Vec<String> {
    let mut args = vec![format!("--user-agent={CHROME_USER_AGENT}")];
    args.extend(STEALTH_ARGS.iter().map(|a| a.to_string()));

    if config.disable_security {
        warn!("Browser security features disabled (disable_security=true)");
        args.extend(INSECURE_ARGS.iter().map(|a| a.to_string()));
    }
    if containerized || config.disable_security {
        args.extend(NO_SANDBOX_ARGS.iter().map(|a| a.to_string()));
    }
    args
}

/// Drain CDP events until the browser goes away
async fn drive_handler(mut handler: Handler) {
    while let Some(event) = handler.next().await {
        let Err(e) = event else { continue };
        let message = e.to_string();

        // Chrome emits CDP messages chromiumoxide has no variant for
        // Reference: https://github.com/mattsse/chromiumoxide/issues/167
        if message.contains("data did not match any variant of untagged enum Message")
            || message.contains("Failed to deserialize WS response")
        {
            trace!("Ignored unknown CDP message: {}", message);
        } else {
            error!("Browser handler error: {:?}", e);
        }
    }
    debug!("Browser handler finished");
}

/// Launch Chrome with the stealth profile in `profile_dir`
///
/// The returned task drives the CDP connection and must outlive every page;
/// [`crate::browser::RenderSession`] owns both halves.
pub async fn launch_browser(
    config: &BrowserConfig,
    profile_dir: PathBuf,
) -> BrowserResult<(Browser, JoinHandle<()>)> {
    let executable = find_browser_executable().await?;
    let guard = TempDirGuard::create(profile_dir)?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(config.window.width, config.window.height)
        .user_data_dir(&guard.path)
        .chrome_executable(executable);

    builder = if config.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let containerized = in_container();
    if containerized {
        info!("Container detected, launching without sandbox");
    }
    builder = builder.args(launch_args(config, containerized));

    let browser_config = builder
        .build()
        .map_err(|e| BrowserError::LaunchFailed(format!("invalid browser config: {e}")))?;

    debug!("Launching browser: {:?}", browser_config);
    let (browser, handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    let handler_task = task::spawn(drive_handler(handler));
    guard.disarm();

    Ok((browser, handler_task))
}
