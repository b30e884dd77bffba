//! Chrome-backed page sessions (chromiumoxide over CDP).
//!
//! One browser is launched (or connected to) per run; every pipeline
//! attempt opens its own tab on it.

mod page;
mod scripts;

pub use page::ChromePage;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserEngineConfig;
use crate::session::{SessionError, SessionFactory};

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Executable names searched in PATH.
const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Find the Chrome executable: configured path, well-known locations, then PATH.
pub fn find_chrome(config: &BrowserEngineConfig) -> Result<PathBuf> {
    if let Some(ref path) = config.executable {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(anyhow::anyhow!(
            "Configured Chrome executable does not exist: {}",
            path.display()
        ));
    }

    for path in CHROME_PATHS {
        let p = std::path::Path::new(path);
        if p.exists() {
            debug!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in CHROME_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            debug!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(anyhow::anyhow!(
        "Chrome/Chromium not found. Please install it or set CHROME_PATH:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or download from: https://www.google.com/chrome/"
    ))
}

/// Resolve the DevTools WebSocket URL of a remote browser.
pub async fn remote_websocket_url(url: &str) -> Result<String> {
    if url.contains("/devtools/browser/") {
        return Ok(url.to_string());
    }

    // Get WebSocket URL from the /json/version endpoint
    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .get(&version_url)
        .send()
        .await
        .context("Failed to connect to remote browser")?
        .json()
        .await
        .context("Failed to parse browser version info")?;

    resp.get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))
}

/// Session factory over one shared Chrome instance.
pub struct ChromeSessions {
    config: BrowserEngineConfig,
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    remote: bool,
}

impl ChromeSessions {
    /// Launch Chrome, or connect to `remote_url` when configured.
    pub async fn launch(config: BrowserEngineConfig) -> Result<Self> {
        if let Some(remote_url) = config.remote_url.clone() {
            return Self::connect_remote(config, &remote_url).await;
        }

        info!("Launching browser (headless={})", config.headless);
        let chrome_path = find_chrome(&config)?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(config.navigation_timeout());

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox") // Often needed in containers
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        Ok(Self::from_parts(config, browser, handler, false))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(config: BrowserEngineConfig, url: &str) -> Result<Self> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.timeout
        );

        let ws_url = remote_websocket_url(url).await?;
        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(config.navigation_timeout),
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .context("Failed to connect to remote browser")?;

        Ok(Self::from_parts(config, browser, handler, true))
    }

    fn from_parts(
        config: BrowserEngineConfig,
        browser: Browser,
        mut handler: chromiumoxide::handler::Handler,
        remote: bool,
    ) -> Self {
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Self {
            config,
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handle)),
            remote,
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessions {
    type Session = ChromePage;

    async fn open(&self) -> Result<ChromePage, SessionError> {
        let page = {
            let browser = self.browser.lock().await;
            let browser = browser
                .as_ref()
                .ok_or_else(|| SessionError::Browser("browser already shut down".to_string()))?;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| SessionError::Browser(format!("open tab: {}", e)))?
        };

        if let Some(ref user_agent) = self.config.user_agent {
            page.execute(SetUserAgentOverrideParams::new(user_agent.clone()))
                .await
                .map_err(|e| SessionError::Browser(format!("set user agent: {}", e)))?;
        }

        Ok(ChromePage::new(
            page,
            self.config.operation_timeout(),
            self.config.navigation_timeout(),
        ))
    }

    async fn shutdown(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if self.remote {
                debug!("Leaving remote browser running");
            } else {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                if let Err(e) = browser.wait().await {
                    debug!("Failed to wait for browser exit: {}", e);
                }
            }
        }

        if let Some(handle) = self.handler.lock().await.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_configured_executable_is_an_error() {
        let config = BrowserEngineConfig {
            executable: Some(PathBuf::from("/nonexistent/chrome-for-tests")),
            ..Default::default()
        };
        let err = find_chrome(&config).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/chrome-for-tests"));
    }

    #[tokio::test]
    async fn devtools_websocket_url_is_used_directly() {
        let url = "ws://127.0.0.1:9222/devtools/browser/abc";
        assert_eq!(remote_websocket_url(url).await.unwrap(), url);
    }
}
