//! Browser engine configuration types.
//!
//! These types live outside `#[cfg(feature = "browser")]` so that config
//! parsing works in builds without Chrome support.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Set to false to watch the run or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-operation timeout in seconds (element waits, queries, clicks).
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub navigation_timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Chrome executable. Searched in common locations and PATH when unset.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// User agent override applied to every new tab.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    /// Can also be set via BROWSER_URL environment variable.
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            proxy: None,
            timeout: default_timeout(),
            navigation_timeout: default_timeout(),
            chrome_args: Vec::new(),
            executable: None,
            user_agent: None,
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `CHROME_PATH` - Chrome executable
    /// - `SOCKS_PROXY` - Proxy for browser traffic (e.g., "socks5://127.0.0.1:9050")
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.is_empty() {
                self.remote_url = Some(val);
            }
        }

        if let Ok(val) = std::env::var("CHROME_PATH") {
            if !val.is_empty() {
                self.executable = Some(PathBuf::from(val));
            }
        }

        // Set proxy from SOCKS_PROXY if not already configured
        if self.proxy.is_none() {
            if let Ok(val) = std::env::var("SOCKS_PROXY") {
                if !val.is_empty() {
                    self.proxy = Some(val);
                }
            }
        }

        self
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout)
    }
}

pub fn default_headless() -> bool {
    true
}

/// Short limit so a stuck page fails the attempt quickly and gets retried.
pub fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that modify environment variables must be serialized
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_browser_engine_config_default() {
        let config = BrowserEngineConfig::default();
        assert!(config.headless);
        assert!(config.proxy.is_none());
        assert_eq!(config.timeout, 10);
        assert_eq!(config.navigation_timeout, 10);
        assert!(config.chrome_args.is_empty());
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_browser_engine_config_serde_defaults() {
        let config: BrowserEngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BrowserEngineConfig::default());
        assert_eq!(config.operation_timeout(), Duration::from_secs(10));
        assert_eq!(config.navigation_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_browser_engine_config_serde_with_values() {
        let json = r#"{
            "headless": false,
            "proxy": "socks5://127.0.0.1:1080",
            "timeout": 20,
            "navigation_timeout": 45,
            "executable": "/usr/bin/chromium"
        }"#;

        let config: BrowserEngineConfig = serde_json::from_str(json).unwrap();
        assert!(!config.headless);
        assert_eq!(config.proxy, Some("socks5://127.0.0.1:1080".to_string()));
        assert_eq!(config.operation_timeout(), Duration::from_secs(20));
        assert_eq!(config.navigation_timeout(), Duration::from_secs(45));
        assert_eq!(config.executable, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();

        std::env::set_var("BROWSER_URL", "ws://localhost:9222");
        std::env::set_var("SOCKS_PROXY", "socks5://127.0.0.1:9050");
        std::env::remove_var("CHROME_PATH");

        let config = BrowserEngineConfig::default().with_env_overrides();
        assert_eq!(config.remote_url.as_deref(), Some("ws://localhost:9222"));
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
        assert!(config.executable.is_none());

        // An explicit proxy is not replaced
        let config = BrowserEngineConfig {
            proxy: Some("http://proxy:3128".into()),
            ..Default::default()
        }
        .with_env_overrides();
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:3128"));

        std::env::remove_var("BROWSER_URL");
        std::env::remove_var("SOCKS_PROXY");
    }
}
