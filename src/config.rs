//! Configuration management for reviewacquire using the prefer crate.
//!
//! A config file is discovered by name (`reviewacquire.toml`, `.yaml`,
//! `.json` in the standard locations) or passed explicitly with `--config`.
//! Values resolve in order: built-in defaults, config file, environment,
//! command line.

pub mod browser;
pub mod reviews;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use browser::BrowserEngineConfig;
pub use reviews::{MissingNextPage, ReviewPageConfig, ReviewSelectors};

use crate::models::IdentifierTarget;
use crate::scrape::RetryPolicy;
use crate::storage::OutputFormat;

/// Default output directory, relative to the config file or CWD.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "data";

/// Default number of concurrent identifier workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default number of listing pages walked per identifier.
pub const DEFAULT_PAGES: u32 = 1;

/// Run parameters (`[parameters]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(
        default = "default_pages",
        alias = "NUM_PAGES_TO_GO_THROUGH",
        alias = "pages"
    )]
    pub num_pages_to_go_through: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            num_pages_to_go_through: default_pages(),
        }
    }
}

fn default_pages() -> u32 {
    DEFAULT_PAGES
}

/// Retry configuration (`[retry]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub retries: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            retries: policy.retries,
            min_delay_ms: policy.min_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            factor: policy.factor,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            // A factor below 1 would shrink delays between attempts
            factor: self.factor.max(1.0),
        }
    }
}

/// Effective run settings after config and overrides are applied.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory receiving one output file per identifier.
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    /// Concurrent identifier workers; 0 means one per target.
    pub workers: usize,
    /// Listing pages walked per identifier unless a target overrides it.
    pub pages: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_SUBDIR),
            output_format: OutputFormat::default(),
            workers: DEFAULT_WORKERS,
            pages: DEFAULT_PAGES,
        }
    }
}

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output directory (relative paths resolve against the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default)]
    pub parameters: Parameters,
    /// Identifiers scraped when none are given on the command line.
    #[serde(default, alias = "asins")]
    pub targets: Vec<IdentifierTarget>,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub reviews: ReviewPageConfig,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults (with env overrides) when no file is found.
    pub async fn load() -> Self {
        match prefer::load("reviewacquire").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => Self::default_with_env(),
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        let mut config = Self::default();
        config.browser = config.browser.with_env_overrides();
        config
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        let mut config: Config = match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.reviews.validate()?;
        config.browser = config.browser.with_env_overrides();
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        match self.output_dir {
            Some(ref dir) => settings.output_dir = self.resolve_path(dir, base_dir),
            None => settings.output_dir = base_dir.join(DEFAULT_OUTPUT_SUBDIR),
        }
        settings.output_format = self.output_format;
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        settings.pages = self.parameters.num_pages_to_go_through;
    }
}

/// Load the config (explicit path or discovery) and derive settings from it.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), String> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(dir) = std::env::var("REVIEWS_OUTPUT_DIR")
        .ok()
        .filter(|s| !s.is_empty())
    {
        tracing::debug!("Using REVIEWS_OUTPUT_DIR from environment: {}", dir);
        settings.output_dir = config.resolve_path(&dir, &base_dir);
    }

    Ok((settings, config))
}
