//! Configuration loading and data folder resolution
//!
//! Settings come from (highest priority first):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML config file
//! 4. Built-in defaults
//!
//! A missing or unreadable TOML file never aborts startup: a warning is
//! logged and defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the data folder
pub const DATA_DIR_ENV: &str = "CBS_DATA_DIR";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "CBS_CONFIG";

const CONFIG_FILE_NAME: &str = "cbs-scraper.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    /// Base folder holding document and text trees
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Folder name (under `data_dir`) for downloaded documents
    #[serde(default)]
    pub documents_dir: Option<String>,

    /// Folder name (under `data_dir`) for converted text artifacts
    #[serde(default)]
    pub texts_dir: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote site and request pacing
    #[serde(default)]
    pub http: HttpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// HTTP settings. Every field is optional; consumers fall back to their
/// own compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HttpConfig {
    /// Base URL that speech resources hang off
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Pause after each successful download, in milliseconds
    #[serde(default)]
    pub request_delay_ms: Option<u64>,

    /// User-Agent header value
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load TOML config from `path`
///
/// Missing file → defaults (with a warning). A file that exists but does not
/// parse is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the config file location
///
/// Priority: explicit argument → `CBS_CONFIG` → `~/.config/cbs/cbs-scraper.toml`
/// → `./cbs-scraper.toml`
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::config_dir()
        .map(|d| d.join("cbs").join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Data folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. `CBS_DATA_DIR` environment variable
/// 3. TOML `data_dir`
/// 4. OS-dependent default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.data_dir {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_data_dir()
}

/// OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cbs"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}
