//! Configuration resolution for cbs-scraper
//!
//! Layers command-line overrides over the shared TOML/env resolution in
//! `cbs_common::config` and fills everything else from compiled defaults.

use cbs_common::config::{resolve_data_dir, TomlConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL for speech resources
pub const DEFAULT_BASE_URL: &str = "https://www.bis.org/review";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default pause after each successful download
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 500;

/// Default User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("cbs-scraper/", env!("CARGO_PKG_VERSION"));

const DEFAULT_DOCUMENTS_DIR: &str = "pdfs";
const DEFAULT_TEXTS_DIR: &str = "texts";

/// Fully resolved scraper settings
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    /// Base folder holding the document and text trees
    pub data_dir: PathBuf,
    /// Folder name for documents, under `data_dir`
    pub documents_dir: String,
    /// Folder name for text artifacts, under `data_dir`
    pub texts_dir: String,
    pub base_url: String,
    pub timeout: Duration,
    pub request_delay: Duration,
    pub user_agent: String,
    pub log_level: String,
}

impl ScraperConfig {
    /// Resolve settings: CLI data folder → env → TOML → defaults
    pub fn resolve(cli_data_dir: Option<&Path>, toml_config: &TomlConfig) -> Self {
        let data_dir = resolve_data_dir(cli_data_dir, toml_config);
        let http = &toml_config.http;

        Self {
            data_dir,
            documents_dir: non_empty(toml_config.documents_dir.as_deref())
                .unwrap_or(DEFAULT_DOCUMENTS_DIR)
                .to_string(),
            texts_dir: non_empty(toml_config.texts_dir.as_deref())
                .unwrap_or(DEFAULT_TEXTS_DIR)
                .to_string(),
            base_url: non_empty(http.base_url.as_deref())
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            request_delay: cbs_common::time::millis_to_duration(
                http.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            ),
            user_agent: non_empty(http.user_agent.as_deref())
                .unwrap_or(DEFAULT_USER_AGENT)
                .to_string(),
            log_level: toml_config.logging.level.clone(),
        }
    }

    /// Settings rooted at `data_dir` with every other value at its default
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir: PathBuf = data_dir.into();
        Self::resolve(Some(data_dir.as_path()), &TomlConfig::default())
    }

    /// `{data_dir}/{documents_dir}`
    pub fn documents_root(&self) -> PathBuf {
        self.data_dir.join(&self.documents_dir)
    }

    /// `{data_dir}/{texts_dir}`
    pub fn texts_root(&self) -> PathBuf {
        self.data_dir.join(&self.texts_dir)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
