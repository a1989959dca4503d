//! Persistent record of fully probed dates
//!
//! Once every letter of a date has been resolved the date is recorded here,
//! keyed by the date plus the active institution filter, and later runs
//! skip it without touching the network. Entries never expire; the only
//! way to forget them is [`DateCache::clear`].
//!
//! Loading is best-effort: a truncated file keeps the entries written before
//! the damage, and an entry that does not decode is dropped on its own.

use cbs_common::json_store::{load_field_map_lenient, write_json_atomic};
use chrono::{NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Cache file name, under the documents root
pub const CACHE_FILE_NAME: &str = ".date_cache.json";

const CACHE_VERSION: u32 = 1;

/// Verdict for one fully probed (date, filter) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateCacheEntry {
    /// ISO 8601 timestamp, with or without an offset
    #[serde(default)]
    pub checked_at: Option<String>,

    #[serde(alias = "had_speeches")]
    pub had_documents: bool,

    #[serde(alias = "files_found")]
    pub documents_found: usize,
}

/// On-disk layout; `dates` is written last so truncation only loses its tail
#[derive(Debug, Serialize)]
struct CacheFile<'a> {
    version: u32,
    updated: String,
    dates: &'a BTreeMap<String, DateCacheEntry>,
}

fn timestamp() -> String {
    cbs_common::time::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// In-memory view of the cache file
#[derive(Debug, Clone)]
pub struct DateCache {
    path: PathBuf,
    entries: BTreeMap<String, DateCacheEntry>,
}

impl DateCache {
    /// Cache file location for a documents root
    pub fn file_path(documents_root: &Path) -> PathBuf {
        documents_root.join(CACHE_FILE_NAME)
    }

    /// Load the cache under `documents_root`
    ///
    /// Missing → empty. Corrupted → the entries that still decode.
    pub fn load(documents_root: &Path) -> Self {
        let path = Self::file_path(documents_root);

        let mut entries = BTreeMap::new();
        for (key, value) in load_field_map_lenient(&path, "dates") {
            match serde_json::from_value::<DateCacheEntry>(value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => warn!(key = %key, "Dropping unreadable cache entry: {}", e),
            }
        }

        if !entries.is_empty() {
            info!("Loaded {} dates from cache", entries.len());
        }
        Self { path, entries }
    }

    /// `YYYY-MM-DD`, plus `|name,name` when an institution filter is active
    ///
    /// Filter names are trimmed, de-duplicated and sorted so the key does
    /// not depend on the order they were given in.
    pub fn cache_key(date: NaiveDate, filter: Option<&[String]>) -> String {
        let day = date.format("%Y-%m-%d").to_string();

        let mut names: Vec<&str> = filter
            .unwrap_or_default()
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return day;
        }
        names.sort_unstable();
        names.dedup();

        format!("{}|{}", day, names.join(","))
    }

    pub fn lookup(&self, key: &str) -> Option<&DateCacheEntry> {
        self.entries.get(key)
    }

    /// Record a date as fully probed (in memory; see [`DateCache::save`])
    pub fn record(&mut self, key: &str, documents_found: usize) {
        debug!(key = %key, documents_found, "Recording checked date");
        self.entries.insert(
            key.to_string(),
            DateCacheEntry {
                checked_at: Some(timestamp()),
                had_documents: documents_found > 0,
                documents_found,
            },
        );
    }

    /// Rewrite the whole cache file
    pub fn save(&self) -> cbs_common::Result<()> {
        let file = CacheFile {
            version: CACHE_VERSION,
            updated: timestamp(),
            dates: &self.entries,
        };
        write_json_atomic(&self.path, &file)
    }

    /// Delete the cache file under `documents_root`. Returns whether one existed.
    pub fn clear(documents_root: &Path) -> cbs_common::Result<bool> {
        let path = Self::file_path(documents_root);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        info!("Removed date cache {}", path.display());
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
