//! On-disk layout for documents, text artifacts and metadata
//!
//! ```text
//! {data_dir}/{documents_dir}/{category}/{code}.pdf
//! {data_dir}/{documents_dir}/{category}/metadata.json
//! {data_dir}/{documents_dir}/{category}/{category}_meta.txt
//! {data_dir}/{texts_dir}/{category}/{code}.txt
//! ```
//!
//! `{category}` is the directory name of the canonical institution (or
//! `unknown`). A document and its metadata record always live in the same
//! category folder.

use super::institution_directory::directory_name;
use crate::config::ScraperConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{MetadataEntry, MetadataRecord};
use cbs_common::json_store::{load_map_lenient, write_atomic, write_json_atomic};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Per-category metadata mapping file
pub const METADATA_FILE_NAME: &str = "metadata.json";

const DOCUMENT_EXTENSION: &str = "pdf";
const TEXT_EXTENSION: &str = "txt";

/// Category-folder storage rooted at a documents tree and a texts tree
#[derive(Debug, Clone)]
pub struct DocumentStore {
    documents_root: PathBuf,
    texts_root: PathBuf,
}

impl DocumentStore {
    pub fn new(documents_root: impl Into<PathBuf>, texts_root: impl Into<PathBuf>) -> Self {
        Self {
            documents_root: documents_root.into(),
            texts_root: texts_root.into(),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.documents_root(), config.texts_root())
    }

    pub fn documents_root(&self) -> &Path {
        &self.documents_root
    }

    pub fn texts_root(&self) -> &Path {
        &self.texts_root
    }

    /// Document folder of a category
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.documents_root.join(directory_name(category))
    }

    /// Text-artifact folder of a category
    pub fn text_dir(&self, category: &str) -> PathBuf {
        self.texts_root.join(directory_name(category))
    }

    pub fn document_path(&self, category: &str, code: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.{}", code, DOCUMENT_EXTENSION))
    }

    pub fn text_path(&self, category: &str, code: &str) -> PathBuf {
        self.text_dir(category)
            .join(format!("{}.{}", code, TEXT_EXTENSION))
    }

    pub fn metadata_path(&self, category: &str) -> PathBuf {
        self.category_dir(category).join(METADATA_FILE_NAME)
    }

    /// Append-only `{slug}_meta.txt` log
    pub fn text_log_path(&self, category: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}_meta.txt", directory_name(category)))
    }

    /// Codes of every stored document across all categories
    pub fn existing_codes(&self) -> HashSet<String> {
        if !self.documents_root.is_dir() {
            return HashSet::new();
        }

        let walker = WalkDir::new(&self.documents_root)
            .min_depth(2)
            .max_depth(2)
            .follow_links(false)
            .into_iter();

        let mut codes = HashSet::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        if let Some(code) = document_code(entry.path()) {
                            codes.insert(code);
                        }
                    }
                }
                Err(e) => warn!("Error accessing entry: {}", e),
            }
        }

        debug!("Found {} existing documents", codes.len());
        codes
    }

    /// Codes of the documents in one category
    pub fn category_codes(&self, category: &str) -> ScrapeResult<BTreeSet<String>> {
        let dir = self.category_dir(category);
        if !dir.is_dir() {
            return Ok(BTreeSet::new());
        }

        let mut codes = BTreeSet::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() {
                if let Some(code) = document_code(&path) {
                    codes.insert(code);
                }
            }
        }
        Ok(codes)
    }

    /// Category metadata mapping; missing → empty, corrupted → salvaged prefix
    pub fn load_metadata(&self, category: &str) -> BTreeMap<String, MetadataEntry> {
        load_map_lenient(&self.metadata_path(category))
    }

    /// Rewrite a category's whole metadata mapping
    pub fn save_metadata(
        &self,
        category: &str,
        entries: &BTreeMap<String, MetadataEntry>,
    ) -> ScrapeResult<()> {
        write_json_atomic(&self.metadata_path(category), entries)?;
        Ok(())
    }

    /// Create or replace one entry, leaving the others untouched
    pub fn upsert_metadata(
        &self,
        category: &str,
        code: &str,
        entry: MetadataEntry,
    ) -> ScrapeResult<()> {
        let mut entries = self.load_metadata(category);
        entries.insert(code.to_string(), entry);
        self.save_metadata(category, &entries)
    }

    /// Merge a classified record into its institution's mapping
    pub fn upsert_record(&self, record: MetadataRecord) -> ScrapeResult<()> {
        let code = record.identifier.code();
        self.upsert_metadata(&record.institution, &code, record.entry)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn remove_metadata(&self, category: &str, code: &str) -> ScrapeResult<bool> {
        let mut entries = self.load_metadata(category);
        if entries.remove(code).is_none() {
            return Ok(false);
        }
        self.save_metadata(category, &entries)?;
        Ok(true)
    }

    /// Append `"{code}: {raw_text}"` to the category's text log
    pub fn append_text_log(&self, category: &str, code: &str, raw_text: &str) -> ScrapeResult<()> {
        let path = self.text_log_path(category);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}: {}", code, raw_text.trim())?;
        Ok(())
    }

    /// Atomically write a document into its category folder
    pub fn write_document(&self, category: &str, code: &str, content: &[u8]) -> ScrapeResult<PathBuf> {
        let path = self.document_path(category, code);
        write_atomic(&path, content)?;
        Ok(path)
    }

    /// Remove a category's bookkeeping files and folders once it holds no
    /// documents. Non-empty folders are left alone.
    pub fn remove_category_if_empty(&self, category: &str) -> ScrapeResult<bool> {
        if !self.category_codes(category)?.is_empty() {
            return Ok(false);
        }

        for path in [self.metadata_path(category), self.text_log_path(category)] {
            if path.exists() {
                std::fs::remove_file(&path)?;
                debug!("Removed {}", path.display());
            }
        }

        let mut removed = false;
        for dir in [self.category_dir(category), self.text_dir(category)] {
            if dir.is_dir() && is_empty_dir(&dir)? {
                std::fs::remove_dir(&dir)?;
                info!("Removed empty folder {}", dir.display());
                removed = true;
            }
        }
        Ok(removed)
    }
}

/// Move `from` to `to`, tolerating a move that already happened
///
/// - only `from` exists → renamed (copy + remove across filesystems)
/// - both exist → `from` removed, `to` kept
/// - only `to` exists → nothing to do
///
/// Returns whether `to` holds the file afterwards.
pub fn move_file(from: &Path, to: &Path) -> ScrapeResult<bool> {
    let source_exists = from.exists();
    let destination_exists = to.exists();

    match (source_exists, destination_exists) {
        (false, destination_exists) => Ok(destination_exists),
        (true, true) => {
            std::fs::remove_file(from)?;
            debug!("Removed duplicate {}", from.display());
            Ok(true)
        }
        (true, false) => {
            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent)?;
            }
            if std::fs::rename(from, to).is_err() {
                std::fs::copy(from, to).map_err(|e| {
                    ScrapeError::Storage(format!(
                        "Copy {} to {} failed: {}",
                        from.display(),
                        to.display(),
                        e
                    ))
                })?;
                std::fs::remove_file(from)?;
            }
            Ok(true)
        }
    }
}

fn document_code(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != DOCUMENT_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

fn is_empty_dir(dir: &Path) -> ScrapeResult<bool> {
    Ok(std::fs::read_dir(dir)?.next().is_none())
}
