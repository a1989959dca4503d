//! Institution resolution from free-text speech metadata
//!
//! Scans the institution table, then the alias table, for a
//! case-insensitive substring of the text. First hit wins, so when a
//! sentence names more than one institution the one listed earliest in
//! the tables is chosen.

use super::institution_directory::InstitutionDirectory;
use crate::models::UNKNOWN_CATEGORY;
use tracing::warn;

/// Outcome of resolving a metadata sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Canonical (lowercase) institution name
    Institution(String),
    Unknown,
}

impl Resolution {
    /// Category name the speech is filed under
    pub fn category(&self) -> &str {
        match self {
            Resolution::Institution(name) => name,
            Resolution::Unknown => UNKNOWN_CATEGORY,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Resolution::Unknown)
    }
}

/// Maps metadata text to a canonical institution
#[derive(Debug, Clone, Default)]
pub struct InstitutionResolver {
    directory: InstitutionDirectory,
}

impl InstitutionResolver {
    pub fn new(directory: InstitutionDirectory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &InstitutionDirectory {
        &self.directory
    }

    /// Resolve `raw_text` to an institution, or [`Resolution::Unknown`]
    pub fn resolve(&self, raw_text: &str) -> Resolution {
        let text = raw_text.trim();
        if text.is_empty() {
            return Resolution::Unknown;
        }
        let haystack = text.to_lowercase();

        if let Some(name) = self
            .directory
            .names()
            .find(|name| haystack.contains(&name.to_lowercase()))
        {
            return Resolution::Institution(self.directory.canonicalize(name));
        }

        for (canonical, aliases) in self.directory.aliases() {
            if aliases
                .iter()
                .any(|alias| haystack.contains(&alias.to_lowercase()))
            {
                return Resolution::Institution(canonical.to_string());
            }
        }

        warn!("Could not determine institution from: {}", preview(text));
        Resolution::Unknown
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 100;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    }
}
