//! Core data types: identifiers, metadata records and run statistics

use crate::error::{ScrapeError, ScrapeResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category for speeches whose institution could not be resolved
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Last two-digit year read as 20xx
const PIVOT_YEAR: i32 = 50;

/// Disambiguating letters, in probe order
pub fn letters() -> impl Iterator<Item = char> {
    'a'..='z'
}

/// A speech identifier: publication date plus disambiguating letter
///
/// Canonical code is `YYMMDD` followed by the letter, e.g. `240503a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    date: NaiveDate,
    letter: char,
}

impl Identifier {
    /// Build an identifier, rejecting anything but a single ASCII letter
    pub fn new(date: NaiveDate, letter: char) -> ScrapeResult<Self> {
        if !letter.is_ascii_alphabetic() {
            return Err(ScrapeError::InvalidIdentifier(format!(
                "letter must be ASCII alphabetic, got {:?}",
                letter
            )));
        }
        Ok(Self {
            date,
            letter: letter.to_ascii_lowercase(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    /// Seven-character code: `YYMMDD` + letter
    pub fn code(&self) -> String {
        format!(
            "{:02}{:02}{:02}{}",
            self.date.year().rem_euclid(100),
            self.date.month(),
            self.date.day(),
            self.letter
        )
    }

    /// Parse a seven-character code
    ///
    /// Accepts `YYMMDDx` (canonical) and `xYYMMDD`. Two-digit years 00-50
    /// map to 20xx, 51-99 to 19xx.
    pub fn parse(code: &str) -> ScrapeResult<Self> {
        let invalid = || ScrapeError::InvalidIdentifier(code.to_string());

        if code.len() != 7 || !code.is_ascii() {
            return Err(invalid());
        }

        let (date_part, letter) = match code.chars().next() {
            Some(first) if first.is_ascii_alphabetic() => (&code[1..], first),
            _ => {
                let last = code.chars().last().ok_or_else(invalid)?;
                (&code[..6], last)
            }
        };

        if !letter.is_ascii_alphabetic() || !date_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let yy: i32 = date_part[0..2].parse().map_err(|_| invalid())?;
        let month: u32 = date_part[2..4].parse().map_err(|_| invalid())?;
        let day: u32 = date_part[4..6].parse().map_err(|_| invalid())?;
        let year = if yy <= PIVOT_YEAR { 2000 + yy } else { 1900 + yy };

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        Self::new(date, letter)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for Identifier {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Fields pulled out of the free-text metadata sentence. All best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_date: Option<String>,
}

impl StructuredFields {
    /// True when no field was extracted
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.speaker.is_none()
            && self.role.is_none()
            && self.event.is_none()
            && self.location.is_none()
            && self.organizer.is_none()
            && self.speech_type.is_none()
            && self.speech_date.is_none()
    }
}

/// One value of a category's `metadata.json` mapping
///
/// Keys the code does not know about are kept in `extra` so a
/// load/merge/write cycle never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(default)]
    pub raw_text: String,

    /// ISO date of the identifier (`YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(flatten)]
    pub fields: StructuredFields,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MetadataEntry {
    pub fn new(raw_text: &str, date: Option<NaiveDate>, fields: StructuredFields) -> Self {
        Self {
            raw_text: raw_text.trim().to_string(),
            date: date.map(|d| d.format("%Y-%m-%d").to_string()),
            fields,
            extra: BTreeMap::new(),
        }
    }

    /// Whether anything beyond `raw_text` and `date` was derived earlier
    pub fn has_structured_fields(&self) -> bool {
        !self.fields.is_empty() || !self.extra.is_empty()
    }
}

/// A classified speech: identifier, resolved category and stored metadata
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub identifier: Identifier,
    /// Canonical institution name, or [`UNKNOWN_CATEGORY`]
    pub institution: String,
    pub entry: MetadataEntry,
}

/// Counters for one scraping run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapingResult {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Identifier code → failure message
    pub errors: BTreeMap<String, String>,
}

impl ScrapingResult {
    pub fn record_failure(&mut self, code: &str, message: impl Into<String>) {
        self.failed += 1;
        self.errors.insert(code.to_string(), message.into());
    }
}
