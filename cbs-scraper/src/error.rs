//! Error types for cbs-scraper
//!
//! Per-identifier failures are values, not panics: the prober records them
//! in [`crate::ScrapingResult`] and moves on to the next letter.

use thiserror::Error;

/// Scraper error type
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Request never produced a response (DNS, connect, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response with a non-success status other than 404
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Identifier code that is not `YYMMDD` + letter (or letter + `YYMMDD`)
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Start date after end date
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Document store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// cbs-common error
    #[error("Common error: {0}")]
    Common(#[from] cbs_common::Error),
}

/// Result type for scraper operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;
