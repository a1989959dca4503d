//! cbs-scraper library interface
//!
//! Discovery, classification and reconciliation of central-bank speeches
//! published under `YYMMDD` + letter identifiers.
//!
//! - [`services::discovery_prober`] walks each date's letters until the
//!   site reports not-found
//! - [`services::institution_resolver`] files each speech under an
//!   institution (or `unknown`)
//! - [`services::reconciler`] re-files `unknown` speeches once the
//!   institution tables learn about them

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ScrapeError, ScrapeResult};
pub use crate::models::{Identifier, MetadataEntry, ScrapingResult, StructuredFields};
