//! # CBS Common Library
//!
//! Shared code for the central-bank speech tools:
//! - Error type and result alias
//! - TOML configuration loading and data folder resolution
//! - Whole-file JSON persistence with corruption salvage
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod json_store;
pub mod time;

pub use error::{Error, Result};
