//! Per-date discovery of published speeches
//!
//! Identifiers for a date are `YYMMDDa`, `YYMMDDb`, ... with no gaps, so a
//! date is walked letter by letter until the site answers 404. Each hit is
//! classified from its page text and stored under its institution.
//!
//! State kept for the lifetime of the prober:
//! - the date cache, loaded once at construction
//! - the set of identifier codes already stored on disk, scanned once at
//!   construction (empty when forcing) and extended as documents land

use super::date_cache::DateCache;
use super::document_store::DocumentStore;
use super::http_client::{fetch, probe, ProbeOutcome, SpeechEndpoints, Transport};
use super::institution_directory::directory_name;
use super::institution_resolver::InstitutionResolver;
use super::metadata_parser::MetadataParser;
use super::page_extractor::extract_metadata_text;
use crate::error::ScrapeResult;
use crate::models::{letters, Identifier, MetadataEntry, MetadataRecord, ScrapingResult};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Whether the caller should go on to the next date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFlow {
    Continue,
    /// Download limit reached
    Stop,
}

/// Run-wide prober settings
#[derive(Debug, Clone, Default)]
pub struct ProberOptions {
    /// Only keep speeches from these institutions (names or aliases)
    pub institutions: Option<Vec<String>>,
    /// Ignore the date cache and stored documents
    pub force: bool,
    /// Stop after this many downloads
    pub limit: Option<usize>,
    /// Pause after each download
    pub request_delay: Duration,
}

enum Handled {
    Downloaded,
    Skipped,
}

pub struct DiscoveryProber {
    transport: Arc<dyn Transport>,
    endpoints: SpeechEndpoints,
    store: DocumentStore,
    resolver: InstitutionResolver,
    parser: MetadataParser,
    cache: DateCache,
    materialized: HashSet<String>,
    filter_names: Option<Vec<String>>,
    filter_dirs: Option<HashSet<String>>,
    force: bool,
    limit: Option<usize>,
    request_delay: Duration,
    result: ScrapingResult,
}

impl DiscoveryProber {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoints: SpeechEndpoints,
        store: DocumentStore,
        resolver: InstitutionResolver,
        options: ProberOptions,
    ) -> Self {
        let cache = DateCache::load(store.documents_root());

        let materialized = if options.force {
            HashSet::new()
        } else {
            let codes = store.existing_codes();
            info!("Found {} existing speech files", codes.len());
            codes
        };

        let filter_names = options
            .institutions
            .filter(|names| names.iter().any(|n| !n.trim().is_empty()));
        let filter_dirs: Option<HashSet<String>> = filter_names.as_ref().map(|names| {
            names
                .iter()
                .filter(|n| !n.trim().is_empty())
                .map(|n| directory_name(&resolver.directory().canonicalize(n)))
                .collect()
        });

        Self {
            transport,
            endpoints,
            store,
            resolver,
            parser: MetadataParser::new(),
            cache,
            materialized,
            filter_names,
            filter_dirs,
            force: options.force,
            limit: options.limit,
            request_delay: options.request_delay,
            result: ScrapingResult::default(),
        }
    }

    pub fn into_result(self) -> ScrapingResult {
        self.result
    }

    pub fn limit_reached(&self) -> bool {
        self.limit
            .map_or(false, |limit| self.result.downloaded >= limit)
    }

    /// Probe every letter of `date` until the first 404
    ///
    /// The date is recorded in the cache once its letters are exhausted,
    /// whether or not single identifiers failed along the way. Failures are
    /// reported through [`ScrapingResult::errors`].
    pub async fn scrape_date(&mut self, date: NaiveDate) -> DateFlow {
        if self.limit_reached() {
            return DateFlow::Stop;
        }

        let key = DateCache::cache_key(date, self.filter_names.as_deref());
        if !self.force {
            if let Some(entry) = self.cache.lookup(&key) {
                debug!(
                    date = %date,
                    documents_found = entry.documents_found,
                    "Skipping date (already checked)"
                );
                self.result.skipped += entry.documents_found;
                return DateFlow::Continue;
            }
        }

        let mut documents_found = 0;
        let mut failures = 0;

        for letter in letters() {
            let identifier = match Identifier::new(date, letter) {
                Ok(identifier) => identifier,
                Err(e) => {
                    error!("{}", e);
                    continue;
                }
            };
            let code = identifier.code();

            if !self.force && self.materialized.contains(&code) {
                debug!(identifier = %code, "Skipping (already stored)");
                self.result.skipped += 1;
                documents_found += 1;
                continue;
            }

            let url = self.endpoints.page_url(&identifier);
            match probe(self.transport.as_ref(), &url).await {
                ProbeOutcome::NotFound => {
                    if letter == 'a' {
                        info!(date = %date, "No speeches found (404 at {})", url);
                    }
                    break;
                }
                ProbeOutcome::Failed(e) => {
                    error!(identifier = %code, "Probe failed: {}", e);
                    self.result.record_failure(&code, e.to_string());
                    failures += 1;
                }
                ProbeOutcome::Found(page) => {
                    info!(identifier = %code, date = %date, "Found speech");
                    documents_found += 1;

                    match self.handle_found(&identifier, &page.text()).await {
                        Ok(Handled::Downloaded) => {
                            if self.limit_reached() {
                                info!(
                                    "Reached download limit of {} speeches. Stopping.",
                                    self.result.downloaded
                                );
                                return DateFlow::Stop;
                            }
                            if !self.request_delay.is_zero() {
                                tokio::time::sleep(self.request_delay).await;
                            }
                        }
                        Ok(Handled::Skipped) => {}
                        Err(e) => {
                            error!(identifier = %code, "Error processing speech: {}", e);
                            self.result.record_failure(&code, e.to_string());
                            failures += 1;
                        }
                    }
                }
            }
        }

        if failures > 0 {
            warn!(date = %date, failures, "Date checked with failed identifiers");
        }
        self.cache.record(&key, documents_found);
        if let Err(e) = self.cache.save() {
            warn!("Failed to save date cache: {}", e);
        }

        DateFlow::Continue
    }

    /// Classify a found page and store its document
    async fn handle_found(&mut self, identifier: &Identifier, page: &str) -> ScrapeResult<Handled> {
        let code = identifier.code();
        let raw_text = extract_metadata_text(page);
        let resolution = self.resolver.resolve(&raw_text);
        let category = resolution.category().to_string();

        if let Some(allowed) = &self.filter_dirs {
            if !allowed.contains(&directory_name(&category)) {
                debug!(identifier = %code, institution = %category, "Skipping (not in filter)");
                self.result.skipped += 1;
                return Ok(Handled::Skipped);
            }
        }

        let destination = self.store.document_path(&category, &code);
        if !self.force && destination.exists() {
            debug!(identifier = %code, "Skipping (already exists at {})", destination.display());
            self.result.skipped += 1;
            self.materialized.insert(code);
            return Ok(Handled::Skipped);
        }

        let document_url = self.endpoints.document_url(identifier);
        debug!(identifier = %code, url = %document_url, "Downloading document");
        let document = fetch(self.transport.as_ref(), &document_url).await?;

        let path = self.store.write_document(&category, &code, &document.body)?;
        let record = MetadataRecord {
            identifier: *identifier,
            institution: category.clone(),
            entry: MetadataEntry::new(&raw_text, Some(identifier.date()), self.parser.parse(&raw_text)),
        };
        if let Err(e) = self.store.upsert_record(record) {
            // A document is never left behind without its metadata record
            if let Err(remove_error) = std::fs::remove_file(&path) {
                warn!(identifier = %code, "Could not remove {}: {}", path.display(), remove_error);
            }
            return Err(e);
        }
        if let Err(e) = self.store.append_text_log(&category, &code, &raw_text) {
            warn!(identifier = %code, "Could not append to text log: {}", e);
        }

        self.materialized.insert(code.clone());
        self.result.downloaded += 1;
        info!(identifier = %code, institution = %category, "Downloaded to {}", path.display());

        Ok(Handled::Downloaded)
    }
}
