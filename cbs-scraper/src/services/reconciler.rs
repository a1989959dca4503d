//! Re-filing of speeches stored under `unknown`
//!
//! When the institution tables learn a new name or alias, speeches filed
//! earlier as `unknown` can be classified. For each one that now resolves,
//! the destination metadata is written first, then the document and its
//! text artifact are moved, and only then is the `unknown` entry dropped.
//! An interrupted pass therefore leaves the entry in place, and the next
//! pass finishes the move without duplicating anything.

use super::document_store::{move_file, DocumentStore};
use super::http_client::{fetch, SpeechEndpoints, Transport};
use super::institution_resolver::{InstitutionResolver, Resolution};
use super::metadata_parser::MetadataParser;
use super::page_extractor::extract_metadata_text;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{Identifier, MetadataEntry, StructuredFields, UNKNOWN_CATEGORY};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Speeches moved out of `unknown`
    pub moved: usize,
    /// Speeches (documents or entries) still in `unknown`
    pub remaining: usize,
}

impl ReconcileSummary {
    pub fn as_tuple(&self) -> (usize, usize) {
        (self.moved, self.remaining)
    }
}

impl From<ReconcileSummary> for (usize, usize) {
    fn from(summary: ReconcileSummary) -> Self {
        summary.as_tuple()
    }
}

pub struct Reconciler {
    store: DocumentStore,
    resolver: InstitutionResolver,
    parser: MetadataParser,
    transport: Arc<dyn Transport>,
    endpoints: SpeechEndpoints,
}

impl Reconciler {
    pub fn new(
        store: DocumentStore,
        resolver: InstitutionResolver,
        transport: Arc<dyn Transport>,
        endpoints: SpeechEndpoints,
    ) -> Self {
        Self {
            store,
            resolver,
            parser: MetadataParser::new(),
            transport,
            endpoints,
        }
    }

    /// Try to classify everything in `unknown`
    pub async fn reconcile(&self) -> ScrapeResult<ReconcileSummary> {
        if !self.store.category_dir(UNKNOWN_CATEGORY).is_dir() {
            return Ok(ReconcileSummary::default());
        }

        let entries = self.store.load_metadata(UNKNOWN_CATEGORY);
        let documents = self.store.category_codes(UNKNOWN_CATEGORY)?;
        let mut moved = 0;

        for (code, entry) in &entries {
            if entry.raw_text.trim().is_empty() {
                debug!(identifier = %code, "No metadata text, leaving in unknown");
                continue;
            }

            let institution = match self.resolver.resolve(&entry.raw_text) {
                Resolution::Institution(name) => name,
                Resolution::Unknown => continue,
            };

            let relocated = self
                .relocate(code, &institution, entry.clone())
                .and_then(|()| self.store.remove_metadata(UNKNOWN_CATEGORY, code));
            match relocated {
                Ok(_) => moved += 1,
                Err(e) => error!(identifier = %code, "Error moving to {}: {}", institution, e),
            }
        }

        for code in documents.iter().filter(|code| !entries.contains_key(*code)) {
            let identifier = match Identifier::parse(code) {
                Ok(identifier) => identifier,
                Err(e) => {
                    warn!("Skipping unrecognised document {}: {}", code, e);
                    continue;
                }
            };

            info!(identifier = %code, "Fetching metadata");
            let raw_text = match self.fetch_metadata(&identifier).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!(identifier = %code, "Fetched page has no metadata text");
                    continue;
                }
                Err(e) => {
                    warn!(identifier = %code, "Could not fetch metadata: {}", e);
                    continue;
                }
            };

            let entry = MetadataEntry::new(
                &raw_text,
                Some(identifier.date()),
                StructuredFields::default(),
            );

            match self.resolver.resolve(&raw_text) {
                Resolution::Institution(institution) => {
                    match self.relocate(code, &institution, entry) {
                        Ok(()) => moved += 1,
                        Err(e) => {
                            error!(identifier = %code, "Error moving to {}: {}", institution, e)
                        }
                    }
                }
                Resolution::Unknown => {
                    // Record the text so the next pass can skip the fetch
                    if let Err(e) = self.store.upsert_metadata(UNKNOWN_CATEGORY, code, entry) {
                        error!(identifier = %code, "Error recording metadata: {}", e);
                    }
                }
            }
        }

        let remaining_entries = self.store.load_metadata(UNKNOWN_CATEGORY);
        let remaining_documents = self.store.category_codes(UNKNOWN_CATEGORY)?;

        if remaining_entries.is_empty() && remaining_documents.is_empty() {
            self.store.remove_category_if_empty(UNKNOWN_CATEGORY)?;
        }

        let remaining = remaining_documents
            .iter()
            .chain(remaining_entries.keys())
            .collect::<BTreeSet<_>>()
            .len();

        if moved > 0 {
            info!(
                "Re-categorized {} speech(es) from unknown. {} still unknown.",
                moved, remaining
            );
        }

        Ok(ReconcileSummary { moved, remaining })
    }

    /// Write destination metadata, then move the document and text artifact
    fn relocate(&self, code: &str, institution: &str, mut entry: MetadataEntry) -> ScrapeResult<()> {
        let source_document = self.store.document_path(UNKNOWN_CATEGORY, code);
        let destination_document = self.store.document_path(institution, code);

        if !source_document.exists() && !destination_document.exists() {
            return Err(ScrapeError::Storage(format!(
                "no document for {} in unknown or {}",
                code, institution
            )));
        }

        entry.raw_text = entry.raw_text.trim().to_string();
        if !entry.has_structured_fields() {
            entry.fields = self.parser.parse(&entry.raw_text);
        }
        self.store.upsert_metadata(institution, code, entry)?;

        move_file(&source_document, &destination_document)?;
        move_file(
            &self.store.text_path(UNKNOWN_CATEGORY, code),
            &self.store.text_path(institution, code),
        )?;

        info!(identifier = %code, "Re-categorized from unknown to {}", institution);
        Ok(())
    }

    async fn fetch_metadata(&self, identifier: &Identifier) -> ScrapeResult<String> {
        let url = self.endpoints.page_url(identifier);
        let page = fetch(self.transport.as_ref(), &url).await?;
        Ok(extract_metadata_text(&page.text()))
    }
}
