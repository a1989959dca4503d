//! Service modules for speech discovery and classification

pub mod date_cache;
pub mod discovery_prober;
pub mod document_store;
pub mod http_client;
pub mod institution_directory;
pub mod institution_resolver;
pub mod metadata_parser;
pub mod page_extractor;
pub mod reconciler;
pub mod scrape_controller;

pub use date_cache::{DateCache, DateCacheEntry};
pub use discovery_prober::{DateFlow, DiscoveryProber};
pub use document_store::DocumentStore;
pub use http_client::{HttpResponse, ProbeOutcome, ReqwestTransport, SpeechEndpoints, Transport};
pub use institution_directory::{directory_name, InstitutionDirectory};
pub use institution_resolver::{InstitutionResolver, Resolution};
pub use metadata_parser::MetadataParser;
pub use reconciler::{ReconcileSummary, Reconciler};
pub use scrape_controller::ScrapeController;
