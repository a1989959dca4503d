//! Test Helper Utilities
//!
//! In-memory transport and fixture builders shared by the cbs-scraper
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cbs_scraper::services::discovery_prober::ProberOptions;
use cbs_scraper::services::{
    DiscoveryProber, DocumentStore, HttpResponse, InstitutionResolver, SpeechEndpoints, Transport,
};
use cbs_scraper::{Identifier, ScrapeError, ScrapeResult};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BASE_URL: &str = "http://speeches.test/review";

/// Minimal PDF payload
pub const PDF_BYTES: &[u8] = b"%PDF-1.4 test document";

#[derive(Debug, Clone)]
enum Reply {
    Response(u16, Vec<u8>),
    Failure(String),
}

/// Transport serving canned responses; unregistered URLs answer 404
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Response(status, body.into()));
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Failure(message.to_string()));
    }

    /// Every URL requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Requested metadata pages, in order
    pub fn page_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|url| url.ends_with(".htm"))
            .collect()
    }

    /// Requested documents, in order
    pub fn document_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|url| url.ends_with(".pdf"))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> ScrapeResult<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            Some(Reply::Response(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Reply::Failure(message)) => Err(ScrapeError::Transport(message)),
            None => Ok(HttpResponse::new(404, "Not Found")),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn id(date: NaiveDate, letter: char) -> Identifier {
    Identifier::new(date, letter).unwrap()
}

pub fn endpoints() -> SpeechEndpoints {
    SpeechEndpoints::new(BASE_URL)
}

pub fn store(temp_dir: &TempDir) -> DocumentStore {
    DocumentStore::new(temp_dir.path().join("pdfs"), temp_dir.path().join("texts"))
}

/// Speech page with the metadata sentence in its `#extratitle-div`
pub fn speech_page(raw_text: &str) -> String {
    format!(
        r#"<html><head><title>Central bank speech</title></head><body>
<div id="header">BIS - Review</div>
<div id="extratitle-div"><p>{}</p></div>
<div id="footer">Copyright</div>
</body></html>"#,
        raw_text
    )
}

/// Metadata sentence naming `institution`
pub fn speech_text(speaker: &str, institution: &str, day: &str) -> String {
    format!(
        "Speech by {}, Governor of the {}, at the Annual Conference, {}.",
        speaker, institution, day
    )
}

/// Register page and document for one identifier
pub fn publish(transport: &MockTransport, identifier: &Identifier, raw_text: &str) {
    let endpoints = endpoints();
    transport.respond(&endpoints.page_url(identifier), 200, speech_page(raw_text));
    transport.respond(&endpoints.document_url(identifier), 200, PDF_BYTES);
}

/// Register pages and documents for letters `a..=last` of `date`
pub fn publish_letters(transport: &MockTransport, date: NaiveDate, last: char, institution: &str) {
    for letter in 'a'..=last {
        let text = speech_text(&format!("Mr Speaker {}", letter), institution, "3 May 2024");
        publish(transport, &id(date, letter), &text);
    }
}

pub fn prober(
    transport: &Arc<MockTransport>,
    temp_dir: &TempDir,
    options: ProberOptions,
) -> DiscoveryProber {
    DiscoveryProber::new(
        transport.clone(),
        endpoints(),
        store(temp_dir),
        InstitutionResolver::default(),
        options,
    )
}
