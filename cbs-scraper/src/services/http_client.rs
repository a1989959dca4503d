//! HTTP seam for speech pages and documents
//!
//! Everything network-facing goes through [`Transport`], so the prober and
//! reconciler can be driven by an in-memory mock in tests. The production
//! [`ReqwestTransport`] carries a fixed timeout and user agent.

use crate::config::ScraperConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::Identifier;
use async_trait::async_trait;
use std::time::Duration;

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// URL → response. `Err` only when no response was received at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> ScrapeResult<HttpResponse>;
}

/// `reqwest`-backed transport
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> ScrapeResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Transport(e.to_string()))?;

        Ok(Self { http_client })
    }

    pub fn from_config(config: &ScraperConfig) -> ScrapeResult<Self> {
        Self::new(&config.user_agent, config.timeout)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> ScrapeResult<HttpResponse> {
        tracing::debug!(url = %url, "GET");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::Transport(e.to_string()))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// Resource naming on the remote site
///
/// `{base_url}/{prefix}{code}{ext}`, e.g.
/// `https://www.bis.org/review/r240503a.htm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEndpoints {
    base_url: String,
    prefix: String,
    page_extension: String,
    document_extension: String,
}

impl SpeechEndpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: "r".to_string(),
            page_extension: ".htm".to_string(),
            document_extension: ".pdf".to_string(),
        }
    }

    /// Remote resource name: prefix + code
    pub fn resource_name(&self, identifier: &Identifier) -> String {
        format!("{}{}", self.prefix, identifier.code())
    }

    /// Metadata page URL
    pub fn page_url(&self, identifier: &Identifier) -> String {
        format!(
            "{}/{}{}",
            self.base_url,
            self.resource_name(identifier),
            self.page_extension
        )
    }

    /// Document (PDF) URL
    pub fn document_url(&self, identifier: &Identifier) -> String {
        format!(
            "{}/{}{}",
            self.base_url,
            self.resource_name(identifier),
            self.document_extension
        )
    }
}

impl Default for SpeechEndpoints {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BASE_URL)
    }
}

/// Result of probing one identifier's metadata page
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Page exists; body kept for metadata extraction
    Found(HttpResponse),
    /// 404: no speech under this identifier
    NotFound,
    /// Transport failure or unexpected status
    Failed(ScrapeError),
}

/// Fetch `url` and sort the response into a [`ProbeOutcome`]
pub async fn probe(transport: &dyn Transport, url: &str) -> ProbeOutcome {
    match transport.get(url).await {
        Ok(response) if response.is_success() => ProbeOutcome::Found(response),
        Ok(response) if response.is_not_found() => ProbeOutcome::NotFound,
        Ok(response) => ProbeOutcome::Failed(ScrapeError::HttpStatus {
            status: response.status,
            url: url.to_string(),
        }),
        Err(e) => ProbeOutcome::Failed(e),
    }
}

/// Fetch `url`, treating anything but a 2xx response as an error
pub async fn fetch(transport: &dyn Transport, url: &str) -> ScrapeResult<HttpResponse> {
    let response = transport.get(url).await?;
    if response.is_success() {
        Ok(response)
    } else {
        Err(ScrapeError::HttpStatus {
            status: response.status,
            url: url.to_string(),
        })
    }
}
