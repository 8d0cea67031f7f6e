//! Network-fetch proxy collaborator
//!
//! The engine's execution context cannot issue cross-origin requests
//! itself, so detail documents are fetched through this proxy interface.
//! Non-success statuses are failures; there is no caching, retrying or
//! timeout policy beyond the transport's own.

use async_trait::async_trait;
use shelfmark_common::{Error, Result};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Shelfmark/0.1.0 (+https://github.com/shelfmark/shelfmark)";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Raw-text fetch of a remote resource
#[async_trait]
pub trait FetchProxy: Send + Sync {
    /// Fetch the resource's raw text content, or a failure reason
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Extraction of the author field from a detail document.
///
/// Document structure is page-specific and supplied by the hosting
/// context; the resolver only post-processes the extracted text
/// (bracket truncation, trimming).
pub trait DocumentQuery: Send + Sync {
    /// Raw author field text, if the document carries one
    fn author_text(&self, document: &str) -> Option<String>;
}

/// reqwest-backed fetch proxy
pub struct HttpFetchProxy {
    http_client: reqwest::Client,
}

impl HttpFetchProxy {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl FetchProxy for HttpFetchProxy {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching detail document");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP error: {}", status.as_u16())));
        }

        response.text().await.map_err(|e| Error::Fetch(e.to_string()))
    }
}
