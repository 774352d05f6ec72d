//! HTTP page fetching.
//!
//! One thin boundary over the network: text for pages, bytes for images.
//! Non-2xx responses are errors, never empty content. Retry policy (or
//! the decision to treat a failure as soft) belongs to callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::HarvestError;

/// Default user agent sent with every request.
pub const USER_AGENT: &str = concat!("counterharvest/", env!("CARGO_PKG_VERSION"));

/// Fetches remote resources. Implemented over HTTP for real runs and by
/// in-memory fakes in tests.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a page body as text.
    async fn get_text(&self, url: &str) -> Result<String, HarvestError>;

    /// Fetch a resource as raw bytes.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HarvestError>;
}

/// HTTP fetcher with a per-request timeout and a courtesy delay between
/// requests from the same worker.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    request_delay: Duration,
}

impl HttpFetcher {
    /// Create a new fetcher. The timeout applies to each request; the
    /// delay is awaited before each request to stay polite toward the
    /// source site.
    pub fn new(timeout: Duration, request_delay: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            request_delay,
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, HarvestError> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, HarvestError> {
        Ok(self.get(url).await?.text().await?)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        Ok(self.get(url).await?.bytes().await?.to_vec())
    }
}
