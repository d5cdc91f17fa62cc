use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use thiserror::Error;
use url::Url;

use super::parser::{parse_feed, ParseResult};
use super::Item;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while refreshing a feed source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Body was not a Pinboard JSON feed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// SEC: the network feed URL embeds the Pinboard secret, so the URL is
/// stripped before the error can be displayed or logged.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.without_url())
    }
}

/// A remote-backed list of timeline items.
///
/// Implementations keep the last successfully fetched collection and replace
/// it wholesale on the next successful `fetch`. A failed fetch leaves the
/// previous collection untouched. There is no retry; the caller decides what
/// a failure means (the timeline just keeps showing stale data).
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Short label for logs and the status line.
    fn name(&self) -> &str;

    /// Current collection. Empty until the first successful fetch.
    fn collection(&self) -> Arc<Vec<Item>>;

    /// Refresh the collection from the network, returning the new item count.
    async fn fetch(&self) -> Result<usize, FetchError>;
}

/// A Pinboard JSON feed endpoint.
pub struct PinboardSource {
    name: String,
    endpoint: Url,
    client: reqwest::Client,
    collection: RwLock<Arc<Vec<Item>>>,
}

impl PinboardSource {
    pub fn new(name: impl Into<String>, endpoint: Url, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            endpoint,
            client,
            collection: RwLock::new(Arc::new(Vec::new())),
        }
    }

    async fn download(&self) -> Result<Vec<u8>, FetchError> {
        let response = tokio::time::timeout(
            FETCH_TIMEOUT,
            self.client.get(self.endpoint.clone()).send(),
        )
        .await
        .map_err(|_| FetchError::Timeout)??;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE).await
    }
}

#[async_trait]
impl FeedSource for PinboardSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self) -> Arc<Vec<Item>> {
        // A poisoned lock still holds a complete Arc; readers never see a torn list.
        let guard = self.collection.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    async fn fetch(&self) -> Result<usize, FetchError> {
        let bytes = self.download().await?;
        let ParseResult { items, skipped } = parse_feed(&bytes, Utc::now())?;

        if skipped > 0 {
            tracing::warn!(
                source = %self.name,
                skipped,
                "Pinboard entries with invalid URL or date skipped"
            );
        }

        let count = items.len();
        *self.collection.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(items);
        tracing::debug!(source = %self.name, count, "Feed source refreshed");
        Ok(count)
    }
}

/// Read a response body, failing fast once it exceeds `limit` bytes.
pub(crate) async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
