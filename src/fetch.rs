//! HTTP transport for the response cache
//!
//! A [`Request`] separates the cache key (the target URL) from secret query
//! parameters such as API keys, which are only appended when the request is
//! actually sent. The [`Fetcher`] trait is the seam between the cache and the
//! network; [`HttpFetcher`] is the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching a resource
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request target could not be parsed as a URL
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },
}

/// A GET request whose cache key never contains secrets
///
/// The cache key is the target exactly as the caller wrote it. It is only
/// parsed as a URL when the request goes out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    target: String,
    secret_query: Vec<(String, String)>,
}

impl Request {
    /// Creates a request for `target` with no secret parameters
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            secret_query: Vec::new(),
        }
    }

    /// Adds a query parameter that is sent on the wire but kept out of the cache key
    pub fn with_secret_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secret_query.push((name.into(), value.into()));
        self
    }

    /// The key under which the response body is cached
    pub fn cache_key(&self) -> &str {
        &self.target
    }

    /// The URL actually requested, secrets included
    pub fn transport_url(&self) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.target).map_err(|source| FetchError::InvalidUrl {
            url: self.target.clone(),
            source,
        })?;
        if !self.secret_query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.secret_query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

/// Performs a single GET and returns the body as text
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, request: &Request) -> Result<String, FetchError>;
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Creates a fetcher with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, request: &Request) -> Result<String, FetchError> {
        // reqwest errors carry the URL, which would leak secret parameters
        let response = self
            .client
            .get(request.transport_url()?)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: request.cache_key().to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))
    }
}
