//! Header-only HTTP requests.

use crate::link::{parse_link_header, Link};
use async_trait::async_trait;
use ldes_core::ExploreError;
use reqwest::header::LINK;
use reqwest::{Client, Url};
use std::time::Duration;

/// Result type for transport calls
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Client could not be configured
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<TransportError> for ExploreError {
    fn from(err: TransportError) -> Self {
        ExploreError::provider(err)
    }
}

/// Response to a header-only request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    /// HTTP status code
    pub status: u16,
    /// Links from every `Link` header, targets resolved against the request URL
    pub links: Vec<Link>,
}

impl HeadResponse {
    /// First link carrying relation type `rel`
    #[must_use]
    pub fn find_rel(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.has_rel(rel))
    }
}

/// Header inspection capability
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a HEAD request and collect its links
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be completed
    async fn head(&self, url: &str) -> TransportResult<HeadResponse>;
}

/// `reqwest`-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    timeout_ms: u64,
}

impl HttpTransport {
    /// Create a transport with a 30 second timeout
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be built
    pub fn new() -> TransportResult<Self> {
        Self::with_settings(Duration::from_secs(30), None)
    }

    /// Create a transport with an explicit timeout and optional proxy
    ///
    /// # Errors
    ///
    /// Returns error if the proxy URL is invalid or the client cannot be built
    pub fn with_settings(timeout: Duration, proxy: Option<&str>) -> TransportResult<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| TransportError::Config(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self {
            client,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_ms)
        } else {
            TransportError::ConnectionFailed(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn head(&self, url: &str) -> TransportResult<HeadResponse> {
        let base = Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;
        let response = self
            .client
            .head(base.clone())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "HEAD returned non-success status");
        }

        let mut links = Vec::new();
        for value in response.headers().get_all(LINK) {
            match value.to_str() {
                Ok(value) => links.extend(parse_link_header(value)),
                Err(_) => tracing::debug!(%url, "ignoring non-ASCII Link header"),
            }
        }
        for link in &mut links {
            link.target = resolve_target(&base, &link.target);
        }

        Ok(HeadResponse {
            status: status.as_u16(),
            links,
        })
    }
}

/// Resolve a possibly relative link target against `base`
fn resolve_target(base: &Url, target: &str) -> String {
    base.join(target)
        .map(String::from)
        .unwrap_or_else(|_| target.to_string())
}
