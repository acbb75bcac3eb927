use crate::config::schema::NetworkConfig;
use crate::error::{FetchError, Result};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::time::Duration;

/// Stream of body chunks as they arrive
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// An opened streaming GET
pub struct TransportResponse {
    /// Reported body length, `None` for chunked responses
    pub content_length: Option<u64>,
    pub body: ChunkStream,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("content_length", &self.content_length)
            .field("body", &"Stream { ... }")
            .finish()
    }
}

/// Capability the fetch engine downloads through
///
/// Implementations must fail with [`FetchError::Network`] for anything that
/// prevents a successful response (DNS, connect, timeout, non-2xx status),
/// and yield `Err` items on the body stream if the transfer breaks off.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a sequential streaming GET
    async fn get(&self, url: &str) -> Result<TransportResponse>;

    /// Get transport name for logging/debugging
    fn transport_name(&self) -> &str;
}

/// HTTP(S) transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create transport from network config
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("{url} returned HTTP {status}")));
        }

        let content_length = response.content_length();
        tracing::debug!(
            "GET {url}: HTTP {status}, content length {}",
            content_length.map_or_else(|| "unknown".to_string(), |len| len.to_string())
        );

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| FetchError::Network(format!("transfer interrupted: {e}")))
            })
            .boxed();

        Ok(TransportResponse {
            content_length,
            body,
        })
    }

    fn transport_name(&self) -> &str {
        "http"
    }
}
