//! Off-chain Metadata Client
//!
//! Resolves the JSON document a token's metadata URI points at
//! (`{"name", "symbol", "description", "image"}`) with plain HTTP GET.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::ports::{MetadataFetchError, OffchainMetadata, OffchainMetadataFetcher};

/// Configuration for the HttpMetadataFetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Number of attempts
    pub max_retries: u32,
    /// Base delay for backoff (milliseconds)
    pub retry_base_delay_ms: u64,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

/// HTTP client for off-chain metadata documents
#[derive(Debug, Clone)]
pub struct HttpMetadataFetcher {
    config: HttpFetcherConfig,
    http: Client,
}

impl HttpMetadataFetcher {
    pub fn new() -> Result<Self, MetadataFetchError> {
        Self::with_config(HttpFetcherConfig::default())
    }

    pub fn with_config(config: HttpFetcherConfig) -> Result<Self, MetadataFetchError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }

    /// Only absolute http(s) URIs are fetched
    fn parse_uri(uri: &str) -> Result<Url, MetadataFetchError> {
        let url = Url::parse(uri.trim()).map_err(|e| MetadataFetchError::InvalidUri(format!("{}: {}", uri, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(MetadataFetchError::InvalidUri(format!(
                "{}: unsupported scheme '{}'",
                uri, other
            ))),
        }
    }

    /// GET with retry: 429 backs off exponentially, 5xx and transport errors linearly
    async fn execute_with_retry(&self, url: &Url) -> Result<reqwest::Response, MetadataFetchError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries.max(1) {
            match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_millis(
                            self.config.retry_base_delay_ms * 2u64.pow(attempt + 1),
                        );
                        tracing::warn!(
                            "Rate limited (429) by {}, backing off for {:?} (attempt {}/{})",
                            url,
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error = Some(MetadataFetchError::RateLimited);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if status.is_server_error() {
                        let backoff = Duration::from_millis(
                            self.config.retry_base_delay_ms * (attempt as u64 + 1),
                        );
                        last_error = Some(MetadataFetchError::Status {
                            status: status.as_u16(),
                            uri: url.to_string(),
                        });
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(MetadataFetchError::Status {
                            status: status.as_u16(),
                            uri: url.to_string(),
                        });
                    }

                    return Ok(response);
                }
                Err(e) => {
                    tracing::debug!("GET {} failed: {}", url, e);
                    last_error = Some(MetadataFetchError::HttpError(e));
                    let backoff = Duration::from_millis(
                        self.config.retry_base_delay_ms * (attempt as u64 + 1),
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(last_error.unwrap_or(MetadataFetchError::RateLimited))
    }
}

/// Decode a metadata document body
pub fn parse_document(body: &str) -> Result<OffchainMetadata, MetadataFetchError> {
    serde_json::from_str(body).map_err(|e| MetadataFetchError::ParseError(e.to_string()))
}

#[async_trait]
impl OffchainMetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, uri: &str) -> Result<OffchainMetadata, MetadataFetchError> {
        let url = Self::parse_uri(uri)?;
        let response = self.execute_with_retry(&url).await?;
        let body = response.text().await?;
        parse_document(&body)
    }
}
