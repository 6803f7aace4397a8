use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Off-chain metadata fetch error type
#[derive(Error, Debug)]
pub enum MetadataFetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} for {uri}")]
    Status { status: u16, uri: String },

    #[error("Failed to parse metadata document: {0}")]
    ParseError(String),

    #[error("Invalid metadata URI: {0}")]
    InvalidUri(String),

    #[error("Rate limited, try again later")]
    RateLimited,
}

/// JSON document referenced by an on-chain metadata URI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffchainMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Fetches the off-chain JSON document behind a metadata URI
#[async_trait]
pub trait OffchainMetadataFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<OffchainMetadata, MetadataFetchError>;
}
