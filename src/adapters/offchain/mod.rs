//! Off-chain Metadata Adapter
//!
//! HTTP fetcher for the JSON documents referenced by token metadata URIs.
//! The document's `image` field is what the holdings list displays.

mod client;

pub use client::{parse_document, HttpFetcherConfig, HttpMetadataFetcher};
