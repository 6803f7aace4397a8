//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Solana: RPC client (jsonParsed reads, submission) and keypair wallet
//! - Token-2022: mint layout, metadata codec and instruction builders
//! - Offchain: HTTP fetcher for metadata JSON documents
//! - Storage: JSON file key-value store
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod offchain;
pub mod solana;
pub mod storage;
pub mod token2022;

pub use cli::CliApp;
pub use offchain::HttpMetadataFetcher;
pub use solana::{KeypairWallet, SolanaClient};
pub use storage::JsonFileStore;
