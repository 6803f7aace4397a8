//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - Chain RPC reads and writes (account info, token accounts, submission)
//! - Off-chain metadata documents (HTTP JSON)
//! - The wallet (public key, message and transaction signing)
//! - Small persisted state (key-value store)

pub mod chain;
pub mod metadata;
pub mod wallet;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use chain::{
    AccountReader, ChainError, ChainWriter, MintAuthorities, RawAccount, SimulationOutcome,
    TokenAccountBalance,
};
pub use metadata::{MetadataFetchError, OffchainMetadata, OffchainMetadataFetcher};
pub use storage::{KeyValueStore, StoreError};
pub use wallet::{WalletError, WalletPort};
