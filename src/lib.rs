//! Mintdeck - Solana wallet toolkit library
//!
//! Token holdings enrichment, Token-2022 launches and authority management.
//!
//! # Modules
//!
//! - `domain`: Holdings, selection, the generation-guarded token list, created mints
//! - `ports`: Trait abstractions (AccountReader, ChainWriter, WalletPort, KeyValueStore)
//! - `adapters`: External implementations (Solana RPC, Token-2022 codec, HTTP, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Enrichment pipeline and wallet actions

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
