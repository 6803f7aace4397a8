//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, LaunchSection, LoggingSection, MetadataSection, PipelineSection,
    SolanaSection, StorageSection, load_config, DEFAULT_METADATA_URI,
};
