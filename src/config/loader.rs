//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/devnet.toml.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::offchain::HttpFetcherConfig;
use crate::application::{ActionSettings, DEFAULT_DECIMALS};

/// Metadata document used by launches that do not pass a URI
pub const DEFAULT_METADATA_URI: &str =
    "https://copper-payable-buzzard-589.mypinata.cloud/ipfs/bafkreiflwzauw4n4axr6c3u2lmnquqfst6efajh6duewjy24gsb6llk5cu";

/// Main configuration structure matching config/devnet.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solana: SolanaSection,
    #[serde(default)]
    pub metadata: MetadataSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub launch: LaunchSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint
    pub rpc_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    pub commitment: String,
    /// Wallet keypair path (NEVER commit this file!)
    pub keypair_path: String,
    /// How long to poll for a signature before giving up
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

impl SolanaSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// Get keypair path with environment variable override
    /// Checks SOLANA_KEYPAIR_PATH env var first, falls back to config value
    pub fn get_keypair_path(&self) -> String {
        let path = std::env::var("SOLANA_KEYPAIR_PATH").unwrap_or_else(|_| self.keypair_path.clone());
        shellexpand::tilde(&path).to_string()
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig, ConfigError> {
        CommitmentConfig::from_str(&self.commitment).map_err(|_| {
            ConfigError::ValidationError(format!(
                "commitment must be processed, confirmed or finalized, got '{}'",
                self.commitment
            ))
        })
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
}

/// Off-chain metadata fetch section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataSection {
    pub timeout_secs: u64,
    /// Attempts per document (429 and 5xx are retried)
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for MetadataSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

impl From<&MetadataSection> for HttpFetcherConfig {
    fn from(section: &MetadataSection) -> Self {
        HttpFetcherConfig {
            timeout: Duration::from_secs(section.timeout_secs),
            max_retries: section.max_retries,
            retry_base_delay_ms: section.retry_base_delay_ms,
        }
    }
}

/// Holdings pipeline section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Settle delay before the refresh that follows a mint to self
    pub refresh_delay_ms: u64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self { refresh_delay_ms: 1200 }
    }
}

impl PipelineSection {
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

/// Local state section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for persisted state (created mints)
    pub data_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "~/.mintdeck".to_string(),
        }
    }
}

impl StorageSection {
    pub fn data_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).to_string())
    }
}

/// Token launch and airdrop section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LaunchSection {
    pub default_metadata_uri: String,
    pub default_decimals: u8,
    /// Upper bound for a single devnet airdrop
    pub max_airdrop_sol: Decimal,
    /// Simulate before every submission
    pub simulate_before_send: bool,
}

impl Default for LaunchSection {
    fn default() -> Self {
        Self {
            default_metadata_uri: DEFAULT_METADATA_URI.to_string(),
            default_decimals: DEFAULT_DECIMALS,
            max_airdrop_sol: dec!(5),
            simulate_before_send: true,
        }
    }
}

impl From<&LaunchSection> for ActionSettings {
    fn from(section: &LaunchSection) -> Self {
        ActionSettings {
            max_airdrop_sol: section.max_airdrop_sol,
            default_metadata_uri: section.default_metadata_uri.clone(),
            simulate_before_send: section.simulate_before_send,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate Solana
        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.solana.keypair_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "keypair_path cannot be empty".to_string(),
            ));
        }

        self.solana.commitment_config()?;

        if self.solana.confirm_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "confirm_timeout_secs must be > 0".to_string(),
            ));
        }

        // Validate metadata fetcher
        if self.metadata.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "metadata.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.metadata.max_retries == 0 || self.metadata.max_retries > 10 {
            return Err(ConfigError::ValidationError(format!(
                "metadata.max_retries must be 1-10, got {}",
                self.metadata.max_retries
            )));
        }

        // Validate storage
        if self.storage.data_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.data_dir cannot be empty".to_string(),
            ));
        }

        // Validate launch
        if self.launch.max_airdrop_sol <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "max_airdrop_sol must be > 0, got {}",
                self.launch.max_airdrop_sol
            )));
        }

        if self.launch.default_decimals > 18 {
            return Err(ConfigError::ValidationError(format!(
                "default_decimals must be 0-18, got {}",
                self.launch.default_decimals
            )));
        }

        if !self.launch.default_metadata_uri.starts_with("http://")
            && !self.launch.default_metadata_uri.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "default_metadata_uri must be an http(s) URL, got '{}'",
                self.launch.default_metadata_uri
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[solana]
rpc_url = "https://api.devnet.solana.com"
commitment = "confirmed"
keypair_path = "~/.config/solana/id.json"
confirm_timeout_secs = 45

[metadata]
timeout_secs = 5
max_retries = 2
retry_base_delay_ms = 250

[pipeline]
refresh_delay_ms = 1500

[storage]
data_dir = "/tmp/mintdeck-test"

[launch]
default_metadata_uri = "https://example.com/meta.json"
default_decimals = 6
max_airdrop_sol = 2.5
simulate_before_send = false

[logging]
level = "info"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.solana.commitment, "confirmed");
        assert_eq!(config.solana.confirm_timeout(), Duration::from_secs(45));
        assert_eq!(config.metadata.max_retries, 2);
        assert_eq!(config.pipeline.refresh_delay(), Duration::from_millis(1500));
        assert_eq!(config.storage.data_dir_path(), PathBuf::from("/tmp/mintdeck-test"));
        assert_eq!(config.launch.max_airdrop_sol, dec!(2.5));
        assert_eq!(config.launch.default_decimals, 6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_optional_sections_default() {
        let file = write_config(
            r#"
[solana]
rpc_url = "https://api.devnet.solana.com"
commitment = "finalized"
keypair_path = "~/.config/solana/id.json"
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.solana.confirm_timeout_secs, 60);
        assert_eq!(config.pipeline.refresh_delay_ms, 1200);
        assert_eq!(config.metadata.max_retries, 3);
        assert_eq!(config.launch.max_airdrop_sol, dec!(5));
        assert_eq!(config.launch.default_metadata_uri, DEFAULT_METADATA_URI);
        assert!(config.launch.simulate_before_send);
        assert_eq!(
            config.solana.commitment_config().unwrap(),
            CommitmentConfig::finalized()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_missing_solana_section() {
        let file = write_config("[logging]\nlevel = \"info\"\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ParseError(_)
        ));
    }

    #[test]
    fn test_invalid_commitment() {
        let file = write_config(&create_valid_config().replace("\"confirmed\"", "\"fast\""));
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_airdrop_cap() {
        let file = write_config(&create_valid_config().replace("max_airdrop_sol = 2.5", "max_airdrop_sol = 0"));
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_retries() {
        let file = write_config(&create_valid_config().replace("max_retries = 2", "max_retries = 0"));
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_metadata_uri() {
        let file = write_config(
            &create_valid_config().replace("https://example.com/meta.json", "ipfs://bafy"),
        );
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_section_conversions() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let fetcher = HttpFetcherConfig::from(&config.metadata);
        assert_eq!(fetcher.timeout, Duration::from_secs(5));
        assert_eq!(fetcher.retry_base_delay_ms, 250);

        let settings = ActionSettings::from(&config.launch);
        assert_eq!(settings.max_airdrop_sol, dec!(2.5));
        assert!(!settings.simulate_before_send);
    }
}
