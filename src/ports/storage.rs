use thiserror::Error;

/// Key-value store error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(String),
}

/// Narrow persistence interface for small, process-wide state
///
/// Values are opaque strings (JSON in practice). Implementations decide
/// where they live: a data directory, a browser store, memory.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; Ok(None) if the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
