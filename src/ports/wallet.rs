use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use thiserror::Error;

/// Wallet error type
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Failed to sign: {0}")]
    SigningError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The wallet collaborator: owns keys, signs on request
pub trait WalletPort: Send + Sync {
    /// Connected public key, or None if no wallet is connected
    fn public_key(&self) -> Option<Pubkey>;

    /// Sign an arbitrary message
    fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError>;

    /// Add the wallet's signature to a transaction that already carries
    /// a recent blockhash. Other signatures are left in place.
    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError>;
}
