use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::fs;
use std::path::Path;

use crate::ports::{WalletError, WalletPort};

/// Keypair-file wallet
pub struct KeypairWallet {
    keypair: Keypair,
}

impl std::fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("pubkey", &self.keypair.pubkey())
            .finish_non_exhaustive()
    }
}

impl KeypairWallet {
    /// Load keypair from a file path (JSON array format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::LoadError(format!("Failed to read file: {}", e)))?;

        // Parse JSON array of bytes
        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Create a new random keypair (for testing)
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Export keypair as bytes (use with caution)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.keypair.to_bytes().to_vec()
    }
}

impl Clone for KeypairWallet {
    fn clone(&self) -> Self {
        Self {
            keypair: self.keypair.insecure_clone(),
        }
    }
}

impl WalletPort for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        Some(self.keypair.pubkey())
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        Ok(self.keypair.sign_message(message))
    }

    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::SigningError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, system_instruction};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_new_random_wallet() {
        let wallet = KeypairWallet::new_random();
        let pubkey = wallet.public_key().unwrap();
        assert_eq!(pubkey, wallet.pubkey());
    }

    #[test]
    fn test_from_bytes() {
        let wallet1 = KeypairWallet::new_random();
        let bytes = wallet1.to_bytes();

        let wallet2 = KeypairWallet::from_bytes(&bytes).unwrap();
        assert_eq!(wallet1.pubkey(), wallet2.pubkey());
    }

    #[test]
    fn test_sign_message_verifies() {
        let wallet = KeypairWallet::new_random();
        let message = b"Hello, Solana!";
        let signature = wallet.sign_message(message).unwrap();

        assert!(signature.verify(wallet.pubkey().as_ref(), message));
    }

    #[test]
    fn test_sign_transaction_keeps_other_slots() {
        let wallet = KeypairWallet::new_random();
        let other = Keypair::new();
        let ix = system_instruction::create_account(&wallet.pubkey(), &other.pubkey(), 1, 0, &Pubkey::new_unique());
        let mut tx = Transaction::new_with_payer(&[ix], Some(&wallet.pubkey()));
        tx.message.recent_blockhash = Hash::new_unique();

        tx.try_partial_sign(&[&other], tx.message.recent_blockhash).unwrap();
        wallet.sign_transaction(&mut tx).unwrap();

        assert!(tx.is_signed());
        assert!(tx.verify().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let wallet1 = KeypairWallet::new_random();

        let json = serde_json::to_string(&wallet1.to_bytes()).unwrap();
        temp_file.write_all(json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let wallet2 = KeypairWallet::from_file(temp_file.path()).unwrap();
        assert_eq!(wallet1.pubkey(), wallet2.pubkey());
    }

    #[test]
    fn test_clone_wallet() {
        let wallet1 = KeypairWallet::new_random();
        let wallet2 = wallet1.clone();
        assert_eq!(wallet1.pubkey(), wallet2.pubkey());
    }

    #[test]
    fn test_invalid_bytes() {
        let result = KeypairWallet::from_bytes(&[0u8; 10]);
        assert!(matches!(result, Err(WalletError::InvalidKeypair(_))));
    }

    #[test]
    fn test_invalid_json_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not valid json").unwrap();
        temp_file.flush().unwrap();

        let result = KeypairWallet::from_file(temp_file.path());
        assert!(matches!(result, Err(WalletError::LoadError(_))));
    }
}
