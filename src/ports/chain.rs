use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use thiserror::Error;

/// Chain RPC error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    RpcError(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid account data: {0}")]
    InvalidAccountData(String),

    #[error("Transaction failed: {0}")]
    TransactionError(String),

    #[error("Timeout waiting for confirmation of {0}")]
    ConfirmationTimeout(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Raw account contents
#[derive(Debug, Clone, PartialEq)]
pub struct RawAccount {
    /// Program that owns the account
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// Authority fields of a parsed mint account
#[derive(Debug, Clone, PartialEq)]
pub struct MintAuthorities {
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    pub decimals: u8,
    pub supply: u64,
}

/// One token account returned by an owner + program query
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAccountBalance {
    pub mint: Pubkey,
    pub owner: String,
    /// Decimal-adjusted amount
    pub ui_amount: f64,
    pub decimals: u8,
}

/// Outcome of a transaction simulation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationOutcome {
    /// Program error, if the simulation failed
    pub err: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

impl SimulationOutcome {
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

/// Read side of the chain RPC collaborator
#[async_trait]
pub trait AccountReader: Send + Sync {
    /// Raw account bytes and owner; Ok(None) if the account does not exist
    async fn get_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, ChainError>;

    /// Parsed mint state; Ok(None) if the account does not exist or is not a mint
    async fn get_parsed_mint(&self, mint: &Pubkey) -> Result<Option<MintAuthorities>, ChainError>;

    /// Token accounts owned by `owner` under token program `program_id`
    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<TokenAccountBalance>, ChainError>;

    /// Lamport balance
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ChainError>;
}

/// Write side of the chain RPC collaborator
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, ChainError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError>;

    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationOutcome, ChainError>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError>;

    /// Wait until the signature reaches the configured commitment
    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), ChainError>;

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, ChainError>;
}
