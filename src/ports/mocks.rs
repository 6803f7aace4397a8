//! Recording test doubles for every port.
//!
//! Built for unit tests and, behind the `test-utils` feature, for the
//! integration tests under `tests/`, so they can drive the pipeline and
//! actions without a network.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

use super::chain::{
    AccountReader, ChainError, ChainWriter, MintAuthorities, RawAccount, SimulationOutcome,
    TokenAccountBalance,
};
use super::metadata::{MetadataFetchError, OffchainMetadata, OffchainMetadataFetcher};
use super::storage::{KeyValueStore, StoreError};
use super::wallet::{WalletError, WalletPort};

/// SetAuthority instruction tag, shared by SPL Token and Token-2022
const SET_AUTHORITY_TAG: u8 = 6;

#[derive(Debug, Default)]
struct ChainState {
    accounts: HashMap<Pubkey, RawAccount>,
    mints: HashMap<Pubkey, MintAuthorities>,
    token_accounts: HashMap<Pubkey, Vec<TokenAccountBalance>>,
    balances: HashMap<Pubkey, u64>,
    failing: HashSet<Pubkey>,
    sent: Vec<Transaction>,
    airdrops: Vec<(Pubkey, u64)>,
    calls: Vec<String>,
    token_query_delay: Duration,
    fail_token_queries: bool,
    simulation: SimulationOutcome,
    fail_sends: bool,
}

/// In-memory chain that records every call
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: raw account at `address`
    pub fn with_account(self, address: Pubkey, owner: Pubkey, data: Vec<u8>) -> Self {
        self.set_account(address, owner, data);
        self
    }

    /// Builder: parsed mint state for `mint`
    pub fn with_mint(self, mint: Pubkey, mint_authority: Option<String>, freeze_authority: Option<String>) -> Self {
        self.state.lock().unwrap().mints.insert(
            mint,
            MintAuthorities {
                mint_authority,
                freeze_authority,
                decimals: 0,
                supply: 0,
            },
        );
        self
    }

    /// Builder: every lookup of `address` fails with an RPC error
    pub fn with_failure(self, address: Pubkey) -> Self {
        self.state.lock().unwrap().failing.insert(address);
        self
    }

    /// Builder: lamport balance
    pub fn with_balance(self, address: Pubkey, lamports: u64) -> Self {
        self.state.lock().unwrap().balances.insert(address, lamports);
        self
    }

    /// Builder: token account returned for `program_id`
    pub fn with_token_account(self, program_id: Pubkey, account: TokenAccountBalance) -> Self {
        self.state
            .lock()
            .unwrap()
            .token_accounts
            .entry(program_id)
            .or_default()
            .push(account);
        self
    }

    pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.state.lock().unwrap().accounts.insert(
            address,
            RawAccount {
                owner,
                lamports: 1_461_600,
                data,
            },
        );
    }

    /// Replace every token account listed under `program_id`
    pub fn set_token_accounts(&self, program_id: Pubkey, accounts: Vec<TokenAccountBalance>) {
        self.state.lock().unwrap().token_accounts.insert(program_id, accounts);
    }

    /// Delay applied to token-account queries (after the data is read)
    pub fn set_token_query_delay(&self, delay: Duration) {
        self.state.lock().unwrap().token_query_delay = delay;
    }

    /// Make token-account queries fail from now on
    pub fn set_fail_token_queries(&self, fail: bool) {
        self.state.lock().unwrap().fail_token_queries = fail;
    }

    pub fn set_simulation(&self, outcome: SimulationOutcome) {
        self.state.lock().unwrap().simulation = outcome;
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    pub fn parsed_mint(&self, mint: &Pubkey) -> Option<MintAuthorities> {
        self.state.lock().unwrap().mints.get(mint).cloned()
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn airdrops(&self) -> Vec<(Pubkey, u64)> {
        self.state.lock().unwrap().airdrops.clone()
    }

    /// Names of every RPC method called, in order
    pub fn get_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }

    /// Apply the SetAuthority(None) instructions of a sent transaction
    fn apply_revocations(state: &mut ChainState, transaction: &Transaction) {
        let keys = &transaction.message.account_keys;
        for ix in &transaction.message.instructions {
            if ix.data.len() < 3 || ix.data[0] != SET_AUTHORITY_TAG || ix.data[2] != 0 {
                continue;
            }
            let Some(mint) = ix.accounts.first().and_then(|i| keys.get(*i as usize)) else {
                continue;
            };
            if let Some(parsed) = state.mints.get_mut(mint) {
                match ix.data[1] {
                    0 => parsed.mint_authority = None,
                    1 => parsed.freeze_authority = None,
                    _ => {}
                }
            }
        }
    }
}

#[async_trait]
impl AccountReader for MockChain {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, ChainError> {
        self.record("getAccountInfo");
        let state = self.state.lock().unwrap();
        if state.failing.contains(address) {
            return Err(ChainError::RpcError(format!("lookup failed for {}", address)));
        }
        Ok(state.accounts.get(address).cloned())
    }

    async fn get_parsed_mint(&self, mint: &Pubkey) -> Result<Option<MintAuthorities>, ChainError> {
        self.record("getParsedAccountInfo");
        let state = self.state.lock().unwrap();
        if state.failing.contains(mint) {
            return Err(ChainError::RpcError(format!("lookup failed for {}", mint)));
        }
        Ok(state.mints.get(mint).cloned())
    }

    async fn get_token_accounts_by_owner(
        &self,
        _owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<TokenAccountBalance>, ChainError> {
        self.record("getTokenAccountsByOwner");
        let (accounts, delay) = {
            let state = self.state.lock().unwrap();
            if state.fail_token_queries {
                return Err(ChainError::RpcError("token account query failed".into()));
            }
            (
                state.token_accounts.get(program_id).cloned().unwrap_or_default(),
                state.token_query_delay,
            )
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(accounts)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ChainError> {
        self.record("getBalance");
        Ok(self.state.lock().unwrap().balances.get(address).copied().unwrap_or(0))
    }
}

#[async_trait]
impl ChainWriter for MockChain {
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, ChainError> {
        self.record("getMinimumBalanceForRentExemption");
        // Same shape as the real rent formula: (128 + len) * 3480 * 2
        Ok((128 + data_len as u64) * 6960)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        self.record("getLatestBlockhash");
        Ok(Hash::new_unique())
    }

    async fn simulate_transaction(&self, _transaction: &Transaction) -> Result<SimulationOutcome, ChainError> {
        self.record("simulateTransaction");
        Ok(self.state.lock().unwrap().simulation.clone())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        self.record("sendTransaction");
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(ChainError::TransactionError("simulated send failure".into()));
        }
        Self::apply_revocations(&mut state, transaction);
        state.sent.push(transaction.clone());
        Ok(transaction.signatures.first().copied().unwrap_or_default())
    }

    async fn confirm_transaction(&self, _signature: &Signature) -> Result<(), ChainError> {
        self.record("confirmTransaction");
        Ok(())
    }

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, ChainError> {
        self.record("requestAirdrop");
        self.state.lock().unwrap().airdrops.push((*to, lamports));
        Ok(Signature::new_unique())
    }
}

/// Off-chain fetcher with canned documents per URI
#[derive(Debug, Clone, Default)]
pub struct MockMetadataFetcher {
    documents: Arc<Mutex<HashMap<String, OffchainMetadata>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockMetadataFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: `uri` resolves to a document whose `image` is `image`
    pub fn with_image(self, uri: &str, image: &str) -> Self {
        self.documents.lock().unwrap().insert(
            uri.to_string(),
            OffchainMetadata {
                image: Some(image.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OffchainMetadataFetcher for MockMetadataFetcher {
    async fn fetch(&self, uri: &str) -> Result<OffchainMetadata, MetadataFetchError> {
        self.calls.lock().unwrap().push(uri.to_string());
        self.documents
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| MetadataFetchError::Status {
                status: 404,
                uri: uri.to_string(),
            })
    }
}

/// Keypair-backed wallet that can be disconnected
pub struct MockWallet {
    keypair: Option<Keypair>,
}

impl MockWallet {
    pub fn connected() -> Self {
        Self {
            keypair: Some(Keypair::new()),
        }
    }

    pub fn disconnected() -> Self {
        Self { keypair: None }
    }
}

impl WalletPort for MockWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|k| k.pubkey())
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        let keypair = self.keypair.as_ref().ok_or(WalletError::NotConnected)?;
        Ok(keypair.sign_message(message))
    }

    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError> {
        let keypair = self.keypair.as_ref().ok_or(WalletError::NotConnected)?;
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[keypair], blockhash)
            .map_err(|e| WalletError::SigningError(e.to_string()))
    }
}

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
