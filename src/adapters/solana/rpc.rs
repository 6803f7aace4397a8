use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use solana_client::{rpc_client::RpcClient, rpc_request::RpcRequest};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::parsed::{parse_mint_account, parse_token_accounts, AccountInfoResult, TokenAccountsResult};
use crate::ports::{
    AccountReader, ChainError, ChainWriter, MintAuthorities, RawAccount, SimulationOutcome,
    TokenAccountBalance,
};

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
}

impl SolanaClient {
    /// Create a new Solana RPC client
    pub fn new(rpc_url: String, commitment: CommitmentConfig, confirm_timeout: Duration) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, commitment));
        Self {
            client,
            commitment,
            confirm_timeout,
        }
    }

    pub fn rpc_url(&self) -> String {
        self.client.url()
    }

    /// Run a synchronous RPC call on the blocking pool
    async fn blocking<T, F>(&self, call: F) -> Result<T, ChainError>
    where
        T: Send + 'static,
        F: FnOnce(&RpcClient) -> Result<T, ChainError> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || call(&client))
            .await
            .map_err(|e| ChainError::RpcError(format!("Task join error: {}", e)))?
    }

    /// jsonParsed request through the raw JSON-RPC channel
    async fn send_parsed<T>(&self, request: RpcRequest, params: serde_json::Value) -> Result<T, ChainError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.blocking(move |client| {
            client
                .send::<T>(request, params)
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
    }

    fn parsed_config(&self) -> serde_json::Value {
        json!({
            "encoding": "jsonParsed",
            "commitment": self.commitment.commitment.to_string(),
        })
    }
}

#[async_trait]
impl AccountReader for SolanaClient {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, ChainError> {
        let address = *address;
        let commitment = self.commitment;
        self.blocking(move |client| {
            client
                .get_account_with_commitment(&address, commitment)
                .map(|response| {
                    response.value.map(|account| RawAccount {
                        owner: account.owner,
                        lamports: account.lamports,
                        data: account.data,
                    })
                })
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
    }

    async fn get_parsed_mint(&self, mint: &Pubkey) -> Result<Option<MintAuthorities>, ChainError> {
        let address = mint.to_string();
        let result: AccountInfoResult = self
            .send_parsed(
                RpcRequest::GetAccountInfo,
                json!([address.clone(), self.parsed_config()]),
            )
            .await?;
        parse_mint_account(&address, result)
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<TokenAccountBalance>, ChainError> {
        let result: TokenAccountsResult = self
            .send_parsed(
                RpcRequest::GetTokenAccountsByOwner,
                json!([
                    owner.to_string(),
                    { "programId": program_id.to_string() },
                    self.parsed_config()
                ]),
            )
            .await?;
        Ok(parse_token_accounts(result))
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ChainError> {
        let address = *address;
        let commitment = self.commitment;
        self.blocking(move |client| {
            client
                .get_balance_with_commitment(&address, commitment)
                .map(|response| response.value)
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
    }
}

#[async_trait]
impl ChainWriter for SolanaClient {
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, ChainError> {
        self.blocking(move |client| {
            client
                .get_minimum_balance_for_rent_exemption(data_len)
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        self.blocking(|client| {
            client
                .get_latest_blockhash()
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
    }

    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationOutcome, ChainError> {
        let tx = transaction.clone();
        self.blocking(move |client| {
            client
                .simulate_transaction(&tx)
                .map(|response| SimulationOutcome {
                    err: response.value.err.map(|e| e.to_string()),
                    logs: response.value.logs.unwrap_or_default(),
                    units_consumed: response.value.units_consumed,
                })
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        let tx = transaction.clone();
        self.blocking(move |client| {
            client
                .send_transaction(&tx)
                .map_err(|e| ChainError::TransactionError(e.to_string()))
        })
        .await
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), ChainError> {
        let deadline = Instant::now() + self.confirm_timeout;
        let signature = *signature;

        loop {
            let commitment = self.commitment;
            let status = self
                .blocking(move |client| {
                    client
                        .get_signature_status_with_commitment(&signature, commitment)
                        .map_err(|e| ChainError::RpcError(e.to_string()))
                })
                .await?;

            match status {
                Some(Ok(())) => {
                    tracing::debug!("Transaction {} confirmed", signature);
                    return Ok(());
                }
                Some(Err(e)) => return Err(ChainError::TransactionError(e.to_string())),
                None => {}
            }

            if Instant::now() >= deadline {
                return Err(ChainError::ConfirmationTimeout(signature.to_string()));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, ChainError> {
        let to = *to;
        self.blocking(move |client| {
            client
                .request_airdrop(&to, lamports)
                .map_err(|e| ChainError::RpcError(e.to_string()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SolanaClient::new(
            "https://api.devnet.solana.com".to_string(),
            CommitmentConfig::confirmed(),
            Duration::from_secs(30),
        );
        assert_eq!(client.rpc_url(), "https://api.devnet.solana.com");
    }

    #[test]
    fn test_parsed_config() {
        let client = SolanaClient::new(
            "http://localhost:8899".to_string(),
            CommitmentConfig::finalized(),
            Duration::from_secs(5),
        );
        let config = client.parsed_config();
        assert_eq!(config["encoding"], "jsonParsed");
        assert_eq!(config["commitment"], "finalized");
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::RpcError("test".to_string());
        assert!(err.to_string().contains("RPC request failed"));

        let err = ChainError::ConfirmationTimeout("sig".to_string());
        assert!(err.to_string().contains("Timeout"));
    }
}
