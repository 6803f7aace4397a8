//! Wallet Actions
//!
//! User-triggered operations: balance, airdrop, SOL transfer, token launch,
//! mint-to, authority revocation and message signing. Input is validated
//! before any RPC call; network failures are surfaced once and never retried.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use solana_sdk::{
    instruction::Instruction,
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::pipeline::{RefreshOutcome, TokenPipeline};
use crate::adapters::token2022::{
    instructions, mint_len, parse_mint, validate_token_program, Token2022Error, TokenMetadata,
    TokenProgram, METADATA_POINTER_SIZE,
};
use crate::domain::{CreatedMint, CreatedMintRegistry, MintOption, RevokeKind, SelectionSet};
use crate::ports::{AccountReader, ChainError, ChainWriter, StoreError, WalletError, WalletPort};

/// Default launch decimals
pub const DEFAULT_DECIMALS: u8 = 9;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Connect your wallet first")]
    WalletNotConnected,

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Amount {amount} exceeds the maximum of {max}")]
    AmountTooLarge { amount: Decimal, max: Decimal },

    #[error("Amount {amount} has more than {decimals} decimal places")]
    TooPrecise { amount: Decimal, decimals: u8 },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("No tokens selected")]
    NothingSelected,

    #[error("Wallet {wallet} is not the mint authority of {mint}")]
    NotMintAuthority { mint: Pubkey, wallet: Pubkey },

    #[error("Message signature invalid")]
    SignatureMismatch,

    #[error("Simulation failed: {err}")]
    SimulationFailed { err: String, logs: Vec<String> },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Token(#[from] Token2022Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Action knobs taken from configuration
#[derive(Debug, Clone)]
pub struct ActionSettings {
    pub max_airdrop_sol: Decimal,
    pub default_metadata_uri: String,
    /// Simulate every transaction before submitting it
    pub simulate_before_send: bool,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            max_airdrop_sol: dec!(5),
            default_metadata_uri: String::new(),
            simulate_before_send: true,
        }
    }
}

/// Token launch input
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub name: String,
    pub symbol: String,
    /// Metadata document URI; the configured default when None
    pub uri: Option<String>,
    pub decimals: u8,
}

#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub mint: Pubkey,
    pub signature: Signature,
}

#[derive(Debug)]
pub struct MintToOutcome {
    pub signature: Signature,
    pub token_account: Pubkey,
    pub base_units: u64,
    pub created_token_account: bool,
    /// Follow-up refresh when the wallet minted to itself
    pub refresh: Option<JoinHandle<Result<RefreshOutcome, ChainError>>>,
}

#[derive(Debug, Clone)]
pub struct RevokeOutcome {
    pub signature: Signature,
    pub revoked: Vec<Pubkey>,
    pub kind: RevokeKind,
}

pub fn parse_address(input: &str) -> Result<Pubkey, ActionError> {
    Pubkey::from_str(input.trim()).map_err(|_| ActionError::InvalidAddress(input.to_string()))
}

fn require_positive(amount: Decimal) -> Result<(), ActionError> {
    if amount <= Decimal::ZERO {
        return Err(ActionError::NonPositiveAmount);
    }
    Ok(())
}

/// Scale a user amount to integer base units
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<u64, ActionError> {
    require_positive(amount)?;

    let mut factor = Decimal::ONE;
    for _ in 0..decimals {
        factor = factor.checked_mul(Decimal::TEN).ok_or(ActionError::TooPrecise { amount, decimals })?;
    }
    let max = Decimal::from(u64::MAX) / factor;

    let scaled = amount
        .checked_mul(factor)
        .ok_or(ActionError::AmountTooLarge { amount, max })?;
    if !scaled.fract().is_zero() {
        return Err(ActionError::TooPrecise { amount, decimals });
    }
    scaled.to_u64().ok_or(ActionError::AmountTooLarge { amount, max })
}

pub fn sol_to_lamports(sol: Decimal) -> Result<u64, ActionError> {
    to_base_units(sol, 9)
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// Wallet-facing operations over the chain, wallet and pipeline
pub struct WalletActions {
    reader: Arc<dyn AccountReader>,
    writer: Arc<dyn ChainWriter>,
    wallet: Arc<dyn WalletPort>,
    pipeline: TokenPipeline,
    registry: Arc<RwLock<CreatedMintRegistry>>,
    settings: ActionSettings,
}

impl WalletActions {
    pub fn new(
        reader: Arc<dyn AccountReader>,
        writer: Arc<dyn ChainWriter>,
        wallet: Arc<dyn WalletPort>,
        pipeline: TokenPipeline,
        registry: CreatedMintRegistry,
        settings: ActionSettings,
    ) -> Self {
        Self {
            reader,
            writer,
            wallet,
            pipeline,
            registry: Arc::new(RwLock::new(registry)),
            settings,
        }
    }

    pub fn pipeline(&self) -> &TokenPipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &ActionSettings {
        &self.settings
    }

    /// Connected wallet key, or `WalletNotConnected`
    pub fn wallet_key(&self) -> Result<Pubkey, ActionError> {
        self.wallet.public_key().ok_or(ActionError::WalletNotConnected)
    }

    /// Sign with `extra_signers` and the wallet, optionally simulate, submit, confirm
    async fn submit(&self, instructions: &[Instruction], extra_signers: &[&Keypair]) -> Result<Signature, ActionError> {
        let payer = self.wallet_key()?;
        let blockhash = self.writer.get_latest_blockhash().await?;

        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer));
        transaction.message.recent_blockhash = blockhash;
        if !extra_signers.is_empty() {
            transaction
                .try_partial_sign(extra_signers, blockhash)
                .map_err(|e| WalletError::SigningError(e.to_string()))?;
        }
        self.wallet.sign_transaction(&mut transaction)?;

        if self.settings.simulate_before_send {
            let outcome = self.writer.simulate_transaction(&transaction).await?;
            if let Some(err) = outcome.err {
                tracing::warn!("Simulation failed: {} ({} log lines)", err, outcome.logs.len());
                for line in &outcome.logs {
                    tracing::debug!("  {}", line);
                }
                return Err(ActionError::SimulationFailed { err, logs: outcome.logs });
            }
            tracing::debug!("Simulation ok, {:?} compute units", outcome.units_consumed);
        }

        let signature = self.writer.send_transaction(&transaction).await?;
        tracing::info!("Submitted transaction {}", signature);
        self.writer.confirm_transaction(&signature).await?;
        tracing::info!("Confirmed transaction {}", signature);
        Ok(signature)
    }

    /// SOL balance of the connected wallet, in lamports
    pub async fn balance(&self) -> Result<u64, ActionError> {
        let wallet = self.wallet_key()?;
        Ok(self.reader.get_balance(&wallet).await?)
    }

    /// Request a devnet airdrop to the connected wallet
    pub async fn airdrop(&self, amount_sol: Decimal) -> Result<Signature, ActionError> {
        let wallet = self.wallet_key()?;
        require_positive(amount_sol)?;
        if amount_sol > self.settings.max_airdrop_sol {
            return Err(ActionError::AmountTooLarge {
                amount: amount_sol,
                max: self.settings.max_airdrop_sol,
            });
        }
        let lamports = sol_to_lamports(amount_sol)?;

        let signature = self.writer.request_airdrop(&wallet, lamports).await?;
        self.writer.confirm_transaction(&signature).await?;
        tracing::info!("Airdropped {} SOL to {}", amount_sol, wallet);
        Ok(signature)
    }

    /// System transfer from the connected wallet
    pub async fn send_sol(&self, recipient: &str, amount_sol: Decimal) -> Result<Signature, ActionError> {
        let from = self.wallet_key()?;
        let to = parse_address(recipient)?;
        let lamports = sol_to_lamports(amount_sol)?;

        let signature = self
            .submit(&[system_instruction::transfer(&from, &to, lamports)], &[])
            .await?;
        tracing::info!("Sent {} SOL to {}", amount_sol, to);
        Ok(signature)
    }

    /// Create a Token-2022 mint that carries its own metadata
    pub async fn launch_token(&self, request: LaunchRequest) -> Result<LaunchOutcome, ActionError> {
        let payer = self.wallet_key()?;
        let name = request.name.trim();
        let symbol = request.symbol.trim();
        if name.is_empty() {
            return Err(ActionError::EmptyField("Token name"));
        }
        if symbol.is_empty() {
            return Err(ActionError::EmptyField("Token symbol"));
        }
        let uri = request
            .uri
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.settings.default_metadata_uri.clone());

        let mint_keypair = Keypair::new();
        let mint = mint_keypair.pubkey();
        let metadata = TokenMetadata {
            update_authority: Some(payer),
            mint,
            name: name.to_string(),
            symbol: symbol.to_string(),
            uri: uri.clone(),
            additional_metadata: Vec::new(),
        };

        // The account is created for the pointer only; metadata init reallocs
        let space = mint_len(&[METADATA_POINTER_SIZE]);
        let lamports = self
            .writer
            .get_minimum_balance_for_rent_exemption(space + metadata.tlv_len())
            .await?;

        let token_program = TokenProgram::Token2022.id();
        let ixs = vec![
            instructions::create_mint_account(&payer, &mint, lamports, space, &token_program),
            instructions::initialize_metadata_pointer(&mint, Some(payer), Some(mint)),
            instructions::initialize_mint(&token_program, &mint, &payer, None, request.decimals),
            instructions::initialize_token_metadata(&mint, &payer, &payer, name, symbol, &uri),
        ];

        let signature = self.submit(&ixs, &[&mint_keypair]).await?;
        tracing::info!("Launched {} ({}) at {}", name, symbol, mint);

        self.registry
            .write()
            .await
            .record(CreatedMint::new(&mint, symbol, name, request.decimals))?;

        Ok(LaunchOutcome { mint, signature })
    }

    /// Mint `amount` whole tokens of `mint` to `recipient`, creating the
    /// recipient's associated token account when missing
    pub async fn mint_to(&self, mint: &str, recipient: &str, amount: Decimal) -> Result<MintToOutcome, ActionError> {
        let authority = self.wallet_key()?;
        let mint = parse_address(mint)?;
        let recipient = parse_address(recipient)?;
        require_positive(amount)?;

        let account = self
            .reader
            .get_account(&mint)
            .await?
            .ok_or_else(|| ChainError::AccountNotFound(mint.to_string()))?;
        let token_program = validate_token_program(&account.owner)?.id();
        let state = parse_mint(&account.data)?;
        if state.mint_authority != Some(authority) {
            return Err(ActionError::NotMintAuthority {
                mint,
                wallet: authority,
            });
        }
        let base_units = to_base_units(amount, state.decimals)?;

        let token_account = instructions::get_associated_token_address(&recipient, &mint, &token_program);
        let mut ixs = Vec::with_capacity(2);
        let created_token_account = self.reader.get_account(&token_account).await?.is_none();
        if created_token_account {
            tracing::debug!("Creating token account {} for {}", token_account, recipient);
            ixs.push(instructions::create_associated_token_account(
                &authority,
                &recipient,
                &mint,
                &token_program,
            ));
        }
        ixs.push(instructions::mint_to(&token_program, &mint, &token_account, &authority, base_units));

        let signature = self.submit(&ixs, &[]).await?;
        tracing::info!("Minted {} of {} to {}", amount, mint, recipient);

        let refresh = (recipient == authority).then(|| self.pipeline.schedule_refresh(authority));

        Ok(MintToOutcome {
            signature,
            token_account,
            base_units,
            created_token_account,
            refresh,
        })
    }

    /// Permanently revoke the mint or freeze authority of every selected
    /// mint still in the list, in one transaction
    pub async fn revoke(&self, selection: &mut SelectionSet, kind: RevokeKind) -> Result<RevokeOutcome, ActionError> {
        let authority = self.wallet_key()?;
        let current = self.pipeline.list().snapshot().await.unwrap_or_default();
        let mints = selection.resolve(&current);
        if mints.is_empty() {
            return Err(ActionError::NothingSelected);
        }

        let mut ixs = Vec::with_capacity(mints.len());
        for mint in &mints {
            let account = self
                .reader
                .get_account(mint)
                .await?
                .ok_or_else(|| ChainError::AccountNotFound(mint.to_string()))?;
            let token_program = validate_token_program(&account.owner)?.id();
            ixs.push(instructions::revoke_authority(&token_program, mint, &authority, kind));
        }

        let signature = self.submit(&ixs, &[]).await?;
        tracing::info!("{} authority revoked for {} mint(s)", kind.label(), mints.len());

        selection.clear();
        self.pipeline.refresh_authorities().await;

        Ok(RevokeOutcome {
            signature,
            revoked: mints,
            kind,
        })
    }

    /// Sign a UTF-8 message and verify the signature against the wallet key
    pub fn sign_message(&self, message: &str) -> Result<Signature, ActionError> {
        let wallet = self.wallet_key()?;
        if message.is_empty() {
            return Err(ActionError::EmptyField("Message"));
        }

        let signature = self.wallet.sign_message(message.as_bytes())?;
        if !signature.verify(wallet.as_ref(), message.as_bytes()) {
            return Err(ActionError::SignatureMismatch);
        }
        Ok(signature)
    }

    /// Refresh the holdings list for the connected wallet
    pub async fn tokens(&self) -> Result<RefreshOutcome, ActionError> {
        let wallet = self.wallet_key()?;
        Ok(self.pipeline.refresh(&wallet).await?)
    }

    /// Mints the wallet can mint to, from the published list and the registry
    pub async fn mint_options(&self) -> Vec<MintOption> {
        let holdings = self.pipeline.list().snapshot().await.unwrap_or_default();
        self.registry
            .read()
            .await
            .mint_options(&holdings, self.wallet.public_key().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units(dec!(1.5), 6).unwrap(), 1_500_000);
        assert_eq!(to_base_units(dec!(3), 0).unwrap(), 3);
        assert_eq!(to_base_units(dec!(0.000000001), 9).unwrap(), 1);
    }

    #[test]
    fn test_to_base_units_rejects_bad_amounts() {
        assert!(matches!(to_base_units(dec!(0), 6), Err(ActionError::NonPositiveAmount)));
        assert!(matches!(to_base_units(dec!(-1), 6), Err(ActionError::NonPositiveAmount)));
        assert!(matches!(
            to_base_units(dec!(1.5), 0),
            Err(ActionError::TooPrecise { decimals: 0, .. })
        ));
        assert!(matches!(
            to_base_units(dec!(100000000000), 9),
            Err(ActionError::AmountTooLarge { .. })
        ));
    }

    #[test]
    fn test_sol_conversions() {
        assert_eq!(sol_to_lamports(dec!(2)).unwrap(), 2 * LAMPORTS_PER_SOL);
        assert_eq!(lamports_to_sol(1_500_000_000), dec!(1.5));
    }

    #[test]
    fn test_parse_address() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_address(&format!(" {} ", key)).unwrap(), key);
        assert!(matches!(parse_address("nope"), Err(ActionError::InvalidAddress(_))));
    }
}
