//! Token Pipeline
//!
//! Loads the owner's token accounts from both token programs, drops empty
//! balances, runs the authority pass then the metadata pass, and publishes
//! the result through the generation-guarded token list.

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use tokio::task::JoinHandle;

use super::enrichment::{enrich_authorities, enrich_metadata};
use crate::adapters::token2022::TokenProgram;
use crate::domain::{retain_positive, TokenHolding, TokenListState};
use crate::ports::{AccountReader, ChainError, OffchainMetadataFetcher};

/// Default settle delay before refreshing after a self-mint
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1200);

/// Result of one refresh
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub holdings: Vec<TokenHolding>,
    pub generation: u64,
    /// False when a newer refresh superseded this one
    pub published: bool,
}

/// Holdings loader + enrichment orchestrator
#[derive(Clone)]
pub struct TokenPipeline {
    reader: Arc<dyn AccountReader>,
    fetcher: Arc<dyn OffchainMetadataFetcher>,
    list: TokenListState,
    refresh_delay: Duration,
}

impl TokenPipeline {
    pub fn new(reader: Arc<dyn AccountReader>, fetcher: Arc<dyn OffchainMetadataFetcher>) -> Self {
        Self {
            reader,
            fetcher,
            list: TokenListState::new(),
            refresh_delay: DEFAULT_REFRESH_DELAY,
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn list(&self) -> &TokenListState {
        &self.list
    }

    pub fn refresh_delay(&self) -> Duration {
        self.refresh_delay
    }

    /// Token accounts of `owner` under SPL Token and Token-2022, positive balances only
    pub async fn load_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, ChainError> {
        let spl = TokenProgram::Spl.id();
        let token_2022 = TokenProgram::Token2022.id();

        let (spl_accounts, token_2022_accounts) = tokio::try_join!(
            self.reader.get_token_accounts_by_owner(owner, &spl),
            self.reader.get_token_accounts_by_owner(owner, &token_2022),
        )?;

        let holdings: Vec<TokenHolding> = spl_accounts
            .into_iter()
            .chain(token_2022_accounts)
            .map(|account| TokenHolding::new(account.mint, account.ui_amount, account.owner, account.decimals))
            .collect();

        let total = holdings.len();
        let holdings = retain_positive(holdings);
        tracing::debug!(
            "Loaded {} token accounts for {} ({} with a positive balance)",
            total,
            owner,
            holdings.len()
        );
        Ok(holdings)
    }

    /// Authority pass, then metadata pass
    pub async fn enrich(&self, holdings: Vec<TokenHolding>) -> Vec<TokenHolding> {
        let with_authorities = enrich_authorities(Arc::clone(&self.reader), holdings).await;
        enrich_metadata(Arc::clone(&self.reader), Arc::clone(&self.fetcher), with_authorities).await
    }

    /// Rebuild the list for `owner` from scratch
    pub async fn refresh(&self, owner: &Pubkey) -> Result<RefreshOutcome, ChainError> {
        let ticket = self.list.begin_refresh();
        tracing::debug!("Refresh {} started for {}", ticket.generation(), owner);

        let holdings = match self.load_holdings(owner).await {
            Ok(holdings) => holdings,
            Err(e) => {
                self.list.abandon(ticket);
                return Err(e);
            }
        };
        let holdings = self.enrich(holdings).await;
        let published = self.list.publish(ticket, holdings.clone()).await;

        if published {
            tracing::info!("Token list updated: {} holdings", holdings.len());
        } else {
            tracing::debug!("Refresh {} superseded, result dropped", ticket.generation());
        }

        Ok(RefreshOutcome {
            holdings,
            generation: ticket.generation(),
            published,
        })
    }

    /// Re-run only the authority pass over the published list.
    ///
    /// Returns None when nothing has been published yet.
    pub async fn refresh_authorities(&self) -> Option<RefreshOutcome> {
        let ticket = self.list.begin_refresh();
        let Some(current) = self.list.snapshot().await else {
            self.list.abandon(ticket);
            return None;
        };

        let holdings = enrich_authorities(Arc::clone(&self.reader), current).await;
        let published = self.list.publish(ticket, holdings.clone()).await;

        Some(RefreshOutcome {
            holdings,
            generation: ticket.generation(),
            published,
        })
    }

    /// Refresh after the settle delay, in the background
    pub fn schedule_refresh(&self, owner: Pubkey) -> JoinHandle<Result<RefreshOutcome, ChainError>> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(pipeline.refresh_delay).await;
            pipeline.refresh(&owner).await
        })
    }
}
