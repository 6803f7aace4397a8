//! Enrichment Passes
//!
//! Two independent passes over a holdings list. Both fan out one task per
//! lookup on a `JoinSet` and join results back by key, so the output always
//! has the input's length and order. A failed lookup degrades only its own
//! holding.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::adapters::token2022::{
    decode_metadata_account, embedded_metadata, metadata_pointer, parse_mint, validate_token_program,
    Token2022Error, TokenMetadata, TokenProgram,
};
use crate::domain::TokenHolding;
use crate::ports::{AccountReader, ChainError, MintAuthorities, OffchainMetadataFetcher};

/// Why metadata could not be resolved for one holding
#[derive(Debug, Error)]
enum EnrichError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Decode(#[from] Token2022Error),
}

/// Attach mint and freeze authorities from the parsed mint accounts.
///
/// One lookup per distinct mint. A holding whose lookup fails or returns
/// no mint keeps the authorities it already had.
pub async fn enrich_authorities(reader: Arc<dyn AccountReader>, holdings: Vec<TokenHolding>) -> Vec<TokenHolding> {
    let mints: BTreeSet<Pubkey> = holdings.iter().map(|h| *h.mint_address()).collect();

    let mut tasks = JoinSet::new();
    for mint in mints {
        let reader = Arc::clone(&reader);
        tasks.spawn(async move {
            let result = reader.get_parsed_mint(&mint).await;
            (mint, result)
        });
    }

    let mut authorities: HashMap<Pubkey, MintAuthorities> = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((mint, Ok(Some(parsed)))) => {
                authorities.insert(mint, parsed);
            }
            Ok((mint, Ok(None))) => {
                tracing::debug!("No parsed mint data for {}", mint);
            }
            Ok((mint, Err(e))) => {
                tracing::warn!("Authority lookup failed for {}: {}", mint, e);
            }
            Err(e) => {
                tracing::warn!("Authority lookup task failed: {}", e);
            }
        }
    }

    holdings
        .into_iter()
        .map(|holding| match authorities.get(holding.mint_address()) {
            Some(parsed) => {
                let (mint_authority, freeze_authority) =
                    (parsed.mint_authority.clone(), parsed.freeze_authority.clone());
                holding.with_authorities(mint_authority, freeze_authority)
            }
            None => holding,
        })
        .collect()
}

/// Attach name, symbol and image from Token-2022 metadata.
///
/// Per holding: read the mint, follow its metadata pointer (to the mint
/// itself or to a separate account), decode the metadata, then resolve the
/// off-chain document's `image`. Holdings without a pointer, or whose
/// lookups fail, come back unchanged.
pub async fn enrich_metadata(
    reader: Arc<dyn AccountReader>,
    fetcher: Arc<dyn OffchainMetadataFetcher>,
    holdings: Vec<TokenHolding>,
) -> Vec<TokenHolding> {
    let mut tasks = JoinSet::new();
    for (index, holding) in holdings.iter().cloned().enumerate() {
        let reader = Arc::clone(&reader);
        let fetcher = Arc::clone(&fetcher);
        tasks.spawn(async move { (index, enrich_holding(reader.as_ref(), fetcher.as_ref(), holding).await) });
    }

    let mut enriched = holdings;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, holding)) => enriched[index] = holding,
            Err(e) => tracing::warn!("Metadata task failed: {}", e),
        }
    }
    enriched
}

async fn enrich_holding(
    reader: &dyn AccountReader,
    fetcher: &dyn OffchainMetadataFetcher,
    holding: TokenHolding,
) -> TokenHolding {
    let metadata = match resolve_metadata(reader, holding.mint_address()).await {
        Ok(Some(metadata)) => metadata,
        Ok(None) => return holding,
        Err(e) => {
            tracing::debug!("Metadata unavailable for {}: {}", holding.mint_address(), e);
            return holding;
        }
    };

    let image = match fetcher.fetch(&metadata.uri).await {
        Ok(document) => document.image,
        Err(e) => {
            tracing::debug!("Off-chain metadata fetch failed for {}: {}", metadata.uri, e);
            None
        }
    };

    let uri = image.or_else(|| holding.uri.clone());
    holding.with_metadata(Some(metadata.name), Some(metadata.symbol), uri)
}

/// Decoded on-chain metadata for `mint`, or None when it declares none
async fn resolve_metadata(reader: &dyn AccountReader, mint: &Pubkey) -> Result<Option<TokenMetadata>, EnrichError> {
    let Some(account) = reader.get_account(mint).await? else {
        return Ok(None);
    };

    // Metadata pointers only exist on Token-2022 mints
    if validate_token_program(&account.owner)? != TokenProgram::Token2022 {
        return Ok(None);
    }
    parse_mint(&account.data)?;

    let Some(metadata_address) = metadata_pointer(&account.data)?.and_then(|p| p.metadata_address) else {
        return Ok(None);
    };

    if metadata_address == *mint {
        return Ok(embedded_metadata(&account.data)?);
    }

    match reader.get_account(&metadata_address).await? {
        Some(external) => Ok(Some(decode_metadata_account(&external.data)?)),
        None => {
            tracing::debug!("Metadata account {} for {} does not exist", metadata_address, mint);
            Ok(None)
        }
    }
}
