//! Created Mint Registry
//!
//! Mints launched from this wallet, persisted across sessions through a
//! `KeyValueStore`. Loaded once at startup, saved on every mutation.
//! Used to offer mint-to targets the wallet no longer holds a balance of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::sync::Arc;

use crate::ports::storage::{KeyValueStore, StoreError};

use super::holding::TokenHolding;

/// Storage key for the created-mints list
pub const CREATED_MINTS_KEY: &str = "createdMints";

/// A mint launched by this wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMint {
    /// Base58 mint address
    pub mint_address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CreatedMint {
    pub fn new(mint_address: &Pubkey, symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            mint_address: mint_address.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            created_at: Some(Utc::now()),
        }
    }

    /// Parsed mint address; None if the stored string is corrupt
    pub fn pubkey(&self) -> Option<Pubkey> {
        self.mint_address.parse().ok()
    }
}

/// A selectable mint-to target
#[derive(Debug, Clone, PartialEq)]
pub struct MintOption {
    pub mint_address: Pubkey,
    pub label: String,
    pub decimals: u8,
}

fn option_label(symbol: Option<&str>, name: Option<&str>, mint: &Pubkey) -> String {
    match symbol.filter(|s| !s.is_empty()) {
        Some(symbol) => format!("{} ({})", symbol, name.unwrap_or_default()),
        None => mint.to_string(),
    }
}

/// Persistent list of created mints
pub struct CreatedMintRegistry {
    store: Arc<dyn KeyValueStore>,
    mints: Vec<CreatedMint>,
}

impl CreatedMintRegistry {
    /// Load the registry. A corrupt stored value is logged and treated as empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let mints = match store.get(CREATED_MINTS_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<CreatedMint>>(&raw) {
                Ok(mints) => mints,
                Err(e) => {
                    tracing::error!("Failed to parse stored mints: {}", e);
                    Vec::new()
                }
            },
        };

        tracing::debug!("Loaded {} created mints", mints.len());
        Ok(Self { store, mints })
    }

    pub fn mints(&self) -> &[CreatedMint] {
        &self.mints
    }

    pub fn len(&self) -> usize {
        self.mints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mints.is_empty()
    }

    /// Append a mint and persist the whole list
    pub fn record(&mut self, mint: CreatedMint) -> Result<(), StoreError> {
        self.mints.push(mint);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.mints)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(CREATED_MINTS_KEY, &raw)
    }

    /// Mint-to options: held mints the wallet can mint, then created mints
    /// that are not in the holdings list at all
    pub fn mint_options(&self, holdings: &[TokenHolding], wallet: Option<&Pubkey>) -> Vec<MintOption> {
        let wallet_str = wallet.map(|w| w.to_string());

        let mut listed = HashSet::new();
        let from_wallet = holdings
            .iter()
            .filter(|h| wallet_str.is_some() && h.mint_authority == wallet_str)
            .filter(|h| listed.insert(*h.mint_address()))
            .map(|h| MintOption {
                mint_address: *h.mint_address(),
                label: option_label(h.symbol.as_deref(), h.name.as_deref(), h.mint_address()),
                decimals: h.decimals,
            });

        let held: HashSet<Pubkey> = holdings.iter().map(|h| *h.mint_address()).collect();
        let from_created = self.mints.iter().filter_map(|m| {
            let mint = m.pubkey()?;
            if held.contains(&mint) {
                return None;
            }
            Some(MintOption {
                mint_address: mint,
                label: option_label(Some(&m.symbol), Some(&m.name), &mint),
                decimals: m.decimals,
            })
        });

        from_wallet.chain(from_created).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::MemoryStore;

    fn registry() -> (Arc<MemoryStore>, CreatedMintRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = CreatedMintRegistry::load(store.clone()).unwrap();
        (store, registry)
    }

    #[test]
    fn test_load_empty() {
        let (_, registry) = registry();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_record_persists() {
        let (store, mut registry) = registry();
        let mint = Pubkey::new_unique();
        registry.record(CreatedMint::new(&mint, "FOO", "Foo", 6)).unwrap();

        let reloaded = CreatedMintRegistry::load(store).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.mints()[0].pubkey(), Some(mint));
        assert_eq!(reloaded.mints()[0].symbol, "FOO");
    }

    #[test]
    fn test_stored_format_is_camel_case() {
        let (store, mut registry) = registry();
        registry.record(CreatedMint::new(&Pubkey::new_unique(), "A", "B", 2)).unwrap();
        let raw = store.get(CREATED_MINTS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"mintAddress\""));
        assert!(raw.contains("\"decimals\":2"));
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(CREATED_MINTS_KEY, "{ not json").unwrap();
        let registry = CreatedMintRegistry::load(store).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_legacy_entry_without_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let mint = Pubkey::new_unique();
        let raw = format!(
            r#"[{{"mintAddress":"{}","symbol":"OLD","name":"Old","decimals":9}}]"#,
            mint
        );
        store.set(CREATED_MINTS_KEY, &raw).unwrap();
        let registry = CreatedMintRegistry::load(store).unwrap();
        assert_eq!(registry.mints()[0].created_at, None);
        assert_eq!(registry.mints()[0].pubkey(), Some(mint));
    }

    #[test]
    fn test_mint_options_merge() {
        let wallet = Pubkey::new_unique();
        let (_, mut registry) = registry();

        let held_mine = TokenHolding::new(Pubkey::new_unique(), 5.0, "o", 6)
            .with_authorities(Some(wallet.to_string()), None)
            .with_metadata(Some("Foo".into()), Some("FOO".into()), None);
        let held_unnamed = TokenHolding::new(Pubkey::new_unique(), 5.0, "o", 0)
            .with_authorities(Some(wallet.to_string()), None);
        let held_other = TokenHolding::new(Pubkey::new_unique(), 5.0, "o", 6)
            .with_authorities(Some(Pubkey::new_unique().to_string()), None);

        let created_held = *held_mine.mint_address();
        let created_new = Pubkey::new_unique();
        registry.record(CreatedMint::new(&created_held, "FOO", "Foo", 6)).unwrap();
        registry.record(CreatedMint::new(&created_new, "BAR", "Bar", 9)).unwrap();

        let holdings = vec![held_mine.clone(), held_unnamed.clone(), held_other];
        let options = registry.mint_options(&holdings, Some(&wallet));

        assert_eq!(options.len(), 3);
        assert_eq!(options[0].label, "FOO (Foo)");
        assert_eq!(options[1].label, held_unnamed.mint_address().to_string());
        assert_eq!(options[2].mint_address, created_new);
        assert_eq!(options[2].label, "BAR (Bar)");
        assert_eq!(options[2].decimals, 9);
    }

    #[test]
    fn test_mint_options_one_entry_per_mint() {
        let wallet = Pubkey::new_unique();
        let (_, registry) = registry();
        let mint = Pubkey::new_unique();
        let holdings = vec![
            TokenHolding::new(mint, 1.0, "a", 6).with_authorities(Some(wallet.to_string()), None),
            TokenHolding::new(mint, 2.0, "b", 6).with_authorities(Some(wallet.to_string()), None),
        ];

        let options = registry.mint_options(&holdings, Some(&wallet));
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].mint_address, mint);
    }

    #[test]
    fn test_mint_options_without_wallet_only_created() {
        let (_, mut registry) = registry();
        registry.record(CreatedMint::new(&Pubkey::new_unique(), "X", "Y", 0)).unwrap();
        let held = TokenHolding::new(Pubkey::new_unique(), 1.0, "o", 0)
            .with_authorities(Some(Pubkey::new_unique().to_string()), None);
        let options = registry.mint_options(&[held], None);
        assert_eq!(options.len(), 1);
    }
}
