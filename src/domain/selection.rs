//! Token selection for authority revocation
//!
//! UI-local state keyed by mint address. Cleared after any successful
//! mutating action.

use solana_sdk::pubkey::Pubkey;
use std::collections::{BTreeSet, HashSet};

use super::holding::TokenHolding;

/// Which authority a revoke action removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeKind {
    Mint,
    Freeze,
}

impl RevokeKind {
    pub fn label(&self) -> &'static str {
        match self {
            RevokeKind::Mint => "mint",
            RevokeKind::Freeze => "freeze",
        }
    }
}

/// Set of selected mints
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    selected: BTreeSet<Pubkey>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove a mint
    pub fn toggle(&mut self, mint: Pubkey, checked: bool) {
        if checked {
            self.selected.insert(mint);
        } else {
            self.selected.remove(&mint);
        }
    }

    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.selected.contains(mint)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected mints that are still present in `holdings`, each once, in
    /// first-seen list order
    pub fn resolve(&self, holdings: &[TokenHolding]) -> Vec<Pubkey> {
        distinct_mints(holdings.iter().filter(|h| self.selected.contains(h.mint_address())))
    }
}

/// Mints in `holdings` whose mint or freeze authority belongs to `wallet`, each once
pub fn controlled_mints(holdings: &[TokenHolding], wallet: Option<&Pubkey>) -> Vec<Pubkey> {
    distinct_mints(holdings.iter().filter(|h| h.is_controlled_by(wallet)))
}

/// A mint can back several token accounts
fn distinct_mints<'a>(holdings: impl Iterator<Item = &'a TokenHolding>) -> Vec<Pubkey> {
    let mut seen = HashSet::new();
    holdings
        .map(|h| *h.mint_address())
        .filter(|mint| seen.insert(*mint))
        .collect()
}
