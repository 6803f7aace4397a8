//! Token Holdings
//!
//! One `TokenHolding` per token account of the connected owner, so a mint
//! held in several accounts appears several times. The enrichable fields
//! are explicit `Option`s; the mint address is the join key across every
//! enrichment pass and has no setter.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// A token balance held by the connected wallet, plus enrichment fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    mint_address: Pubkey,
    /// Decimal-adjusted balance
    pub amount: f64,
    /// Controller of the holding account
    pub owner: String,
    pub decimals: u8,
    /// None = mint authority permanently revoked
    pub mint_authority: Option<String>,
    /// None = freeze authority permanently revoked
    pub freeze_authority: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    /// Resolved image URL (not the raw metadata URI)
    pub uri: Option<String>,
}

impl TokenHolding {
    /// Create a fresh, unenriched holding
    pub fn new(mint_address: Pubkey, amount: f64, owner: impl Into<String>, decimals: u8) -> Self {
        Self {
            mint_address,
            amount,
            owner: owner.into(),
            decimals,
            mint_authority: None,
            freeze_authority: None,
            name: None,
            symbol: None,
            uri: None,
        }
    }

    pub fn mint_address(&self) -> &Pubkey {
        &self.mint_address
    }

    /// Builder: set both authorities
    pub fn with_authorities(
        mut self,
        mint_authority: Option<String>,
        freeze_authority: Option<String>,
    ) -> Self {
        self.mint_authority = mint_authority;
        self.freeze_authority = freeze_authority;
        self
    }

    /// Builder: set descriptive metadata
    pub fn with_metadata(
        mut self,
        name: Option<String>,
        symbol: Option<String>,
        uri: Option<String>,
    ) -> Self {
        self.name = name;
        self.symbol = symbol;
        self.uri = uri;
        self
    }

    /// Status of the mint authority relative to `wallet`
    pub fn mint_authority_status(&self, wallet: Option<&Pubkey>) -> AuthorityStatus {
        AuthorityStatus::classify(self.mint_authority.as_deref(), wallet)
    }

    /// Status of the freeze authority relative to `wallet`
    pub fn freeze_authority_status(&self, wallet: Option<&Pubkey>) -> AuthorityStatus {
        AuthorityStatus::classify(self.freeze_authority.as_deref(), wallet)
    }

    /// True if `wallet` holds the mint or the freeze authority
    pub fn is_controlled_by(&self, wallet: Option<&Pubkey>) -> bool {
        self.mint_authority_status(wallet) == AuthorityStatus::YouControl
            || self.freeze_authority_status(wallet) == AuthorityStatus::YouControl
    }

    /// Display label: symbol, or "Unknown Token"
    pub fn display_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or("Unknown Token")
    }

    /// Shortened mint address (`ABCD...WXYZ`)
    pub fn short_mint(&self) -> String {
        let full = self.mint_address.to_string();
        if full.len() <= 8 {
            return full;
        }
        format!("{}...{}", &full[..4], &full[full.len() - 4..])
    }
}

/// Who controls an authority, from the connected wallet's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityStatus {
    /// Authority permanently removed on-chain
    Revoked,
    /// The connected wallet holds the authority
    YouControl,
    /// Another address holds the authority
    External,
}

impl AuthorityStatus {
    pub fn classify(authority: Option<&str>, wallet: Option<&Pubkey>) -> Self {
        match (authority, wallet) {
            (None, _) => AuthorityStatus::Revoked,
            (Some(auth), Some(wallet)) if auth == wallet.to_string() => AuthorityStatus::YouControl,
            (Some(_), _) => AuthorityStatus::External,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthorityStatus::Revoked => "Revoked",
            AuthorityStatus::YouControl => "You Control",
            AuthorityStatus::External => "External",
        }
    }
}

/// Drop zero and negative balances; must run before any enrichment pass
pub fn retain_positive(holdings: Vec<TokenHolding>) -> Vec<TokenHolding> {
    holdings.into_iter().filter(|h| h.amount > 0.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_holding_is_unenriched() {
        let mint = Pubkey::new_unique();
        let holding = TokenHolding::new(mint, 12.5, "Owner111", 6);
        assert_eq!(holding.mint_address(), &mint);
        assert!(holding.mint_authority.is_none());
        assert!(holding.name.is_none());
        assert!(holding.uri.is_none());
        assert_eq!(holding.display_symbol(), "Unknown Token");
    }

    #[test]
    fn test_authority_status() {
        let wallet = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        assert_eq!(AuthorityStatus::classify(None, Some(&wallet)), AuthorityStatus::Revoked);
        assert_eq!(
            AuthorityStatus::classify(Some(&wallet.to_string()), Some(&wallet)),
            AuthorityStatus::YouControl
        );
        assert_eq!(
            AuthorityStatus::classify(Some(&other.to_string()), Some(&wallet)),
            AuthorityStatus::External
        );
        // No wallet connected: nobody is "you"
        assert_eq!(
            AuthorityStatus::classify(Some(&wallet.to_string()), None),
            AuthorityStatus::External
        );
        assert_eq!(AuthorityStatus::YouControl.label(), "You Control");
    }

    #[test]
    fn test_is_controlled_by_freeze_only() {
        let wallet = Pubkey::new_unique();
        let holding = TokenHolding::new(Pubkey::new_unique(), 1.0, "o", 0)
            .with_authorities(None, Some(wallet.to_string()));
        assert!(holding.is_controlled_by(Some(&wallet)));
        assert!(!holding.is_controlled_by(Some(&Pubkey::new_unique())));
    }

    #[test]
    fn test_retain_positive_drops_empty_balances() {
        let holdings = vec![
            TokenHolding::new(Pubkey::new_unique(), 0.0, "o", 6),
            TokenHolding::new(Pubkey::new_unique(), 3.0, "o", 6),
            TokenHolding::new(Pubkey::new_unique(), -1.0, "o", 6),
        ];
        let kept = retain_positive(holdings);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].amount, 3.0);
    }

    #[test]
    fn test_short_mint() {
        let holding = TokenHolding::new(Pubkey::new_unique(), 1.0, "o", 0);
        let short = holding.short_mint();
        let full = holding.mint_address().to_string();
        assert!(short.starts_with(&full[..4]));
        assert!(short.ends_with(&full[full.len() - 4..]));
        assert_eq!(short.len(), 11);
    }
}
