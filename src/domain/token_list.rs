//! Displayed Token List
//!
//! Single-owner holdings list guarded by refresh generations. Every refresh
//! takes a ticket before it starts and either publishes or abandons it. A
//! result is dropped when a newer ticket is still live or a newer list has
//! already been published, so a slow stale refresh never overwrites a newer
//! result and a failed refresh blocks nobody.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;

use super::holding::TokenHolding;

/// Proof that a refresh was started at a given generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Shared, generation-guarded token list
#[derive(Debug, Clone, Default)]
pub struct TokenListState {
    latest_issued: Arc<AtomicU64>,
    live: Arc<Mutex<BTreeSet<u64>>>,
    inner: Arc<RwLock<Published>>,
}

#[derive(Debug, Default)]
struct Published {
    generation: u64,
    holdings: Option<Vec<TokenHolding>>,
}

impl TokenListState {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> MutexGuard<'_, BTreeSet<u64>> {
        // The set stays consistent even if a holder panicked
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a refresh
    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut live = self.live();
        let generation = self.latest_issued.fetch_add(1, Ordering::SeqCst) + 1;
        live.insert(generation);
        RefreshTicket(generation)
    }

    /// Give up a ticket without publishing, e.g. after the load failed
    pub fn abandon(&self, ticket: RefreshTicket) {
        self.live().remove(&ticket.0);
    }

    /// True if no newer refresh is still in flight
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.live().range(ticket.0 + 1..).next().is_none()
    }

    /// Replace the list with the result of `ticket`. Returns false when the
    /// result is stale and was dropped. Either way the ticket is spent.
    pub async fn publish(&self, ticket: RefreshTicket, holdings: Vec<TokenHolding>) -> bool {
        let mut published = self.inner.write().await;
        let superseded = {
            let mut live = self.live();
            live.remove(&ticket.0);
            live.range(ticket.0 + 1..).next().is_some()
        };
        if superseded || ticket.0 < published.generation {
            tracing::debug!(
                "Dropping stale token list (generation {}, published {})",
                ticket.0,
                published.generation
            );
            return false;
        }
        published.generation = ticket.0;
        published.holdings = Some(holdings);
        true
    }

    /// Current list; None until the first refresh completes
    pub async fn snapshot(&self) -> Option<Vec<TokenHolding>> {
        self.inner.read().await.holdings.clone()
    }

    /// Generation of the currently published list (0 = nothing yet)
    pub async fn published_generation(&self) -> u64 {
        self.inner.read().await.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    fn list(n: usize) -> Vec<TokenHolding> {
        (0..n)
            .map(|_| TokenHolding::new(Pubkey::new_unique(), 1.0, "o", 0))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_until_first_publish() {
        let state = TokenListState::new();
        assert!(state.snapshot().await.is_none());
        assert_eq!(state.published_generation().await, 0);
    }

    #[tokio::test]
    async fn test_publish_current_ticket() {
        let state = TokenListState::new();
        let ticket = state.begin_refresh();
        assert!(state.publish(ticket, list(2)).await);
        assert_eq!(state.snapshot().await.unwrap().len(), 2);
        assert_eq!(state.published_generation().await, ticket.generation());
    }

    #[tokio::test]
    async fn test_stale_ticket_is_rejected() {
        let state = TokenListState::new();
        let first = state.begin_refresh();
        let second = state.begin_refresh();

        assert!(state.publish(second, list(3)).await);
        // The first refresh finishes late
        assert!(!state.publish(first, list(1)).await);
        assert_eq!(state.snapshot().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_older_ticket_rejected_even_before_newer_publishes() {
        let state = TokenListState::new();
        let first = state.begin_refresh();
        let _second = state.begin_refresh();

        assert!(!state.is_current(first));
        assert!(!state.publish(first, list(1)).await);
        assert!(state.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_abandoned_newer_ticket_does_not_block_older() {
        let state = TokenListState::new();
        let first = state.begin_refresh();
        let second = state.begin_refresh();
        assert!(!state.is_current(first));

        state.abandon(second);
        assert!(state.is_current(first));
        assert!(state.publish(first, list(2)).await);
        assert_eq!(state.published_generation().await, first.generation());
    }

    #[tokio::test]
    async fn test_spent_ticket_rejected_after_newer_publish() {
        let state = TokenListState::new();
        let first = state.begin_refresh();
        let second = state.begin_refresh();
        state.abandon(first);

        assert!(state.publish(second, list(1)).await);
        // A late publish of the abandoned ticket still loses to the newer list
        assert!(!state.publish(first, list(5)).await);
        assert_eq!(state.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let state = TokenListState::new();
        let other = state.clone();
        let ticket = other.begin_refresh();
        assert!(state.is_current(ticket));
        assert!(other.publish(ticket, list(1)).await);
        assert!(state.snapshot().await.is_some());
    }
}
