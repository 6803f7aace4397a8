pub mod actions;
pub mod enrichment;
pub mod pipeline;

pub use actions::{
    lamports_to_sol, parse_address, sol_to_lamports, to_base_units, ActionError, ActionSettings,
    LaunchOutcome, LaunchRequest, MintToOutcome, RevokeOutcome, WalletActions, DEFAULT_DECIMALS,
};
pub use enrichment::{enrich_authorities, enrich_metadata};
pub use pipeline::{RefreshOutcome, TokenPipeline, DEFAULT_REFRESH_DELAY};
