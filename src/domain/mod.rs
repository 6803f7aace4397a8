//! Domain Layer - wallet-side state with no I/O
//!
//! - `holding`: the TokenHolding record and authority status
//! - `selection`: mints selected for authority revocation
//! - `token_list`: generation-guarded displayed list
//! - `created_mints`: persisted registry of launched mints

pub mod holding;
pub mod selection;
pub mod token_list;
pub mod created_mints;

pub use holding::{retain_positive, AuthorityStatus, TokenHolding};
pub use selection::{controlled_mints, RevokeKind, SelectionSet};
pub use token_list::{RefreshTicket, TokenListState};
pub use created_mints::{CreatedMint, CreatedMintRegistry, MintOption, CREATED_MINTS_KEY};
