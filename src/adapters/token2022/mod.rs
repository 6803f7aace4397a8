//! Token-2022 mint layout, metadata codec and instruction builders

pub mod instructions;
pub mod layout;
pub mod metadata;

pub use layout::{
    metadata_pointer, mint_len, parse_mint, spl_token_program_id, token_2022_program_id,
    validate_token_program, MetadataPointer, MintState, Token2022Error, TokenProgram,
    METADATA_POINTER_SIZE,
};
pub use metadata::{decode_metadata_account, embedded_metadata, TokenMetadata};
