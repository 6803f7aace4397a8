//! Mint Account Layout
//!
//! Parses SPL Token / Token-2022 mint account data.
//!
//! Standard Mint Account Layout (first 82 bytes):
//! - Offset 0-3:   mint_authority_option (u32: 0=None, 1=Some)
//! - Offset 4-35:  mint_authority (Pubkey, 32 bytes)
//! - Offset 36-43: supply (u64)
//! - Offset 44:    decimals (u8)
//! - Offset 45:    is_initialized (bool)
//! - Offset 46-49: freeze_authority_option (u32: 0=None, 1=Some)
//! - Offset 50-81: freeze_authority (Pubkey, 32 bytes)
//!
//! Token-2022 mints with extensions are zero-padded to the 165-byte token
//! account size, followed by a one-byte account type (1 = Mint) and a
//! packed list of TLV entries: type (u16 LE), length (u16 LE), value.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Standard SPL Token program ID
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
/// Token-2022 program ID
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Base mint account size (standard fields)
pub const MINT_BASE_SIZE: usize = 82;
/// Token account size; extended mints are padded up to this
pub const ACCOUNT_BASE_SIZE: usize = 165;
/// Account type discriminator offset for extended accounts
pub const ACCOUNT_TYPE_OFFSET: usize = ACCOUNT_BASE_SIZE;
/// First TLV entry
pub const EXTENSIONS_START_OFFSET: usize = ACCOUNT_TYPE_OFFSET + 1;
/// Account type value for mints
pub const ACCOUNT_TYPE_MINT: u8 = 1;
/// TLV header: type (2) + length (2)
pub const TLV_HEADER_SIZE: usize = 4;
/// Multisig account size; an extended mint may not collide with it
const MULTISIG_SIZE: usize = 355;

/// Errors while decoding token program account data
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Token2022Error {
    #[error("Data too short: expected {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    #[error("Not a mint account (account type {0})")]
    NotAMint(u8),

    #[error("Invalid extension type {extension_type}: {reason}")]
    InvalidExtension { extension_type: u16, reason: String },

    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("Unknown token program: {0}")]
    UnknownProgram(String),
}

pub fn spl_token_program_id() -> Pubkey {
    spl_token::id()
}

pub fn token_2022_program_id() -> Pubkey {
    solana_sdk::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb")
}

/// Token program type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenProgram {
    /// Standard SPL Token program
    Spl,
    /// Token-2022 program with extensions
    Token2022,
}

impl TokenProgram {
    pub fn id(&self) -> Pubkey {
        match self {
            TokenProgram::Spl => spl_token_program_id(),
            TokenProgram::Token2022 => token_2022_program_id(),
        }
    }
}

/// Identify the token program that owns an account
pub fn validate_token_program(owner: &Pubkey) -> Result<TokenProgram, Token2022Error> {
    let owner_str = owner.to_string();
    match owner_str.as_str() {
        SPL_TOKEN_PROGRAM_ID => Ok(TokenProgram::Spl),
        TOKEN_2022_PROGRAM_ID => Ok(TokenProgram::Token2022),
        other => Err(Token2022Error::UnknownProgram(other.to_string())),
    }
}

/// Base mint fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MintState {
    pub mint_authority: Option<Pubkey>,
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<Pubkey>,
}

fn read_coption_pubkey(data: &[u8], offset: usize) -> Option<Pubkey> {
    let tag = u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]);
    if tag != 1 {
        return None;
    }
    Pubkey::try_from(&data[offset + 4..offset + 36]).ok()
}

/// Parse the base mint fields. Works for both SPL Token and Token-2022 mints.
pub fn parse_mint(mint_data: &[u8]) -> Result<MintState, Token2022Error> {
    if mint_data.len() < MINT_BASE_SIZE {
        return Err(Token2022Error::DataTooShort {
            expected: MINT_BASE_SIZE,
            actual: mint_data.len(),
        });
    }

    let mut supply = [0u8; 8];
    supply.copy_from_slice(&mint_data[36..44]);

    Ok(MintState {
        mint_authority: read_coption_pubkey(mint_data, 0),
        supply: u64::from_le_bytes(supply),
        decimals: mint_data[44],
        is_initialized: mint_data[45] != 0,
        freeze_authority: read_coption_pubkey(mint_data, 46),
    })
}

/// Token-2022 extension types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionType {
    Uninitialized,
    TransferFeeConfig,
    MintCloseAuthority,
    DefaultAccountState,
    NonTransferable,
    InterestBearingConfig,
    PermanentDelegate,
    TransferHook,
    MetadataPointer,
    TokenMetadata,
    GroupPointer,
    TokenGroup,
    GroupMemberPointer,
    TokenGroupMember,
    Unknown(u16),
}

impl From<u16> for ExtensionType {
    fn from(value: u16) -> Self {
        match value {
            0 => ExtensionType::Uninitialized,
            1 => ExtensionType::TransferFeeConfig,
            3 => ExtensionType::MintCloseAuthority,
            6 => ExtensionType::DefaultAccountState,
            9 => ExtensionType::NonTransferable,
            10 => ExtensionType::InterestBearingConfig,
            12 => ExtensionType::PermanentDelegate,
            14 => ExtensionType::TransferHook,
            18 => ExtensionType::MetadataPointer,
            19 => ExtensionType::TokenMetadata,
            20 => ExtensionType::GroupPointer,
            21 => ExtensionType::TokenGroup,
            22 => ExtensionType::GroupMemberPointer,
            23 => ExtensionType::TokenGroupMember,
            other => ExtensionType::Unknown(other),
        }
    }
}

impl ExtensionType {
    /// Wire value of the extension type
    pub fn code(&self) -> u16 {
        match self {
            ExtensionType::Uninitialized => 0,
            ExtensionType::TransferFeeConfig => 1,
            ExtensionType::MintCloseAuthority => 3,
            ExtensionType::DefaultAccountState => 6,
            ExtensionType::NonTransferable => 9,
            ExtensionType::InterestBearingConfig => 10,
            ExtensionType::PermanentDelegate => 12,
            ExtensionType::TransferHook => 14,
            ExtensionType::MetadataPointer => 18,
            ExtensionType::TokenMetadata => 19,
            ExtensionType::GroupPointer => 20,
            ExtensionType::TokenGroup => 21,
            ExtensionType::GroupMemberPointer => 22,
            ExtensionType::TokenGroupMember => 23,
            ExtensionType::Unknown(code) => *code,
        }
    }
}

/// One TLV entry
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub extension_type: ExtensionType,
    /// Raw value (excluding type and length)
    pub data: Vec<u8>,
}

/// Walk the TLV extensions of a Token-2022 mint.
///
/// A plain 82-byte mint has no extensions and yields an empty list.
pub fn parse_extensions(mint_data: &[u8]) -> Result<Vec<Extension>, Token2022Error> {
    if mint_data.len() <= ACCOUNT_BASE_SIZE {
        return Ok(Vec::new());
    }

    let account_type = mint_data[ACCOUNT_TYPE_OFFSET];
    if account_type != ACCOUNT_TYPE_MINT {
        return Err(Token2022Error::NotAMint(account_type));
    }

    let mut extensions = Vec::new();
    let mut offset = EXTENSIONS_START_OFFSET;

    while offset + TLV_HEADER_SIZE <= mint_data.len() {
        let ext_type_raw = u16::from_le_bytes([mint_data[offset], mint_data[offset + 1]]);
        let ext_length = u16::from_le_bytes([mint_data[offset + 2], mint_data[offset + 3]]) as usize;

        // Uninitialized marks the end of the used region
        if ext_type_raw == 0 {
            break;
        }

        let value_start = offset + TLV_HEADER_SIZE;
        let value_end = value_start + ext_length;
        if value_end > mint_data.len() {
            return Err(Token2022Error::InvalidExtension {
                extension_type: ext_type_raw,
                reason: format!(
                    "length {} runs past end of account ({} bytes)",
                    ext_length,
                    mint_data.len()
                ),
            });
        }

        extensions.push(Extension {
            extension_type: ExtensionType::from(ext_type_raw),
            data: mint_data[value_start..value_end].to_vec(),
        });

        offset = value_end;
    }

    Ok(extensions)
}

/// Find one extension by type
pub fn find_extension(extensions: &[Extension], extension_type: ExtensionType) -> Option<&Extension> {
    extensions.iter().find(|e| e.extension_type == extension_type)
}

/// MetadataPointer extension value
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataPointer {
    /// Who may update the pointer
    pub authority: Option<Pubkey>,
    /// Account holding the metadata; may be the mint itself
    pub metadata_address: Option<Pubkey>,
}

pub const METADATA_POINTER_SIZE: usize = 64;

fn optional_nonzero_pubkey(bytes: &[u8]) -> Option<Pubkey> {
    Pubkey::try_from(bytes).ok().filter(|k| *k != Pubkey::default())
}

impl MetadataPointer {
    pub fn unpack(data: &[u8]) -> Result<Self, Token2022Error> {
        if data.len() < METADATA_POINTER_SIZE {
            return Err(Token2022Error::InvalidExtension {
                extension_type: ExtensionType::MetadataPointer.code(),
                reason: format!("expected {} bytes, got {}", METADATA_POINTER_SIZE, data.len()),
            });
        }
        Ok(Self {
            authority: optional_nonzero_pubkey(&data[0..32]),
            metadata_address: optional_nonzero_pubkey(&data[32..64]),
        })
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(METADATA_POINTER_SIZE);
        out.extend_from_slice(self.authority.unwrap_or_default().as_ref());
        out.extend_from_slice(self.metadata_address.unwrap_or_default().as_ref());
        out
    }
}

/// Metadata pointer of a Token-2022 mint, if it declares one
pub fn metadata_pointer(mint_data: &[u8]) -> Result<Option<MetadataPointer>, Token2022Error> {
    let extensions = parse_extensions(mint_data)?;
    find_extension(&extensions, ExtensionType::MetadataPointer)
        .map(|ext| MetadataPointer::unpack(&ext.data))
        .transpose()
}

/// Account size of a mint carrying extensions with the given value sizes
pub fn mint_len(extension_value_sizes: &[usize]) -> usize {
    if extension_value_sizes.is_empty() {
        return MINT_BASE_SIZE;
    }
    let tlv: usize = extension_value_sizes
        .iter()
        .map(|size| TLV_HEADER_SIZE + size)
        .sum();
    let len = EXTENSIONS_START_OFFSET + tlv;
    if len == MULTISIG_SIZE {
        len + 2
    } else {
        len
    }
}

/// Build mint account bytes (base fields plus TLV extensions)
pub fn pack_mint(state: &MintState, extensions: &[Extension]) -> Vec<u8> {
    let mut data = vec![0u8; MINT_BASE_SIZE];
    if let Some(auth) = state.mint_authority {
        data[0..4].copy_from_slice(&1u32.to_le_bytes());
        data[4..36].copy_from_slice(auth.as_ref());
    }
    data[36..44].copy_from_slice(&state.supply.to_le_bytes());
    data[44] = state.decimals;
    data[45] = state.is_initialized as u8;
    if let Some(auth) = state.freeze_authority {
        data[46..50].copy_from_slice(&1u32.to_le_bytes());
        data[50..82].copy_from_slice(auth.as_ref());
    }

    if extensions.is_empty() {
        return data;
    }

    data.resize(ACCOUNT_BASE_SIZE, 0);
    data.push(ACCOUNT_TYPE_MINT);
    for ext in extensions {
        data.extend_from_slice(&ext.extension_type.code().to_le_bytes());
        data.extend_from_slice(&(ext.data.len() as u16).to_le_bytes());
        data.extend_from_slice(&ext.data);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_spl_token() {
        let spl_token =
            Pubkey::try_from(bs58::decode(SPL_TOKEN_PROGRAM_ID).into_vec().unwrap().as_slice())
                .unwrap();
        assert_eq!(validate_token_program(&spl_token).unwrap(), TokenProgram::Spl);
        assert_eq!(TokenProgram::Spl.id(), spl_token);
    }

    #[test]
    fn test_validate_token_2022() {
        let token_2022 =
            Pubkey::try_from(bs58::decode(TOKEN_2022_PROGRAM_ID).into_vec().unwrap().as_slice())
                .unwrap();
        assert_eq!(validate_token_program(&token_2022).unwrap(), TokenProgram::Token2022);
        assert_eq!(TokenProgram::Token2022.id(), token_2022);
    }

    #[test]
    fn test_validate_unknown_program() {
        assert!(validate_token_program(&Pubkey::new_unique()).is_err());
    }

    #[test]
    fn test_parse_mint_no_authority() {
        let mint_data = vec![0u8; 82];
        let state = parse_mint(&mint_data).unwrap();
        assert!(state.mint_authority.is_none());
        assert!(state.freeze_authority.is_none());
    }

    #[test]
    fn test_parse_mint_with_both_authorities() {
        let mut mint_data = vec![0u8; 82];

        mint_data[0..4].copy_from_slice(&1u32.to_le_bytes());
        let mint_auth = Pubkey::new_unique();
        mint_data[4..36].copy_from_slice(mint_auth.as_ref());
        mint_data[36..44].copy_from_slice(&5_000u64.to_le_bytes());
        mint_data[44] = 6;
        mint_data[45] = 1;
        mint_data[46..50].copy_from_slice(&1u32.to_le_bytes());
        let freeze_auth = Pubkey::new_unique();
        mint_data[50..82].copy_from_slice(freeze_auth.as_ref());

        let state = parse_mint(&mint_data).unwrap();
        assert_eq!(state.mint_authority, Some(mint_auth));
        assert_eq!(state.freeze_authority, Some(freeze_auth));
        assert_eq!(state.supply, 5_000);
        assert_eq!(state.decimals, 6);
        assert!(state.is_initialized);
    }

    #[test]
    fn test_parse_mint_data_too_short() {
        let mint_data = vec![0u8; 50];
        assert_eq!(
            parse_mint(&mint_data),
            Err(Token2022Error::DataTooShort { expected: 82, actual: 50 })
        );
    }

    #[test]
    fn test_plain_mint_has_no_extensions() {
        let mint_data = vec![0u8; 82];
        assert!(parse_extensions(&mint_data).unwrap().is_empty());
        assert!(metadata_pointer(&mint_data).unwrap().is_none());
    }

    #[test]
    fn test_metadata_pointer_layout() {
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let pointer = MetadataPointer {
            authority: Some(authority),
            metadata_address: Some(mint),
        };
        let data = pack_mint(
            &MintState {
                decimals: 9,
                is_initialized: true,
                ..Default::default()
            },
            &[Extension {
                extension_type: ExtensionType::MetadataPointer,
                data: pointer.pack(),
            }],
        );

        // Matches getMintLen([MetadataPointer]) from the token program
        assert_eq!(data.len(), 234);
        assert_eq!(data.len(), mint_len(&[METADATA_POINTER_SIZE]));
        assert_eq!(data[165], ACCOUNT_TYPE_MINT);
        assert_eq!(u16::from_le_bytes([data[166], data[167]]), 18);
        assert_eq!(u16::from_le_bytes([data[168], data[169]]), 64);

        assert_eq!(metadata_pointer(&data).unwrap(), Some(pointer));
        assert_eq!(parse_mint(&data).unwrap().decimals, 9);
    }

    #[test]
    fn test_zero_pointer_fields_are_none() {
        let pointer = MetadataPointer::unpack(&[0u8; 64]).unwrap();
        assert!(pointer.authority.is_none());
        assert!(pointer.metadata_address.is_none());
    }

    #[test]
    fn test_multiple_extensions_walk() {
        let data = pack_mint(
            &MintState::default(),
            &[
                Extension {
                    extension_type: ExtensionType::MintCloseAuthority,
                    data: vec![7u8; 32],
                },
                Extension {
                    extension_type: ExtensionType::TokenMetadata,
                    data: vec![1, 2, 3],
                },
            ],
        );
        let extensions = parse_extensions(&data).unwrap();
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions[0].extension_type, ExtensionType::MintCloseAuthority);
        assert_eq!(extensions[1].extension_type, ExtensionType::TokenMetadata);
        assert_eq!(extensions[1].data, vec![1, 2, 3]);
        assert!(find_extension(&extensions, ExtensionType::MetadataPointer).is_none());
    }

    #[test]
    fn test_truncated_extension_is_rejected() {
        let mut data = pack_mint(
            &MintState::default(),
            &[Extension {
                extension_type: ExtensionType::MetadataPointer,
                data: vec![0u8; 64],
            }],
        );
        data.truncate(200);
        assert!(matches!(
            parse_extensions(&data),
            Err(Token2022Error::InvalidExtension { extension_type: 18, .. })
        ));
    }

    #[test]
    fn test_wrong_account_type() {
        let mut data = vec![0u8; 170];
        data[ACCOUNT_TYPE_OFFSET] = 2; // token account
        assert_eq!(parse_extensions(&data), Err(Token2022Error::NotAMint(2)));
    }

    #[test]
    fn test_extension_type_from_u16() {
        assert_eq!(ExtensionType::from(18), ExtensionType::MetadataPointer);
        assert_eq!(ExtensionType::from(19), ExtensionType::TokenMetadata);
        assert_eq!(ExtensionType::from(9999), ExtensionType::Unknown(9999));
        assert_eq!(ExtensionType::Unknown(9999).code(), 9999);
    }
}
