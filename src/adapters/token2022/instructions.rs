//! Instruction builders for SPL Token and Token-2022
//!
//! SPL Token and Token-2022 share the base instruction encoding, so the
//! base instructions are packed with `spl_token` and addressed to whichever
//! program owns the mint.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_instruction, system_program,
};
use spl_token::instruction::{AuthorityType, TokenInstruction};
use spl_token::solana_program::program_option::COption;

use super::layout::{token_2022_program_id, MetadataPointer};
use crate::domain::RevokeKind;

pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Token-2022 MetadataPointerExtension instruction tag
const METADATA_POINTER_EXTENSION_TAG: u8 = 39;
/// MetadataPointer sub-instruction: Initialize
const METADATA_POINTER_INITIALIZE: u8 = 0;

/// sha256("spl_token_metadata_interface:initialize_account")[..8]
pub const INITIALIZE_METADATA_DISCRIMINATOR: [u8; 8] = [210, 225, 30, 162, 88, 184, 77, 141];

/// Associated token account of `wallet` for `mint` under `token_program`
pub fn get_associated_token_address(wallet: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

pub fn create_associated_token_account(
    payer: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    let ata = get_associated_token_address(wallet, mint, token_program);
    Instruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(ata, false),
            AccountMeta::new_readonly(*wallet, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(*token_program, false),
        ],
        data: vec![],
    }
}

/// Allocate the mint account, funded for `lamports`, owned by `token_program`
pub fn create_mint_account(
    payer: &Pubkey,
    mint: &Pubkey,
    lamports: u64,
    space: usize,
    token_program: &Pubkey,
) -> Instruction {
    system_instruction::create_account(payer, mint, lamports, space as u64, token_program)
}

/// Token-2022 MetadataPointer Initialize; must precede InitializeMint
pub fn initialize_metadata_pointer(
    mint: &Pubkey,
    authority: Option<Pubkey>,
    metadata_address: Option<Pubkey>,
) -> Instruction {
    let mut data = vec![METADATA_POINTER_EXTENSION_TAG, METADATA_POINTER_INITIALIZE];
    data.extend_from_slice(
        &MetadataPointer {
            authority,
            metadata_address,
        }
        .pack(),
    );

    Instruction {
        program_id: token_2022_program_id(),
        accounts: vec![AccountMeta::new(*mint, false)],
        data,
    }
}

pub fn initialize_mint(
    token_program: &Pubkey,
    mint: &Pubkey,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
    decimals: u8,
) -> Instruction {
    let data = TokenInstruction::InitializeMint2 {
        decimals,
        mint_authority: *mint_authority,
        freeze_authority: freeze_authority.copied().map(COption::Some).unwrap_or(COption::None),
    }
    .pack();

    Instruction {
        program_id: *token_program,
        accounts: vec![AccountMeta::new(*mint, false)],
        data,
    }
}

/// Token metadata interface Initialize, writing into the mint itself
pub fn initialize_token_metadata(
    mint: &Pubkey,
    update_authority: &Pubkey,
    mint_authority: &Pubkey,
    name: &str,
    symbol: &str,
    uri: &str,
) -> Instruction {
    let mut data = INITIALIZE_METADATA_DISCRIMINATOR.to_vec();
    for field in [name, symbol, uri] {
        data.extend_from_slice(&(field.len() as u32).to_le_bytes());
        data.extend_from_slice(field.as_bytes());
    }

    Instruction {
        program_id: token_2022_program_id(),
        accounts: vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new_readonly(*update_authority, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(*mint_authority, true),
        ],
        data,
    }
}

pub fn mint_to(
    token_program: &Pubkey,
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: *token_program,
        accounts: vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*authority, true),
        ],
        data: TokenInstruction::MintTo { amount }.pack(),
    }
}

/// SetAuthority to None: permanently gives up the mint or freeze authority
pub fn revoke_authority(
    token_program: &Pubkey,
    mint: &Pubkey,
    current_authority: &Pubkey,
    kind: RevokeKind,
) -> Instruction {
    let authority_type = match kind {
        RevokeKind::Mint => AuthorityType::MintTokens,
        RevokeKind::Freeze => AuthorityType::FreezeAccount,
    };

    Instruction {
        program_id: *token_program,
        accounts: vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new_readonly(*current_authority, true),
        ],
        data: TokenInstruction::SetAuthority {
            authority_type,
            new_authority: COption::None,
        }
        .pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::token2022::layout::spl_token_program_id;

    #[test]
    fn test_ata_derivation_depends_on_program() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let spl = get_associated_token_address(&wallet, &mint, &spl_token_program_id());
        let t22 = get_associated_token_address(&wallet, &mint, &token_2022_program_id());
        assert_ne!(spl, t22);
        assert_eq!(spl, get_associated_token_address(&wallet, &mint, &spl_token_program_id()));
    }

    #[test]
    fn test_create_ata_accounts() {
        let payer = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let program = token_2022_program_id();
        let ix = create_associated_token_account(&payer, &wallet, &mint, &program);

        assert_eq!(ix.program_id, ASSOCIATED_TOKEN_PROGRAM_ID);
        assert!(ix.data.is_empty());
        assert_eq!(ix.accounts.len(), 6);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[1].pubkey, get_associated_token_address(&wallet, &mint, &program));
        assert_eq!(ix.accounts[5].pubkey, program);
    }

    #[test]
    fn test_metadata_pointer_data() {
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let ix = initialize_metadata_pointer(&mint, Some(authority), Some(mint));

        assert_eq!(ix.program_id, token_2022_program_id());
        assert_eq!(ix.data.len(), 66);
        assert_eq!(&ix.data[..2], &[39, 0]);
        assert_eq!(&ix.data[2..34], authority.as_ref());
        assert_eq!(&ix.data[34..66], mint.as_ref());
    }

    #[test]
    fn test_initialize_mint_without_freeze() {
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let ix = initialize_mint(&token_2022_program_id(), &mint, &authority, None, 9);

        // InitializeMint2: tag, decimals, authority, freeze COption tag
        assert_eq!(ix.data[0], 20);
        assert_eq!(ix.data[1], 9);
        assert_eq!(&ix.data[2..34], authority.as_ref());
        assert_eq!(ix.data[34], 0);
        assert_eq!(ix.accounts.len(), 1);
    }

    #[test]
    fn test_initialize_token_metadata_data() {
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let ix = initialize_token_metadata(&mint, &owner, &owner, "Foo", "FOO", "u");

        assert_eq!(&ix.data[..8], &INITIALIZE_METADATA_DISCRIMINATOR);
        assert_eq!(&ix.data[8..12], &3u32.to_le_bytes());
        assert_eq!(&ix.data[12..15], b"Foo");
        assert_eq!(ix.data.len(), 8 + 7 + 7 + 5);
        assert!(ix.accounts[3].is_signer);
        assert_eq!(ix.accounts[0].pubkey, mint);
        assert!(ix.accounts[0].is_writable);
    }

    #[test]
    fn test_mint_to_data() {
        let program = spl_token_program_id();
        let ix = mint_to(
            &program,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            1_500_000_000,
        );
        assert_eq!(ix.program_id, program);
        assert_eq!(ix.data[0], 7);
        assert_eq!(&ix.data[1..9], &1_500_000_000u64.to_le_bytes());
        assert!(ix.accounts[2].is_signer);
    }

    #[test]
    fn test_revoke_data() {
        let program = token_2022_program_id();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        let mint_ix = revoke_authority(&program, &mint, &owner, RevokeKind::Mint);
        assert_eq!(mint_ix.data, vec![6, 0, 0]);
        assert_eq!(mint_ix.program_id, program);

        let freeze_ix = revoke_authority(&program, &mint, &owner, RevokeKind::Freeze);
        assert_eq!(freeze_ix.data, vec![6, 1, 0]);
        assert_eq!(freeze_ix.accounts[0].pubkey, mint);
    }
}
