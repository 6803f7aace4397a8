//! jsonParsed RPC response types
//!
//! Shapes returned by `getAccountInfo` and `getTokenAccountsByOwner` with
//! `"encoding": "jsonParsed"` for SPL Token and Token-2022 accounts.

use std::str::FromStr;

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;

use crate::ports::{ChainError, MintAuthorities, TokenAccountBalance};

/// `getAccountInfo` result
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfoResult {
    pub value: Option<AccountInfoValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfoValue {
    pub data: AccountData,
    pub lamports: u64,
    pub owner: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AccountData {
    // Raw first: a [data, encoding] array would also fill the parsed struct
    Raw(Vec<String>),
    Parsed(ParsedAccountData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedAccountData {
    pub parsed: serde_json::Value,
    pub program: String,
}

/// `info` of a parsed mint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintInfo {
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    pub supply: String,
    pub decimals: u8,
}

/// `info` of a parsed token account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    pub mint: String,
    pub owner: String,
    pub token_amount: TokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: Option<f64>,
    pub ui_amount_string: Option<String>,
}

impl TokenAmount {
    /// Decimal-adjusted amount
    pub fn ui_amount(&self) -> f64 {
        if let Some(ui) = self.ui_amount {
            return ui;
        }
        if let Some(ui) = self.ui_amount_string.as_deref().and_then(|s| s.parse().ok()) {
            return ui;
        }
        let raw: f64 = self.amount.parse().unwrap_or(0.0);
        raw / 10f64.powi(self.decimals as i32)
    }
}

/// `getTokenAccountsByOwner` result
#[derive(Debug, Clone, Deserialize)]
pub struct TokenAccountsResult {
    pub value: Vec<KeyedAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyedAccount {
    pub pubkey: String,
    pub account: AccountInfoValue,
}

#[derive(Debug, Clone, Deserialize)]
struct TypedInfo<T> {
    info: T,
    #[serde(rename = "type")]
    account_type: String,
}

fn parsed_data<'a>(value: &'a AccountInfoValue, address: &str) -> Result<&'a ParsedAccountData, ChainError> {
    match &value.data {
        AccountData::Parsed(parsed) => Ok(parsed),
        AccountData::Raw(_) => Err(ChainError::InvalidAccountData(format!(
            "{}: expected jsonParsed encoding, got raw data",
            address
        ))),
    }
}

/// Extract mint authorities. Ok(None) when the account is missing or is not a mint.
pub fn parse_mint_account(mint: &str, result: AccountInfoResult) -> Result<Option<MintAuthorities>, ChainError> {
    let Some(value) = result.value else {
        return Ok(None);
    };

    let parsed = match parsed_data(&value, mint) {
        Ok(parsed) => parsed,
        // Not owned by a program the node can parse
        Err(_) => return Ok(None),
    };

    let typed: TypedInfo<MintInfo> = match serde_json::from_value(parsed.parsed.clone()) {
        Ok(typed) => typed,
        Err(_) => return Ok(None),
    };
    if typed.account_type != "mint" {
        return Ok(None);
    }

    let info = typed.info;
    let supply: u64 = info
        .supply
        .parse()
        .map_err(|e| ChainError::InvalidAccountData(format!("{}: bad supply: {}", mint, e)))?;

    Ok(Some(MintAuthorities {
        mint_authority: info.mint_authority,
        freeze_authority: info.freeze_authority,
        decimals: info.decimals,
        supply,
    }))
}

/// Convert parsed token accounts; entries that do not parse are skipped.
pub fn parse_token_accounts(result: TokenAccountsResult) -> Vec<TokenAccountBalance> {
    result
        .value
        .into_iter()
        .filter_map(|keyed| {
            let parsed = parsed_data(&keyed.account, &keyed.pubkey).ok()?;
            let typed: TypedInfo<TokenAccountInfo> =
                serde_json::from_value(parsed.parsed.clone()).ok()?;
            if typed.account_type != "account" {
                return None;
            }
            let info = typed.info;
            let mint = match Pubkey::from_str(&info.mint) {
                Ok(mint) => mint,
                Err(e) => {
                    tracing::warn!("Skipping token account {} with bad mint: {}", keyed.pubkey, e);
                    return None;
                }
            };
            Some(TokenAccountBalance {
                mint,
                owner: info.owner,
                ui_amount: info.token_amount.ui_amount(),
                decimals: info.token_amount.decimals,
            })
        })
        .collect()
}
