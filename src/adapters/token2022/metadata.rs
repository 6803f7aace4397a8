//! Token metadata codec
//!
//! The `TokenMetadata` extension (type 19) stores borsh-encoded fields:
//! - update_authority: 32 bytes, all zeros = None
//! - mint: 32 bytes
//! - name, symbol, uri: u32 LE length + UTF-8 bytes
//! - additional_metadata: u32 LE count + (key, value) string pairs
//!
//! A standalone metadata account stores the same value behind an 8-byte
//! interface discriminator and a u32 length.

use solana_sdk::pubkey::Pubkey;

use super::layout::{find_extension, parse_extensions, ExtensionType, Token2022Error};

/// sha256("spl_token_metadata_interface:token_metadata")[..8]
pub const TOKEN_METADATA_DISCRIMINATOR: [u8; 8] = [112, 132, 90, 90, 11, 88, 157, 87];

/// On-chain token metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenMetadata {
    pub update_authority: Option<Pubkey>,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    /// Off-chain metadata document URI
    pub uri: String,
    pub additional_metadata: Vec<(String, String)>,
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Token2022Error> {
        let end = self.offset + len;
        if end > self.data.len() {
            return Err(Token2022Error::DataTooShort {
                expected: end,
                actual: self.data.len(),
            });
        }
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, Token2022Error> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn pubkey(&mut self) -> Result<Pubkey, Token2022Error> {
        let bytes = self.take(32)?;
        Pubkey::try_from(bytes).map_err(|_| Token2022Error::DataTooShort {
            expected: 32,
            actual: bytes.len(),
        })
    }

    fn string(&mut self, field: &'static str) -> Result<String, Token2022Error> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Token2022Error::InvalidUtf8(field))
    }
}

fn write_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

impl TokenMetadata {
    /// Decode the extension value
    pub fn unpack(data: &[u8]) -> Result<Self, Token2022Error> {
        let mut reader = Reader::new(data);
        let update_authority = Some(reader.pubkey()?).filter(|k| *k != Pubkey::default());
        let mint = reader.pubkey()?;
        let name = reader.string("name")?;
        let symbol = reader.string("symbol")?;
        let uri = reader.string("uri")?;

        let count = reader.u32()? as usize;
        let mut additional_metadata = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let key = reader.string("additional_metadata key")?;
            let value = reader.string("additional_metadata value")?;
            additional_metadata.push((key, value));
        }

        Ok(Self {
            update_authority,
            mint,
            name,
            symbol,
            uri,
            additional_metadata,
        })
    }

    /// Encode as the extension value
    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.packed_len());
        out.extend_from_slice(self.update_authority.unwrap_or_default().as_ref());
        out.extend_from_slice(self.mint.as_ref());
        write_string(&mut out, &self.name);
        write_string(&mut out, &self.symbol);
        write_string(&mut out, &self.uri);
        out.extend_from_slice(&(self.additional_metadata.len() as u32).to_le_bytes());
        for (key, value) in &self.additional_metadata {
            write_string(&mut out, key);
            write_string(&mut out, value);
        }
        out
    }

    /// Encoded size of the extension value
    pub fn packed_len(&self) -> usize {
        let strings = |s: &str| 4 + s.len();
        32 + 32
            + strings(&self.name)
            + strings(&self.symbol)
            + strings(&self.uri)
            + 4
            + self
                .additional_metadata
                .iter()
                .map(|(k, v)| strings(k) + strings(v))
                .sum::<usize>()
    }

    /// Bytes the metadata occupies once written into the mint as a TLV entry
    pub fn tlv_len(&self) -> usize {
        super::layout::TLV_HEADER_SIZE + self.packed_len()
    }
}

/// Metadata embedded in a Token-2022 mint account, if present
pub fn embedded_metadata(mint_data: &[u8]) -> Result<Option<TokenMetadata>, Token2022Error> {
    let extensions = parse_extensions(mint_data)?;
    find_extension(&extensions, ExtensionType::TokenMetadata)
        .map(|ext| TokenMetadata::unpack(&ext.data))
        .transpose()
}

/// Decode metadata held in an account other than the mint.
///
/// Accepts a Token-2022 mint carrying the extension, a discriminator-prefixed
/// interface entry, or the bare borsh value.
pub fn decode_metadata_account(data: &[u8]) -> Result<TokenMetadata, Token2022Error> {
    if let Ok(Some(metadata)) = embedded_metadata(data) {
        return Ok(metadata);
    }

    if data.len() >= 12 && data[..8] == TOKEN_METADATA_DISCRIMINATOR {
        let len = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
        let end = 12 + len;
        if end > data.len() {
            return Err(Token2022Error::DataTooShort {
                expected: end,
                actual: data.len(),
            });
        }
        return TokenMetadata::unpack(&data[12..end]);
    }

    TokenMetadata::unpack(data)
}
