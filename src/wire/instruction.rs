//! Decoders for the three pump.fun instruction payloads we care about.

use crate::config::{LAMPORTS_PER_SOL, TOKEN_DECIMALS};
use crate::core::{PipelineError, PipelineResult};
use solana_sdk::pubkey::Pubkey;

/// Account positions within a `create` instruction's account list (spec §4.1).
mod create_accounts {
    pub const MINT: usize = 0;
    pub const BONDING_CURVE: usize = 2;
    pub const ASSOCIATED_BONDING_CURVE: usize = 3;
    pub const USER: usize = 7;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub mint: String,
    pub bonding_curve: String,
    pub associated_bonding_curve: String,
    pub user: String,
}

/// Decode a `create` instruction: an 8-byte discriminator followed by three
/// length-prefixed UTF-8 strings (name, symbol, uri). Mint and authority
/// addresses come from the instruction's account list, not its data.
pub fn decode_create(
    data: &[u8],
    accounts: &[u8],
    account_keys: &[Pubkey],
) -> PipelineResult<CreateArgs> {
    let mut offset = 8usize;
    let name = read_string(data, &mut offset)?;
    let symbol = read_string(data, &mut offset)?;
    let uri = read_string(data, &mut offset)?;

    let resolve = |position: usize| -> PipelineResult<String> {
        let account_index = *accounts
            .get(position)
            .ok_or_else(|| PipelineError::Decode("create instruction missing account".into()))?;
        account_keys
            .get(account_index as usize)
            .map(|pk| pk.to_string())
            .ok_or_else(|| PipelineError::Decode("create instruction account out of range".into()))
    };

    Ok(CreateArgs {
        name,
        symbol,
        uri,
        mint: resolve(create_accounts::MINT)?,
        bonding_curve: resolve(create_accounts::BONDING_CURVE)?,
        associated_bonding_curve: resolve(create_accounts::ASSOCIATED_BONDING_CURVE)?,
        user: resolve(create_accounts::USER)?,
    })
}

fn read_string(data: &[u8], offset: &mut usize) -> PipelineResult<String> {
    let len_bytes = data
        .get(*offset..*offset + 4)
        .ok_or_else(|| PipelineError::Decode("truncated string length".into()))?;
    let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
    *offset += 4;
    let bytes = data
        .get(*offset..*offset + len)
        .ok_or_else(|| PipelineError::Decode("truncated string body".into()))?;
    *offset += len;
    String::from_utf8(bytes.to_vec()).map_err(|e| PipelineError::Decode(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeArgs {
    pub token_amount: f64,
    pub sol_amount: f64,
}

/// Decode a `buy` or `sell` instruction: discriminator at 0..8, raw token
/// units (u64 LE) at 8..16, raw lamports (u64 LE) at 16..24.
pub fn decode_trade(data: &[u8]) -> PipelineResult<TradeArgs> {
    let raw_tokens = read_u64_le(data, 8)?;
    let raw_lamports = read_u64_le(data, 16)?;
    Ok(TradeArgs {
        token_amount: raw_tokens as f64 / 10f64.powi(TOKEN_DECIMALS as i32),
        sol_amount: raw_lamports as f64 / LAMPORTS_PER_SOL as f64,
    })
}

fn read_u64_le(data: &[u8], offset: usize) -> PipelineResult<u64> {
    let slice = data
        .get(offset..offset + 8)
        .ok_or_else(|| PipelineError::Decode("truncated trade payload".into()))?;
    Ok(u64::from_le_bytes(slice.try_into().unwrap()))
}
