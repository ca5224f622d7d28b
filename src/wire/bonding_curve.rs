//! Bonding curve account layout and spot price derivation (spec §4.2).

use crate::config::{LAMPORTS_PER_SOL, TOKEN_DECIMALS};
use crate::core::{PipelineError, PipelineResult};
use crate::wire::discriminator;

/// Fields of the `BondingCurve` account, in on-chain order, immediately
/// after the 8-byte Anchor discriminator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondingCurveState {
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    pub complete: bool,
}

const BODY_LEN: usize = 8 * 5 + 1;

pub fn parse(data: &[u8]) -> PipelineResult<BondingCurveState> {
    if data.len() < 8 + BODY_LEN {
        return Err(PipelineError::Decode(
            "bonding curve account too short".into(),
        ));
    }
    if discriminator::read(data) != Some(discriminator::BONDING_CURVE_STATE) {
        return Err(PipelineError::Decode(
            "bonding curve account discriminator mismatch".into(),
        ));
    }

    let body = &data[8..];
    let u64_at = |offset: usize| -> u64 {
        u64::from_le_bytes(body[offset..offset + 8].try_into().unwrap())
    };

    Ok(BondingCurveState {
        virtual_token_reserves: u64_at(0),
        virtual_sol_reserves: u64_at(8),
        real_token_reserves: u64_at(16),
        real_sol_reserves: u64_at(24),
        token_total_supply: u64_at(32),
        complete: body[40] != 0,
    })
}

/// `(virtual_sol_reserves / LAMPORTS_PER_SOL) / (virtual_token_reserves / 10^TOKEN_DECIMALS)`.
/// Undefined, and an error, when either virtual reserve is zero.
pub fn calculate_price(state: &BondingCurveState) -> PipelineResult<f64> {
    if state.virtual_token_reserves == 0 || state.virtual_sol_reserves == 0 {
        return Err(PipelineError::InvalidCurve);
    }
    let sol = state.virtual_sol_reserves as f64 / LAMPORTS_PER_SOL as f64;
    let tokens = state.virtual_token_reserves as f64 / 10f64.powi(TOKEN_DECIMALS as i32);
    Ok(sol / tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(state: &BondingCurveState) -> Vec<u8> {
        let mut data = discriminator::bytes(discriminator::BONDING_CURVE_STATE).to_vec();
        data.extend_from_slice(&state.virtual_token_reserves.to_le_bytes());
        data.extend_from_slice(&state.virtual_sol_reserves.to_le_bytes());
        data.extend_from_slice(&state.real_token_reserves.to_le_bytes());
        data.extend_from_slice(&state.real_sol_reserves.to_le_bytes());
        data.extend_from_slice(&state.token_total_supply.to_le_bytes());
        data.push(state.complete as u8);
        data
    }

    #[test]
    fn round_trips_account_layout() {
        let state = BondingCurveState {
            virtual_token_reserves: 1_073_000_000_000_000,
            virtual_sol_reserves: 30_000_000_000,
            real_token_reserves: 793_100_000_000_000,
            real_sol_reserves: 0,
            token_total_supply: 1_000_000_000_000_000,
            complete: false,
        };
        let data = encode(&state);
        assert_eq!(parse(&data).unwrap(), state);
    }

    #[test]
    fn price_errors_on_zero_virtual_reserves() {
        let state = BondingCurveState {
            virtual_token_reserves: 0,
            virtual_sol_reserves: 30_000_000_000,
            real_token_reserves: 0,
            real_sol_reserves: 0,
            token_total_supply: 0,
            complete: true,
        };
        assert!(matches!(
            calculate_price(&state),
            Err(PipelineError::InvalidCurve)
        ));
    }

    #[test]
    fn price_matches_reserve_ratio() {
        let state = BondingCurveState {
            virtual_token_reserves: 1_000_000_000_000, // 1,000,000 tokens
            virtual_sol_reserves: 30_000_000_000,       // 30 SOL
            real_token_reserves: 0,
            real_sol_reserves: 0,
            token_total_supply: 0,
            complete: false,
        };
        let price = calculate_price(&state).unwrap();
        assert!((price - 0.00003).abs() < 1e-12);
    }

    #[test]
    fn rejects_wrong_discriminator() {
        let mut data = vec![0u8; 8 + BODY_LEN];
        data[0] = 1;
        assert!(parse(&data).is_err());
    }
}
