//! Anchor instruction and account discriminators for the pump.fun program.
//!
//! Each value is the first 8 bytes of `sha256("global:<name>")` (instructions)
//! or `sha256("account:<Name>")` (accounts), read back as a little-endian u64.

/// `global:create`
pub const CREATE: u64 = 8_576_854_823_835_016_728;
/// `global:buy`
pub const BUY: u64 = 16_927_863_322_537_952_870;
/// `global:sell`
pub const SELL: u64 = 12_502_976_635_542_562_355;
/// `account:BondingCurve`
pub const BONDING_CURVE_STATE: u64 = 6_966_180_631_402_821_399;

pub fn bytes(discriminator: u64) -> [u8; 8] {
    discriminator.to_le_bytes()
}

pub fn read(data: &[u8]) -> Option<u64> {
    data.get(0..8)
        .map(|head| u64::from_le_bytes(head.try_into().unwrap()))
}

/// Cheap pre-filter: does `raw` contain any of `discriminators` anywhere as a
/// contiguous byte run? Used to skip full transaction decoding for blocks
/// that can't possibly carry a pump.fun instruction.
pub fn fast_contains(raw: &[u8], discriminators: &[u64]) -> bool {
    discriminators
        .iter()
        .any(|d| contains_bytes(raw, &bytes(*d)))
}

fn contains_bytes(haystack: &[u8], needle: &[u8; 8]) -> bool {
    haystack.len() >= 8 && haystack.windows(8).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_contains_finds_embedded_discriminator() {
        let mut raw = vec![1, 2, 3];
        raw.extend_from_slice(&bytes(CREATE));
        raw.extend_from_slice(&[9, 9]);
        assert!(fast_contains(&raw, &[CREATE, BUY, SELL]));
    }

    #[test]
    fn fast_contains_rejects_unrelated_bytes() {
        let raw = vec![0u8; 64];
        assert!(!fast_contains(&raw, &[CREATE, BUY, SELL]));
    }

    #[test]
    fn read_extracts_leading_discriminator() {
        let mut data = bytes(BUY).to_vec();
        data.extend_from_slice(&[1, 2, 3]);
        assert_eq!(read(&data), Some(BUY));
    }
}
