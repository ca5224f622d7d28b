//! Versioned transaction decoding.
//!
//! Block notifications carry each transaction base64-encoded, bincode-framed
//! exactly as the validator would replay it. We decode only as far as the
//! account table and compiled instructions; address-lookup-table resolution
//! is out of scope, so instructions whose accounts reference a lookup table
//! rather than the static key list are skipped by the caller.

use crate::core::{PipelineError, PipelineResult};
use solana_sdk::instruction::CompiledInstruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

pub struct DecodedTransaction {
    pub signatures: Vec<Signature>,
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<CompiledInstruction>,
}

impl DecodedTransaction {
    pub fn signature(&self) -> Option<String> {
        self.signatures.first().map(|s| s.to_string())
    }

    pub fn account_key(&self, index: u8) -> Option<&Pubkey> {
        self.account_keys.get(index as usize)
    }
}

/// Decode a base64-encoded, bincode-framed `VersionedTransaction`.
pub fn decode_transaction(base64_raw: &str) -> PipelineResult<DecodedTransaction> {
    use base64::Engine;
    let raw = base64::engine::general_purpose::STANDARD
        .decode(base64_raw)
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    decode_transaction_bytes(&raw)
}

pub fn decode_transaction_bytes(raw: &[u8]) -> PipelineResult<DecodedTransaction> {
    let tx: VersionedTransaction =
        bincode::deserialize(raw).map_err(|e| PipelineError::Decode(e.to_string()))?;

    let (account_keys, instructions) = match tx.message {
        solana_sdk::message::VersionedMessage::Legacy(m) => (m.account_keys, m.instructions),
        solana_sdk::message::VersionedMessage::V0(m) => (m.account_keys, m.instructions),
    };

    Ok(DecodedTransaction {
        signatures: tx.signatures,
        account_keys,
        instructions,
    })
}
