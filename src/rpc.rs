//! Minimal JSON-RPC 2.0 HTTP client for `getAccountInfo` (spec §4.2, §4.6).
//! No retries, no connection pooling beyond what `reqwest` gives for free —
//! callers (the monitor's init step, the curve poller) own their own retry
//! policy.

use crate::core::{PipelineError, PipelineResult};
use crate::wire::bonding_curve;
use async_trait::async_trait;
use serde::Deserialize;

/// The port the monitor's init step and the curve poller read spot prices
/// through. Lets tests substitute a fake instead of talking to a real RPC
/// endpoint.
#[async_trait]
pub trait BondingCurveSource: Send + Sync {
    async fn get_bonding_curve_price(&self, bonding_curve: &str) -> PipelineResult<f64>;
}

pub struct RpcReader {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<RpcResult<T>>,
}

#[derive(Debug, Deserialize)]
struct RpcResult<T> {
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct AccountValue {
    data: Vec<String>,
}

impl RpcReader {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    pub async fn get_account_data(&self, pubkey: &str) -> PipelineResult<Vec<u8>> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getAccountInfo",
            "params": [pubkey, {"encoding": "base64", "commitment": "confirmed"}],
        });

        let envelope: RpcEnvelope<AccountValue> = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        let value = envelope
            .result
            .and_then(|r| r.value)
            .ok_or_else(|| PipelineError::AccountNotFound {
                address: pubkey.to_string(),
            })?;

        let data_b64 = value
            .data
            .first()
            .ok_or_else(|| PipelineError::AccountNotFound {
                address: pubkey.to_string(),
            })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(data_b64)
            .map_err(|e| PipelineError::Decode(e.to_string()))
    }

    pub async fn get_bonding_curve_price(&self, bonding_curve_address: &str) -> PipelineResult<f64> {
        let raw = self.get_account_data(bonding_curve_address).await?;
        let state = bonding_curve::parse(&raw)?;
        bonding_curve::calculate_price(&state)
    }
}

#[async_trait]
impl BondingCurveSource for RpcReader {
    async fn get_bonding_curve_price(&self, bonding_curve: &str) -> PipelineResult<f64> {
        RpcReader::get_bonding_curve_price(self, bonding_curve).await
    }
}
