//! Configuration loading for the pipeline binary
//!
//! Recognised environment variables (see spec §6): `SOLANA_NODE_WSS_ENDPOINT`,
//! `RPC_HTTP_ENDPOINT`, and `PUMP_PROGRAM`. Everything else defaults.

use crate::core::{FilterConfig, MonitorThresholds, PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Mainnet pump.fun program address, used when `PUMP_PROGRAM` is unset.
pub const DEFAULT_PUMP_PROGRAM: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const TOKEN_DECIMALS: u32 = 6;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    #[validate(url)]
    pub wss_endpoint: String,
    #[validate(url)]
    pub rpc_http_endpoint: String,
    pub pump_program: String,
    pub thresholds: MonitorThresholds,
    pub filters: FilterConfig,
    pub log_level: String,
    pub structured_logging: bool,
}

impl PipelineConfig {
    /// Load required endpoints from the environment (optionally via a
    /// `.env` file, loaded with `dotenvy`), falling back to defaults for
    /// everything not named in spec §6.
    pub fn from_env() -> PipelineResult<Self> {
        dotenvy::dotenv().ok();

        let wss_endpoint = required_env("SOLANA_NODE_WSS_ENDPOINT")?;
        let rpc_http_endpoint = required_env("RPC_HTTP_ENDPOINT")?;
        let pump_program =
            std::env::var("PUMP_PROGRAM").unwrap_or_else(|_| DEFAULT_PUMP_PROGRAM.to_string());

        let config = Self {
            wss_endpoint,
            rpc_http_endpoint,
            pump_program,
            thresholds: MonitorThresholds::default(),
            filters: FilterConfig::default(),
            log_level: "info".to_string(),
            structured_logging: false,
        };

        config
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn with_filters(mut self, filters: FilterConfig) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_log_level(mut self, log_level: String) -> Self {
        self.log_level = log_level;
        self
    }
}

fn required_env(key: &str) -> PipelineResult<String> {
    std::env::var(key).map_err(|_| PipelineError::Config(format!("{key} is not set")))
}
