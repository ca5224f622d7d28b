//! Centralized error types for the pipeline

use thiserror::Error;

/// Top-level pipeline error, one variant per failure kind the dispatcher,
/// poller, and monitor can raise.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("upstream stream disconnected: {0}")]
    StreamDisconnect(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("duplicate transaction signature")]
    DuplicateTx,

    #[error("duplicate mint creation")]
    DuplicateMint,

    #[error("account not found: {address}")]
    AccountNotFound { address: String },

    #[error("invalid bonding curve state: zero reserves")]
    InvalidCurve,

    #[error("project already registered: {mint}")]
    RegisterConflict { mint: String },

    #[error("monitor exited: {mint}")]
    MonitorTimeout { mint: String },

    #[error("rpc failure: {0}")]
    Rpc(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Rpc(err.to_string())
    }
}
