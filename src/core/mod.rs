//! Core domain abstractions and types
//!
//! Foundational types and error definitions shared by the dispatcher, the
//! creation filter, the curve poller, and the per-mint monitors. Independent
//! of any specific transport or storage concern.

pub mod error;
pub mod types;

pub use error::{PipelineError, PipelineResult};
pub use types::{
    FilterConfig, MonitorEvent, MonitorThresholds, PriceUpdate, Project, Snapshot, TradeEvent,
    TradeKind,
};
