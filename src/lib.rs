//! Pump Pulse
//!
//! Real-time dispatcher and per-mint monitor for newly created bonding-curve
//! tokens on a pump.fun-style Solana program: decodes block notifications,
//! filters new mints against configurable predicates, polls spot price on a
//! fair-share schedule, and runs each monitored mint through a termination
//! rule evaluator.

pub mod config;
pub mod core;
pub mod creation_filter;
pub mod curve_poller;
pub mod dispatcher;
pub mod monitor;
pub mod rpc;
pub mod snapshot;
pub mod stream_listener;
pub mod wire;

pub use config::PipelineConfig;
pub use core::{PipelineError, PipelineResult};
