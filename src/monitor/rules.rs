//! Termination rule evaluation (spec §4.7): four independent checks, first
//! match wins.

use crate::core::MonitorThresholds;
use crate::monitor::state::SecondSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    NoHolders,
    InsufficientHolders,
    PriceStagnant,
    MomentumMatch,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TerminationReason::NoHolders => "no_holders",
            TerminationReason::InsufficientHolders => "insufficient_holders",
            TerminationReason::PriceStagnant => "price_stagnant",
            TerminationReason::MomentumMatch => "momentum_match",
        };
        write!(f, "{label}")
    }
}

/// A cheap, cloneable read of the fields the rule evaluator needs, handed
/// across from the monitor task after every processed event so the
/// evaluator never touches `MonitorState` directly.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub now: f64,
    pub holder_count: u32,
    pub price: Option<f64>,
    pub agg_price: SecondSeries,
    pub agg_buyers: SecondSeries,
    pub agg_volume: SecondSeries,
}

const MOMENTUM_WINDOW_SEC: i64 = 7;
const MOMENTUM_STREAK: usize = 5;

pub fn evaluate(
    start: f64,
    first_sample_price: Option<f64>,
    thresholds: &MonitorThresholds,
    snapshot: &RuleSnapshot,
) -> Option<TerminationReason> {
    let elapsed = snapshot.now - start;

    if elapsed >= 10.0 && snapshot.holder_count == 0 {
        return Some(TerminationReason::NoHolders);
    }

    if elapsed >= thresholds.holder_check_sec && snapshot.holder_count < thresholds.min_holders {
        return Some(TerminationReason::InsufficientHolders);
    }

    if elapsed >= thresholds.price_check_sec {
        if let (Some(first), Some(price)) = (first_sample_price, snapshot.price) {
            let expected = first * (1.0 + thresholds.price_min_increase);
            if price < expected {
                return Some(TerminationReason::PriceStagnant);
            }
        }
    }

    if momentum_matches(snapshot) {
        return Some(TerminationReason::MomentumMatch);
    }

    None
}

fn momentum_matches(snapshot: &RuleSnapshot) -> bool {
    let now_sec = snapshot.now.floor() as i64;
    let price = snapshot.agg_price.recent(now_sec, MOMENTUM_WINDOW_SEC);
    let buyers = snapshot.agg_buyers.recent(now_sec, MOMENTUM_WINDOW_SEC);
    let volume = snapshot.agg_volume.recent(now_sec, MOMENTUM_WINDOW_SEC);
    non_decreasing_streak(&price) && non_decreasing_streak(&buyers) && non_decreasing_streak(&volume)
}

fn non_decreasing_streak(values: &[f64]) -> bool {
    if values.len() < MOMENTUM_STREAK {
        return false;
    }
    let tail = &values[values.len() - MOMENTUM_STREAK..];
    tail.windows(2).all(|w| w[1] >= w[0])
}
