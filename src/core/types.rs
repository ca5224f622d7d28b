//! Core domain types shared across the dispatcher, poller, and monitors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A newly created token that survived the [`crate::creation_filter::CreationFilter`]
/// predicates and is now eligible for monitoring. Immutable after registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub creator: String,
    pub bonding_curve: String,
    pub associated_bonding_curve: String,
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.mint)
    }
}

/// Which side of the bonding curve a trade instruction executed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "buy"),
            TradeKind::Sell => write!(f, "sell"),
        }
    }
}

/// A decoded buy or sell instruction, ready for a [`MonitorEvent`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeEvent {
    pub kind: TradeKind,
    pub actor: String,
    /// Raw token units divided by 10^6 (`TOKEN_DECIMALS`).
    pub token_amount: f64,
    /// Lamports divided by `LAMPORTS_PER_SOL`.
    pub sol_amount: f64,
    pub source_tx_sig: String,
    pub timestamp: f64,
}

/// An on-chain-derived spot price published by the [`crate::curve_poller::CurvePoller`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceUpdate {
    pub price: f64,
    pub timestamp: f64,
}

/// The sum type routed through a mint's `MonitorQueue`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MonitorEvent {
    Trade(TradeEvent),
    Price(PriceUpdate),
}

/// Default termination-rule thresholds (§4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MonitorThresholds {
    pub min_holders: u32,
    pub holder_check_sec: f64,
    pub price_min_increase: f64,
    pub price_check_sec: f64,
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            min_holders: 15,
            holder_check_sec: 20.0,
            price_min_increase: 0.20,
            price_check_sec: 10.0,
        }
    }
}

/// Optional predicates applied by the [`crate::creation_filter::CreationFilter`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    pub name_contains: Option<String>,
    pub creator_address: Option<String>,
}

impl FilterConfig {
    /// `name || symbol` case-insensitive substring and exact creator match.
    pub fn matches(&self, name: &str, symbol: &str, creator: &str) -> bool {
        let name_match = match &self.name_contains {
            Some(needle) => {
                let haystack = format!("{name}{symbol}").to_lowercase();
                haystack.contains(&needle.to_lowercase())
            }
            None => true,
        };
        let creator_match = match &self.creator_address {
            Some(expected) => expected == creator,
            None => true,
        };
        name_match && creator_match
    }
}

/// A point-in-time observation of a monitored mint, handed to the
/// outbound [`crate::snapshot::SnapshotSink`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub mint: String,
    pub timestamp: f64,
    pub price: Option<f64>,
    pub price_tx_estimate: Option<f64>,
    pub holders: u32,
    pub tx_count: u64,
    pub buyers: Vec<String>,
    pub sellers: Vec<String>,
    pub project: Project,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_config_matches_case_insensitive_name() {
        let filter = FilterConfig {
            name_contains: Some("PEPE".to_string()),
            creator_address: None,
        };
        assert!(filter.matches("pepe the frog", "PEP", "anyone"));
        assert!(!filter.matches("doge", "DOGE", "anyone"));
    }

    #[test]
    fn filter_config_requires_exact_creator_match() {
        let filter = FilterConfig {
            name_contains: None,
            creator_address: Some("Creator1".to_string()),
        };
        assert!(filter.matches("x", "y", "Creator1"));
        assert!(!filter.matches("x", "y", "Creator2"));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = FilterConfig::default();
        assert!(filter.matches("anything", "ANY", "whoever"));
    }
}
