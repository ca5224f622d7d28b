//! Per-mint rolling state: holder accounting, price history, and the
//! per-second aggregates the termination rules read (spec §4.7, §9).

use crate::core::{PriceUpdate, Project, Snapshot, TradeEvent, TradeKind};
use std::collections::{HashMap, HashSet, VecDeque};

const HISTORY_CAPACITY: usize = 30;
/// Wide enough for the 7-second momentum window plus slack; see
/// [`SecondSeries`].
const SECOND_SERIES_WINDOW: usize = 64;

/// A capped FIFO of `(timestamp, value)` samples, oldest evicted first.
#[derive(Debug, Clone, Default)]
pub struct BoundedHistory {
    samples: VecDeque<(f64, f64)>,
    capacity: usize,
}

impl BoundedHistory {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, timestamp: f64, value: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((timestamp, value));
    }

    pub fn as_slice(&self) -> &VecDeque<(f64, f64)> {
        &self.samples
    }
}

/// A ring of per-second buckets with gap-fill: a second with no activity is
/// materialized as zero rather than left absent, so a consumer reading "the
/// last N seconds" never mistakes a quiet second for a missing one.
#[derive(Debug, Clone)]
pub struct SecondSeries {
    values: Vec<f64>,
    window: i64,
    last_sec: Option<i64>,
}

impl SecondSeries {
    pub fn new() -> Self {
        Self {
            values: vec![0.0; SECOND_SERIES_WINDOW],
            window: SECOND_SERIES_WINDOW as i64,
            last_sec: None,
        }
    }

    fn slot(&self, sec: i64) -> usize {
        sec.rem_euclid(self.window) as usize
    }

    pub fn add(&mut self, sec: i64, value: f64) {
        match self.last_sec {
            None => {
                let idx = self.slot(sec);
                self.values[idx] = value;
                self.last_sec = Some(sec);
            }
            Some(last) if sec > last => {
                let gap = (sec - last).min(self.window + 1);
                for missing in (sec - gap + 1)..sec {
                    let idx = self.slot(missing);
                    self.values[idx] = 0.0;
                }
                let idx = self.slot(sec);
                self.values[idx] = value;
                self.last_sec = Some(sec);
            }
            _ => {
                let idx = self.slot(sec);
                self.values[idx] += value;
            }
        }
    }

    /// The last `span` seconds ending at `min(now_sec, last_sec)`, oldest
    /// first. Empty if nothing has ever been recorded.
    pub fn recent(&self, now_sec: i64, span: i64) -> Vec<f64> {
        let Some(last) = self.last_sec else {
            return Vec::new();
        };
        let end = last.min(now_sec);
        let start = end - span + 1;
        (start..=end).map(|s| self.values[self.slot(s)]).collect()
    }
}

impl Default for SecondSeries {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct MonitorState {
    pub start: f64,
    balances: HashMap<String, f64>,
    sellers: HashSet<String>,
    pub price: Option<f64>,
    pub price_tx_estimate: Option<f64>,
    pub price_history: BoundedHistory,
    pub price_tx_history: BoundedHistory,
    pub buyer_history: BoundedHistory,
    pub volume_history: BoundedHistory,
    cumulative_buy_sol: f64,
    cumulative_buy_tokens: f64,
    pub tx_count: u64,
    pub agg_price: SecondSeries,
    pub agg_buyers: SecondSeries,
    pub agg_sellers: SecondSeries,
    pub agg_volume: SecondSeries,
    pub agg_volume_sell: SecondSeries,
    pub agg_tx_count: SecondSeries,
}

impl MonitorState {
    pub fn new(start: f64) -> Self {
        Self {
            start,
            balances: HashMap::new(),
            sellers: HashSet::new(),
            price: None,
            price_tx_estimate: None,
            price_history: BoundedHistory::new(HISTORY_CAPACITY),
            price_tx_history: BoundedHistory::new(HISTORY_CAPACITY),
            buyer_history: BoundedHistory::new(HISTORY_CAPACITY),
            volume_history: BoundedHistory::new(HISTORY_CAPACITY),
            cumulative_buy_sol: 0.0,
            cumulative_buy_tokens: 0.0,
            tx_count: 0,
            agg_price: SecondSeries::new(),
            agg_buyers: SecondSeries::new(),
            agg_sellers: SecondSeries::new(),
            agg_volume: SecondSeries::new(),
            agg_volume_sell: SecondSeries::new(),
            agg_tx_count: SecondSeries::new(),
        }
    }

    /// Number of addresses currently holding a positive balance. Derived
    /// from the balances map rather than tracked separately, so it can
    /// never drift from the P1 invariant.
    pub fn holder_count(&self) -> u32 {
        self.balances.len() as u32
    }

    pub fn apply_price(&mut self, update: PriceUpdate) {
        self.price = Some(update.price);
        self.price_history.push(update.timestamp, update.price);
        self.agg_price.add(update.timestamp.floor() as i64, update.price);
    }

    pub fn apply_trade(&mut self, trade: &TradeEvent) {
        let sec = trade.timestamp.floor() as i64;
        match trade.kind {
            TradeKind::Buy => {
                let prev = *self.balances.get(&trade.actor).unwrap_or(&0.0);
                self.balances.insert(trade.actor.clone(), prev + trade.token_amount);

                self.cumulative_buy_sol += trade.sol_amount;
                self.cumulative_buy_tokens += trade.token_amount;
                self.volume_history.push(trade.timestamp, trade.sol_amount);
                self.buyer_history.push(trade.timestamp, 1.0);
                self.agg_volume.add(sec, trade.sol_amount);
                self.agg_buyers.add(sec, 1.0);

                if self.cumulative_buy_tokens > 0.0 {
                    let estimate = self.cumulative_buy_sol / self.cumulative_buy_tokens;
                    self.price_tx_estimate = Some(estimate);
                    self.price_tx_history.push(trade.timestamp, estimate);
                }
            }
            TradeKind::Sell => {
                let prev = *self.balances.get(&trade.actor).unwrap_or(&0.0);
                let remaining = (prev - trade.token_amount).max(0.0);
                if remaining <= 0.0 {
                    self.balances.remove(&trade.actor);
                } else {
                    self.balances.insert(trade.actor.clone(), remaining);
                }
                self.sellers.insert(trade.actor.clone());
                self.agg_sellers.add(sec, 1.0);
                self.agg_volume_sell.add(sec, trade.sol_amount);
            }
        }
        self.tx_count += 1;
        self.agg_tx_count.add(sec, 1.0);
    }

    pub fn to_snapshot(&self, now: f64, project: &Project) -> Snapshot {
        Snapshot {
            mint: project.mint.clone(),
            timestamp: now,
            price: self.price,
            price_tx_estimate: self.price_tx_estimate,
            holders: self.holder_count(),
            tx_count: self.tx_count,
            buyers: self.balances.keys().cloned().collect(),
            sellers: self.sellers.iter().cloned().collect(),
            project: project.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(kind: TradeKind, actor: &str, token_amount: f64, timestamp: f64) -> TradeEvent {
        TradeEvent {
            kind,
            actor: actor.to_string(),
            token_amount,
            sol_amount: token_amount * 0.00003,
            source_tx_sig: "sig".to_string(),
            timestamp,
        }
    }

    #[test]
    fn holder_count_tracks_balance_transitions() {
        let mut state = MonitorState::new(0.0);
        assert_eq!(state.holder_count(), 0);
        state.apply_trade(&trade(TradeKind::Buy, "A", 10.0, 1.0));
        assert_eq!(state.holder_count(), 1);
        state.apply_trade(&trade(TradeKind::Buy, "A", 5.0, 2.0));
        assert_eq!(state.holder_count(), 1);
        state.apply_trade(&trade(TradeKind::Sell, "A", 12.0, 3.0));
        assert_eq!(state.holder_count(), 1);
        state.apply_trade(&trade(TradeKind::Sell, "A", 3.0, 4.0));
        assert_eq!(state.holder_count(), 0);
    }

    #[test]
    fn second_series_gap_fills_quiet_seconds() {
        let mut series = SecondSeries::new();
        series.add(10, 1.0);
        series.add(13, 1.0);
        let recent = series.recent(13, 5);
        assert_eq!(recent, vec![0.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn second_series_accumulates_within_same_second() {
        let mut series = SecondSeries::new();
        series.add(5, 2.0);
        series.add(5, 3.0);
        assert_eq!(series.recent(5, 1), vec![5.0]);
    }

    #[test]
    fn price_tx_estimate_is_volume_weighted() {
        let mut state = MonitorState::new(0.0);
        state.apply_trade(&trade(TradeKind::Buy, "A", 100.0, 1.0));
        state.apply_trade(&trade(TradeKind::Buy, "B", 100.0, 2.0));
        assert!(state.price_tx_estimate.is_some());
        let estimate = state.price_tx_estimate.unwrap();
        assert!((estimate - 0.00003).abs() < 1e-9);
    }
}
