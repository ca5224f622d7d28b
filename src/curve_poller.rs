//! Fair-share bonding curve price poller (spec §4.6): spreads RPC calls
//! evenly across all monitored mints, skips idle mints, and only publishes
//! a price update when it actually moved.

use crate::core::PriceUpdate;
use crate::dispatcher::Dispatcher;
use crate::rpc::BondingCurveSource;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

const IDLE_THRESHOLD: Duration = Duration::from_secs(10);
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MIN_DELAY_PER_CALL: f64 = 0.1;
const FAIR_SHARE_FLOOR: f64 = 10.0;
const PRICE_EPSILON: f64 = 1e-10;
const SWEEP_INTERVAL: Duration = Duration::from_millis(100);

pub struct CurvePoller {
    dispatcher: Arc<Dispatcher>,
    rpc: Arc<dyn BondingCurveSource>,
    last_fetch_time: HashMap<String, Instant>,
    last_sent_price: HashMap<String, f64>,
}

impl CurvePoller {
    pub fn new(dispatcher: Arc<Dispatcher>, rpc: Arc<dyn BondingCurveSource>) -> Self {
        Self {
            dispatcher,
            rpc,
            last_fetch_time: HashMap::new(),
            last_sent_price: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        loop {
            self.sweep().await;
            tokio::time::sleep(SWEEP_INTERVAL).await;
        }
    }

    async fn sweep(&mut self) {
        let mints = self.dispatcher.snapshot_registry().await;
        let monitored: std::collections::HashSet<&str> =
            mints.iter().map(|(mint, _, _)| mint.as_str()).collect();
        self.last_sent_price.retain(|mint, _| monitored.contains(mint.as_str()));
        self.last_fetch_time.retain(|mint, _| monitored.contains(mint.as_str()));

        let delay_per_call = Duration::from_secs_f64(
            (1.0 / (mints.len() as f64).max(FAIR_SHARE_FLOOR)).max(MIN_DELAY_PER_CALL),
        );

        let now = Instant::now();
        for (mint, project, last_activity) in mints {
            if now.duration_since(last_activity) > IDLE_THRESHOLD {
                tokio::time::sleep(delay_per_call).await;
                continue;
            }
            if let Some(&last_fetch) = self.last_fetch_time.get(&mint) {
                if now.duration_since(last_fetch) < MIN_POLL_INTERVAL {
                    tokio::time::sleep(delay_per_call).await;
                    continue;
                }
            }

            self.last_fetch_time.insert(mint.clone(), Instant::now());
            match self.rpc.get_bonding_curve_price(&project.bonding_curve).await {
                Ok(price) => self.maybe_publish(&mint, price).await,
                Err(e) => warn!(mint = %mint, error = %e, "bonding curve poll failed"),
            }

            tokio::time::sleep(delay_per_call).await;
        }
    }

    async fn maybe_publish(&mut self, mint: &str, price: f64) {
        let changed = match self.last_sent_price.get(mint) {
            Some(&last) => (price - last).abs() >= PRICE_EPSILON,
            None => true,
        };
        if !changed {
            return;
        }
        self.last_sent_price.insert(mint.to_string(), price);
        let update = PriceUpdate {
            price,
            timestamp: now_secs(),
        };
        let _ = self.dispatcher.publish_price(mint, update).await;
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fair_share_delay_floors_at_point_one_second() {
        let delay = Duration::from_secs_f64((1.0 / (2.0_f64).max(FAIR_SHARE_FLOOR)).max(MIN_DELAY_PER_CALL));
        assert_eq!(delay, Duration::from_secs_f64(0.1));
    }

    #[test]
    fn fair_share_delay_shrinks_with_more_projects() {
        let delay = Duration::from_secs_f64((1.0 / (50.0_f64).max(FAIR_SHARE_FLOOR)).max(MIN_DELAY_PER_CALL));
        assert_eq!(delay, Duration::from_secs_f64(0.02));
    }
}
