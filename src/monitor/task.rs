//! Per-mint monitor state machine (spec §4.7): seeds an initial price from
//! the bonding curve, then folds incoming trade/price events into
//! `MonitorState` until a termination rule fires or the queue closes.

use crate::core::{MonitorEvent, MonitorThresholds, Project};
use crate::dispatcher::Dispatcher;
use crate::monitor::rules::{self, RuleSnapshot};
use crate::monitor::state::MonitorState;
use crate::rpc::BondingCurveSource;
use crate::snapshot::SnapshotSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tracing::{info, warn};

const INIT_RETRY_DELAY: Duration = Duration::from_secs(1);
const RULE_CHECK_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run(
    dispatcher: Arc<Dispatcher>,
    rpc: Arc<dyn BondingCurveSource>,
    project: Project,
    mut events: mpsc::UnboundedReceiver<MonitorEvent>,
    thresholds: MonitorThresholds,
    sink: Arc<dyn SnapshotSink>,
) {
    let mint = project.mint.clone();
    let start = now_secs();
    let mut state = MonitorState::new(start);

    let first_sample_price = match seed_initial_price(rpc.as_ref(), &project.bonding_curve).await {
        Some(price) => {
            state.apply_price(crate::core::PriceUpdate {
                price,
                timestamp: start,
            });
            Some(price)
        }
        None => {
            warn!(mint = %mint, "monitor init failed twice, aborting");
            dispatcher.unregister_project(&mint).await;
            return;
        }
    };

    let should_exit = Arc::new(Notify::new());
    let exit_reason = Arc::new(Mutex::new(None));
    let (snapshot_tx, snapshot_rx) = watch::channel(rule_snapshot(&state, start));
    let stop_evaluator = Arc::new(AtomicBool::new(false));

    let evaluator = tokio::spawn(run_rule_evaluator(
        start,
        first_sample_price,
        thresholds,
        snapshot_rx,
        should_exit.clone(),
        exit_reason.clone(),
        stop_evaluator.clone(),
    ));

    loop {
        tokio::select! {
            _ = should_exit.notified() => break,
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(MonitorEvent::Price(update)) => state.apply_price(update),
                    Some(MonitorEvent::Trade(trade)) => state.apply_trade(&trade),
                    None => break,
                }
                let _ = snapshot_tx.send(rule_snapshot(&state, now_secs()));
                sink.emit(state.to_snapshot(now_secs(), &project)).await;
            }
        }
    }

    stop_evaluator.store(true, Ordering::SeqCst);
    evaluator.abort();

    let reason = exit_reason.lock().await.clone();
    info!(
        mint = %mint,
        reason = ?reason,
        tx_count = state.tx_count,
        holders = state.holder_count(),
        "monitor stopped"
    );
    dispatcher.unregister_project(&mint).await;
}

/// Up to two attempts, one second apart, to seed the monitor's starting
/// price from the bonding curve account.
async fn seed_initial_price(rpc: &dyn BondingCurveSource, bonding_curve: &str) -> Option<f64> {
    for attempt in 0..2 {
        match rpc.get_bonding_curve_price(bonding_curve).await {
            Ok(price) => return Some(price),
            Err(e) => {
                warn!(bonding_curve = %bonding_curve, attempt, error = %e, "bonding curve fetch failed");
                if attempt == 0 {
                    tokio::time::sleep(INIT_RETRY_DELAY).await;
                }
            }
        }
    }
    None
}

fn rule_snapshot(state: &MonitorState, now: f64) -> RuleSnapshot {
    RuleSnapshot {
        now,
        holder_count: state.holder_count(),
        price: state.price,
        agg_price: state.agg_price.clone(),
        agg_buyers: state.agg_buyers.clone(),
        agg_volume: state.agg_volume.clone(),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_rule_evaluator(
    start: f64,
    first_sample_price: Option<f64>,
    thresholds: MonitorThresholds,
    mut snapshot_rx: watch::Receiver<RuleSnapshot>,
    should_exit: Arc<Notify>,
    exit_reason: Arc<Mutex<Option<rules::TerminationReason>>>,
    stop: Arc<AtomicBool>,
) {
    let mut ticker = tokio::time::interval(RULE_CHECK_INTERVAL);
    loop {
        ticker.tick().await;
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let mut snapshot = snapshot_rx.borrow_and_update().clone();
        snapshot.now = now_secs();
        if let Some(reason) = rules::evaluate(start, first_sample_price, &thresholds, &snapshot) {
            *exit_reason.lock().await = Some(reason);
            should_exit.notify_one();
            return;
        }
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
