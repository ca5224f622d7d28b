//! End-to-end exercises of the dispatcher, creation filter, and monitor
//! wired together, without any real network or validator dependency.

use async_trait::async_trait;
use pump_pulse::core::{FilterConfig, MonitorThresholds, Project};
use pump_pulse::creation_filter::CreationFilter;
use pump_pulse::dispatcher::Dispatcher;
use pump_pulse::rpc::BondingCurveSource;
use pump_pulse::snapshot::NullSink;
use pump_pulse::{PipelineError, PipelineResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

struct FixedPriceSource {
    price: f64,
    calls: AtomicUsize,
}

#[async_trait]
impl BondingCurveSource for FixedPriceSource {
    async fn get_bonding_curve_price(&self, _bonding_curve: &str) -> PipelineResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.price)
    }
}

struct AlwaysFailsSource;

#[async_trait]
impl BondingCurveSource for AlwaysFailsSource {
    async fn get_bonding_curve_price(&self, bonding_curve: &str) -> PipelineResult<f64> {
        Err(PipelineError::AccountNotFound {
            address: bonding_curve.to_string(),
        })
    }
}

fn sample_project(mint: &str) -> Project {
    Project {
        mint: mint.to_string(),
        name: "Pepe".to_string(),
        symbol: "PEPE".to_string(),
        creator: "Creator1".to_string(),
        bonding_curve: format!("{mint}-curve"),
        associated_bonding_curve: format!("{mint}-assoc-curve"),
    }
}

/// Registering through the creation filter spawns exactly one monitor, and
/// a repeat of the same mint is a no-op.
#[tokio::test]
async fn creation_filter_registers_once_per_mint() {
    let (dispatcher, _watcher_rx) = Dispatcher::new("Program1".to_string());
    let dispatcher = Arc::new(dispatcher);
    let filter = CreationFilter::new(dispatcher.clone(), FilterConfig::default());

    let (watcher_tx, watcher_rx) = mpsc::unbounded_channel();
    let entry = pump_pulse::dispatcher::WatcherEntry {
        mint: "Mint1".to_string(),
        name: "Pepe".to_string(),
        symbol: "PEPE".to_string(),
        creator: "Creator1".to_string(),
        bonding_curve: "Curve1".to_string(),
        associated_bonding_curve: "AssocCurve1".to_string(),
    };
    watcher_tx.send(entry.clone()).unwrap();
    watcher_tx.send(entry).unwrap();
    drop(watcher_tx);

    let spawn_count = Arc::new(AtomicUsize::new(0));
    let counter = spawn_count.clone();
    filter
        .run(watcher_rx, move |_project, _rx| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert_eq!(spawn_count.load(Ordering::SeqCst), 1);
    assert!(dispatcher.is_monitored("Mint1").await);
}

/// A mint that never attracts a holder terminates for `NoHolders` without
/// ever reaching the curve poller's steady-state cadence.
#[tokio::test]
async fn monitor_terminates_when_nobody_buys() {
    let (dispatcher, _watcher_rx) = Dispatcher::new("Program1".to_string());
    let dispatcher = Arc::new(dispatcher);
    let project = sample_project("Mint1");
    let rx = dispatcher
        .register_project(project.clone())
        .await
        .expect("first registration succeeds");

    let rpc: Arc<dyn BondingCurveSource> = Arc::new(FixedPriceSource {
        price: 0.00003,
        calls: AtomicUsize::new(0),
    });
    let sink = Arc::new(NullSink);

    let handle = tokio::spawn(pump_pulse::monitor::task::run(
        dispatcher.clone(),
        rpc,
        project,
        rx,
        MonitorThresholds::default(),
        sink,
    ));

    // The NoHolders rule has an 11-second wall-clock floor (10s minimum
    // elapsed, plus a 0.5s evaluator tick granularity); give it headroom.
    tokio::time::timeout(std::time::Duration::from_secs(13), handle)
        .await
        .expect("monitor exits before the timeout")
        .expect("monitor task does not panic");

    assert!(!dispatcher.is_monitored("Mint1").await);
}

/// Two failed bonding-curve fetches during init abort the monitor and
/// unregister the mint without ever processing an event.
#[tokio::test]
async fn monitor_aborts_when_initial_price_is_unavailable() {
    let (dispatcher, _watcher_rx) = Dispatcher::new("Program1".to_string());
    let dispatcher = Arc::new(dispatcher);
    let project = sample_project("Mint1");
    let rx = dispatcher
        .register_project(project.clone())
        .await
        .expect("first registration succeeds");

    let rpc: Arc<dyn BondingCurveSource> = Arc::new(AlwaysFailsSource);
    let sink = Arc::new(NullSink);

    let handle = tokio::spawn(pump_pulse::monitor::task::run(
        dispatcher.clone(),
        rpc,
        project,
        rx,
        MonitorThresholds::default(),
        sink,
    ));

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("monitor exits before the timeout")
        .expect("monitor task does not panic");

    assert!(!dispatcher.is_monitored("Mint1").await);
}

/// A wire-encoded `create` transaction routes through the dispatcher to the
/// watcher queue; replaying the identical bytes a second time is dropped as
/// a duplicate signature and never reaches the queue again.
#[tokio::test]
async fn dispatch_transaction_routes_create_and_dedups_replays() {
    use pump_pulse::wire::discriminator;
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::CompiledInstruction;
    use solana_sdk::message::{Message, MessageHeader, VersionedMessage};
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Signature;
    use solana_sdk::transaction::VersionedTransaction;

    let program_id = Pubkey::new_unique();
    let account_keys: Vec<Pubkey> = std::iter::once(Pubkey::new_unique()) // payer/signer
        .chain((0..8).map(|_| Pubkey::new_unique())) // 8 create accounts
        .chain(std::iter::once(program_id))
        .collect();
    let mint = account_keys[1];
    let bonding_curve = account_keys[3];
    let associated_bonding_curve = account_keys[4];
    let user = account_keys[8];
    let program_id_index = (account_keys.len() - 1) as u8;

    let mut data = discriminator::bytes(discriminator::CREATE).to_vec();
    for s in ["Pepe", "PEPE", "https://example.com/pepe.json"] {
        data.extend_from_slice(&(s.len() as u32).to_le_bytes());
        data.extend_from_slice(s.as_bytes());
    }

    let instruction = CompiledInstruction {
        program_id_index,
        accounts: (1..9).collect(),
        data,
    };

    let message = Message {
        header: MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 0,
            num_readonly_unsigned_accounts: 1,
        },
        account_keys,
        recent_blockhash: Hash::default(),
        instructions: vec![instruction],
    };

    let tx = VersionedTransaction {
        signatures: vec![Signature::new_unique()],
        message: VersionedMessage::Legacy(message),
    };

    let raw = bincode::serialize(&tx).unwrap();
    use base64::Engine;
    let base64_raw = base64::engine::general_purpose::STANDARD.encode(&raw);

    let (dispatcher, mut watcher_rx) = Dispatcher::new(program_id.to_string());

    dispatcher.dispatch_transaction(&base64_raw).await;
    let entry = watcher_rx
        .try_recv()
        .expect("create instruction reaches the watcher queue");
    assert_eq!(entry.mint, mint.to_string());
    assert_eq!(entry.bonding_curve, bonding_curve.to_string());
    assert_eq!(entry.associated_bonding_curve, associated_bonding_curve.to_string());
    assert_eq!(entry.creator, user.to_string());
    assert_eq!(entry.name, "Pepe");

    // Replaying the exact same bytes is a duplicate signature: nothing new
    // is enqueued.
    dispatcher.dispatch_transaction(&base64_raw).await;
    assert!(watcher_rx.try_recv().is_err());
}
