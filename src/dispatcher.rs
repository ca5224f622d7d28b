//! Routes decoded instructions to the creation filter or to a mint's
//! monitor queue, and owns the monitored-set lifecycle (spec §4.4).

use crate::core::{MonitorEvent, PipelineError, PipelineResult, PriceUpdate, Project, TradeEvent};
use crate::wire::{discriminator, instruction, schema, transaction};
use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

const SEEN_SIGNATURE_CAPACITY: usize = 10_000;
const ROUTED_DISCRIMINATORS: [u64; 3] = [discriminator::CREATE, discriminator::BUY, discriminator::SELL];

/// A pre-parsed `create` instruction, handed to the creation filter for
/// predicate evaluation and possible registration.
#[derive(Debug, Clone)]
pub struct WatcherEntry {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub creator: String,
    pub bonding_curve: String,
    pub associated_bonding_curve: String,
}

struct MintEntry {
    project: Project,
    queue: mpsc::UnboundedSender<MonitorEvent>,
}

/// Bounded FIFO + set for O(1) duplicate-signature checks (spec §4.4, P4).
struct SignatureWindow {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl SignatureWindow {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `true` if `sig` was already seen; otherwise records it.
    fn check_and_insert(&mut self, sig: &str) -> bool {
        if self.seen.contains(sig) {
            return true;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(sig.to_string());
        self.seen.insert(sig.to_string());
        false
    }
}

pub struct Dispatcher {
    pump_program: String,
    watcher_tx: mpsc::UnboundedSender<WatcherEntry>,
    registry: Mutex<std::collections::HashMap<String, MintEntry>>,
    activity: Mutex<std::collections::HashMap<String, Instant>>,
    seen_signatures: Mutex<SignatureWindow>,
}

impl Dispatcher {
    pub fn new(pump_program: String) -> (Self, mpsc::UnboundedReceiver<WatcherEntry>) {
        let (watcher_tx, watcher_rx) = mpsc::unbounded_channel();
        (
            Self {
                pump_program,
                watcher_tx,
                registry: Mutex::new(std::collections::HashMap::new()),
                activity: Mutex::new(std::collections::HashMap::new()),
                seen_signatures: Mutex::new(SignatureWindow::new(SEEN_SIGNATURE_CAPACITY)),
            },
            watcher_rx,
        )
    }

    /// Decode a base64 block-notification transaction and route any create
    /// or trade instructions found in it. Decode failures and duplicate
    /// signatures are logged and swallowed — a single malformed transaction
    /// must never stop the block loop.
    pub async fn dispatch_transaction(&self, base64_raw: &str) {
        let raw = {
            use base64::Engine;
            match base64::engine::general_purpose::STANDARD.decode(base64_raw) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(error = %e, "skipping transaction: invalid base64");
                    return;
                }
            }
        };

        if !discriminator::fast_contains(&raw, &ROUTED_DISCRIMINATORS) {
            return;
        }

        let decoded = match transaction::decode_transaction_bytes(&raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "skipping transaction: decode failed");
                return;
            }
        };

        let Some(sig) = decoded.signature() else {
            return;
        };
        if self.seen_signatures.lock().await.check_and_insert(&sig) {
            debug!(signature = %sig, "skipping duplicate transaction");
            return;
        }

        for ix in &decoded.instructions {
            let Some(program_id) = decoded.account_key(ix.program_id_index) else {
                continue;
            };
            if program_id.to_string() != self.pump_program {
                continue;
            }
            let Some(disc) = discriminator::read(&ix.data) else {
                continue;
            };

            match disc {
                d if d == discriminator::CREATE => {
                    self.handle_create(&ix.data, &ix.accounts, &decoded.account_keys)
                }
                d if d == discriminator::BUY || d == discriminator::SELL => {
                    self.handle_trade(disc, &ix.data, &ix.accounts, &decoded.account_keys, &sig)
                        .await
                }
                _ => {}
            }
        }
    }

    fn handle_create(
        &self,
        data: &[u8],
        accounts: &[u8],
        account_keys: &[solana_sdk::pubkey::Pubkey],
    ) {
        let args = match instruction::decode_create(data, accounts, account_keys) {
            Ok(args) => args,
            Err(e) => {
                debug!(error = %e, "skipping create instruction: decode failed");
                return;
            }
        };
        let entry = WatcherEntry {
            mint: args.mint,
            name: args.name,
            symbol: args.symbol,
            creator: args.user,
            bonding_curve: args.bonding_curve,
            associated_bonding_curve: args.associated_bonding_curve,
        };
        if self.watcher_tx.send(entry).is_err() {
            warn!("watcher queue closed, dropping create instruction");
        }
    }

    async fn handle_trade(
        &self,
        disc: u64,
        data: &[u8],
        accounts: &[u8],
        account_keys: &[solana_sdk::pubkey::Pubkey],
        sig: &str,
    ) {
        let Some(mint_pos) = schema::mint_index_for(disc) else {
            return;
        };
        let Some(user_pos) = schema::user_index_for(disc) else {
            return;
        };
        let Some(&mint_account_idx) = accounts.get(mint_pos) else {
            return;
        };
        let Some(&user_account_idx) = accounts.get(user_pos) else {
            return;
        };
        let Some(mint) = account_keys.get(mint_account_idx as usize) else {
            return;
        };
        let Some(actor) = account_keys.get(user_account_idx as usize) else {
            return;
        };
        let mint = mint.to_string();

        let args = match instruction::decode_trade(data) {
            Ok(args) => args,
            Err(e) => {
                debug!(error = %e, "skipping trade instruction: decode failed");
                return;
            }
        };

        let queue = {
            let registry = self.registry.lock().await;
            match registry.get(&mint) {
                Some(entry) => entry.queue.clone(),
                None => return,
            }
        };

        self.activity.lock().await.insert(mint.clone(), Instant::now());

        let event = MonitorEvent::Trade(TradeEvent {
            kind: if disc == discriminator::BUY {
                crate::core::TradeKind::Buy
            } else {
                crate::core::TradeKind::Sell
            },
            actor: actor.to_string(),
            token_amount: args.token_amount,
            sol_amount: args.sol_amount,
            source_tx_sig: sig.to_string(),
            timestamp: now_secs(),
        });

        if queue.send(event).is_err() {
            debug!(mint = %mint, "monitor queue closed, dropping trade");
        }
    }

    /// Register a newly accepted project. Returns the event receiver for a
    /// fresh monitor task to consume, or `None` if the mint was already
    /// registered (idempotent no-op, per §4.4's RegisterConflict handling).
    pub async fn register_project(
        &self,
        project: Project,
    ) -> Option<mpsc::UnboundedReceiver<MonitorEvent>> {
        let mut registry = self.registry.lock().await;
        if registry.contains_key(&project.mint) {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.activity
            .lock()
            .await
            .insert(project.mint.clone(), Instant::now());
        registry.insert(
            project.mint.clone(),
            MintEntry {
                project,
                queue: tx,
            },
        );
        Some(rx)
    }

    pub async fn unregister_project(&self, mint: &str) {
        self.registry.lock().await.remove(mint);
        self.activity.lock().await.remove(mint);
    }

    pub async fn is_monitored(&self, mint: &str) -> bool {
        self.registry.lock().await.contains_key(mint)
    }

    /// Snapshot of monitored mints for the curve poller: mint, project, and
    /// the timestamp of its last observed trade activity.
    pub async fn snapshot_registry(&self) -> Vec<(String, Project, Instant)> {
        let registry = self.registry.lock().await;
        let activity = self.activity.lock().await;
        registry
            .iter()
            .map(|(mint, entry)| {
                let last_activity = activity.get(mint).copied().unwrap_or_else(Instant::now);
                (mint.clone(), entry.project.clone(), last_activity)
            })
            .collect()
    }

    /// Publish a polled price update to a mint's monitor, if still registered.
    pub async fn publish_price(&self, mint: &str, update: PriceUpdate) -> PipelineResult<()> {
        let registry = self.registry.lock().await;
        match registry.get(mint) {
            Some(entry) => {
                let _ = entry.queue.send(MonitorEvent::Price(update));
                Ok(())
            }
            None => Err(PipelineError::AccountNotFound {
                address: mint.to_string(),
            }),
        }
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
