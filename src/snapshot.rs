//! Outbound snapshot sink: the seam between a monitor's state machine and
//! whatever downstream consumer wants to know about it (spec §10.6).

use crate::core::Snapshot;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn emit(&self, snapshot: Snapshot);
}

/// Discards every snapshot. Used for dry runs and as a default when no
/// downstream consumer is configured.
pub struct NullSink;

#[async_trait]
impl SnapshotSink for NullSink {
    async fn emit(&self, _snapshot: Snapshot) {}
}

/// Logs every snapshot at `info` level. Grounded on the original pipeline's
/// `print()`-per-tick behaviour, expressed through `tracing` instead.
pub struct LoggingSink;

#[async_trait]
impl SnapshotSink for LoggingSink {
    async fn emit(&self, snapshot: Snapshot) {
        tracing::info!(
            mint = %snapshot.mint,
            price = ?snapshot.price,
            price_tx_estimate = ?snapshot.price_tx_estimate,
            holders = snapshot.holders,
            tx_count = snapshot.tx_count,
            "snapshot"
        );
    }
}
