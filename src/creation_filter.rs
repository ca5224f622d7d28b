//! The "watcher": consumes newly seen `create` instructions, applies the
//! configured name/creator predicates, and registers survivors with the
//! dispatcher (spec §4.5).

use crate::core::{FilterConfig, MonitorEvent, Project};
use crate::dispatcher::{Dispatcher, WatcherEntry};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

const RECENT_MINT_CAPACITY: usize = 1_000;

/// Bounded recent-mint window guarding against redundant registration
/// attempts for a mint seen more than once before it clears the dispatcher's
/// own signature dedup (e.g. a retried `create` in a forked block).
struct RecentMints {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl RecentMints {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    fn check_and_insert(&mut self, mint: &str) -> bool {
        if self.seen.contains(mint) {
            return true;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(mint.to_string());
        self.seen.insert(mint.to_string());
        false
    }
}

pub struct CreationFilter {
    dispatcher: Arc<Dispatcher>,
    filters: FilterConfig,
    recent: RecentMints,
}

impl CreationFilter {
    pub fn new(dispatcher: Arc<Dispatcher>, filters: FilterConfig) -> Self {
        Self {
            dispatcher,
            filters,
            recent: RecentMints::new(RECENT_MINT_CAPACITY),
        }
    }

    /// Drain the watcher queue, spawning a monitor task for every entry that
    /// passes the configured predicates and registers cleanly.
    pub async fn run<F>(mut self, mut watcher_rx: mpsc::UnboundedReceiver<WatcherEntry>, spawn_monitor: F)
    where
        F: Fn(Project, mpsc::UnboundedReceiver<MonitorEvent>),
    {
        while let Some(entry) = watcher_rx.recv().await {
            self.handle_entry(entry, &spawn_monitor).await;
        }
    }

    async fn handle_entry<F>(&mut self, entry: WatcherEntry, spawn_monitor: &F)
    where
        F: Fn(Project, mpsc::UnboundedReceiver<MonitorEvent>),
    {
        if self.recent.check_and_insert(&entry.mint) {
            debug!(mint = %entry.mint, "ignoring already-seen mint");
            return;
        }

        if !self
            .filters
            .matches(&entry.name, &entry.symbol, &entry.creator)
        {
            debug!(mint = %entry.mint, "mint rejected by filter");
            return;
        }

        let project = Project {
            mint: entry.mint.clone(),
            name: entry.name,
            symbol: entry.symbol,
            creator: entry.creator,
            bonding_curve: entry.bonding_curve,
            associated_bonding_curve: entry.associated_bonding_curve,
        };

        match self.dispatcher.register_project(project.clone()).await {
            Some(rx) => {
                info!(mint = %project.mint, name = %project.name, "registered new project");
                spawn_monitor(project, rx);
            }
            None => {
                debug!(mint = %entry.mint, "project already registered, skipping");
            }
        }
    }
}
