use chrono::{DateTime, Utc};
use indexmap::IndexSet;

use crate::models::group::{StockGroup, WatchlistData, DEFAULT_GROUP};
use crate::models::path::GroupPath;

/// Callback invoked with the new snapshot after every `replace`.
pub type Observer = Box<dyn Fn(&WatchlistData) + Send + Sync>;

/// Handle returned by [`WatchlistStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// In-memory holder of the full watchlist hierarchy.
///
/// All reads are projections over the current snapshot. `replace` is the
/// only mutation entry point and is called with either a server-confirmed
/// tree or an explicit optimistic copy.
#[derive(Default)]
pub struct WatchlistStore {
    snapshot: WatchlistData,
    last_replaced: Option<DateTime<Utc>>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl std::fmt::Debug for WatchlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistStore")
            .field("groups", &self.snapshot.groups.len())
            .field("last_replaced", &self.last_replaced)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl WatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: WatchlistData) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &WatchlistData {
        &self.snapshot
    }

    /// When the snapshot was last replaced, `None` before the first load.
    #[must_use]
    pub fn last_replaced(&self) -> Option<DateTime<Utc>> {
        self.last_replaced
    }

    /// Swap in a whole new tree and notify observers. Returns the previous one.
    pub fn replace(&mut self, snapshot: WatchlistData) -> WatchlistData {
        let previous = std::mem::replace(&mut self.snapshot, snapshot);
        self.last_replaced = Some(Utc::now());
        for (_, observer) in &self.observers {
            observer(&self.snapshot);
        }
        previous
    }

    // ── Observers ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn clear_subscribers(&mut self) {
        self.observers.clear();
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    // ── Projections ─────────────────────────────────────────────────

    /// Every symbol in every group and subgroup, first-seen order, no repeats.
    #[must_use]
    pub fn all_symbols(&self) -> IndexSet<String> {
        all_symbols(&self.snapshot)
    }

    /// Same traversal as [`all_symbols`](Self::all_symbols), skipping the default group subtree.
    #[must_use]
    pub fn grouped_symbols(&self) -> IndexSet<String> {
        grouped_symbols(&self.snapshot)
    }

    /// Symbols present only in the default group, in `all_symbols` order.
    #[must_use]
    pub fn ungrouped_symbols(&self) -> Vec<String> {
        ungrouped_symbols(&self.snapshot)
    }

    /// Every non-default group path, depth-first, parents before children.
    #[must_use]
    pub fn all_folder_paths(&self) -> Vec<GroupPath> {
        all_folder_paths(&self.snapshot)
    }

    #[must_use]
    pub fn contains_group(&self, path: &GroupPath) -> bool {
        self.snapshot.contains_group(path)
    }

    #[must_use]
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.snapshot.find_symbol(symbol).is_some()
    }

    /// Group currently holding `symbol`, resolved by traversal.
    #[must_use]
    pub fn containing_group(&self, symbol: &str) -> Option<GroupPath> {
        self.snapshot.find_symbol(symbol)
    }
}

// ── Snapshot projections ────────────────────────────────────────────

#[must_use]
pub fn all_symbols(data: &WatchlistData) -> IndexSet<String> {
    let mut symbols = IndexSet::new();
    for group in data.groups.values() {
        collect_symbols(group, &mut symbols);
    }
    symbols
}

#[must_use]
pub fn grouped_symbols(data: &WatchlistData) -> IndexSet<String> {
    let mut symbols = IndexSet::new();
    for (name, group) in &data.groups {
        if name != DEFAULT_GROUP {
            collect_symbols(group, &mut symbols);
        }
    }
    symbols
}

#[must_use]
pub fn ungrouped_symbols(data: &WatchlistData) -> Vec<String> {
    let grouped = grouped_symbols(data);
    all_symbols(data)
        .into_iter()
        .filter(|s| !grouped.contains(s))
        .collect()
}

#[must_use]
pub fn all_folder_paths(data: &WatchlistData) -> Vec<GroupPath> {
    let mut paths = Vec::new();
    data.walk(|path, _| {
        if path.as_str() != DEFAULT_GROUP {
            paths.push(path.clone());
        }
    });
    paths
}

fn collect_symbols(group: &StockGroup, out: &mut IndexSet<String>) {
    for stock in &group.stocks {
        out.insert(stock.clone());
    }
    for child in group.sub_groups.values() {
        collect_symbols(child, out);
    }
}
