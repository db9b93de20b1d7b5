pub mod errors;
pub mod models;
pub mod remote;
pub mod services;
pub mod store;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use models::{
    display::{DisplayNode, ScrollAnchor, ScrollRequest},
    gesture::{DragGesture, DropOutcome, DropPosition, MoveMode, MutationIntent, SiblingPosition, StockMove},
    group::WatchlistData,
    path::{decode_key, GroupPath, NodeKey},
    settings::GatewaySettings,
};
use remote::{http::HttpRemote, traits::WatchlistRemote};
use services::{
    drag_interpreter::{resolve_membership, DragInterpreter},
    hierarchy_service::HierarchyService,
    mutation_gateway::MutationGateway,
    tree_projector::TreeProjector,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use store::watchlist_store::{Observer, SubscriptionId, WatchlistStore};
use tracing::{debug, error, info, warn};

use errors::WatchlistError;

/// Characters of a note's first line shown in the preview.
const NOTE_PREVIEW_CHARS: usize = 30;

/// Liveness flag shared between the dashboard and whoever tears the view down.
///
/// Responses that arrive after [`end`](Self::end) are discarded instead of
/// being applied to a view that no longer exists.
#[derive(Debug, Clone)]
pub struct ViewLifetime(Arc<AtomicBool>);

impl ViewLifetime {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn end(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Main entry point: the watchlist dashboard controller.
///
/// Owns the store, selection, folder expansion and scroll anchors, turns
/// gestures into gateway calls and reconciles local state with the
/// server's answers. Every confirmed mutation replaces the whole tree.
#[must_use]
pub struct WatchlistDashboard {
    store: WatchlistStore,
    gateway: MutationGateway,
    interpreter: DragInterpreter,
    projector: TreeProjector,
    hierarchy: HierarchyService,
    tree: Vec<DisplayNode>,
    selection: IndexSet<NodeKey>,
    selected_stock: Option<String>,
    expanded: IndexSet<GroupPath>,
    anchors: HashMap<String, ScrollAnchor>,
    notes: HashMap<String, String>,
    lifetime: ViewLifetime,
    loaded: bool,
}

impl std::fmt::Debug for WatchlistDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistDashboard")
            .field("remote", &self.gateway.remote_name())
            .field("groups", &self.store.snapshot().groups.len())
            .field("selection", &self.selection.len())
            .field("expanded", &self.expanded.len())
            .field("live", &self.lifetime.is_live())
            .finish()
    }
}

impl WatchlistDashboard {
    /// Dashboard backed by the HTTP server described by `settings`.
    pub fn connect(settings: &GatewaySettings) -> Result<Self, WatchlistError> {
        let remote = HttpRemote::new(settings)?;
        Ok(Self::with_remote(Box::new(remote)))
    }

    /// Dashboard backed by any remote implementation.
    pub fn with_remote(remote: Box<dyn WatchlistRemote>) -> Self {
        Self {
            store: WatchlistStore::new(),
            gateway: MutationGateway::new(remote),
            interpreter: DragInterpreter::new(),
            projector: TreeProjector::new(),
            hierarchy: HierarchyService::new(),
            tree: Vec::new(),
            selection: IndexSet::new(),
            selected_stock: None,
            expanded: IndexSet::new(),
            anchors: HashMap::new(),
            notes: HashMap::new(),
            lifetime: ViewLifetime::new(),
            loaded: false,
        }
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Initial load: fetch the tree, clear selection and scroll anchors,
    /// and expand every folder.
    pub async fn load(&mut self) -> Result<(), WatchlistError> {
        let tree = self.gateway.fetch().await?;
        if !self.install(tree) {
            return Ok(());
        }
        self.anchors.clear();
        self.notes.clear();
        self.selection.clear();
        self.selected_stock = None;
        self.expand_all();
        self.loaded = true;
        info!(folders = self.expanded.len(), "watchlist loaded");
        Ok(())
    }

    /// Re-fetch the tree, keeping selection and expansion that still apply.
    /// Cached notes are dropped so they are read again on next use.
    pub async fn refresh_directory(&mut self) -> Result<(), WatchlistError> {
        let tree = self.gateway.fetch().await?;
        if self.install(tree) {
            self.notes.clear();
        }
        Ok(())
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The current display tree.
    #[must_use]
    pub fn tree(&self) -> &[DisplayNode] {
        &self.tree
    }

    #[must_use]
    pub fn store(&self) -> &WatchlistStore {
        &self.store
    }

    #[must_use]
    pub fn snapshot(&self) -> &WatchlistData {
        self.store.snapshot()
    }

    /// When the tree was last replaced.
    #[must_use]
    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.store.last_replaced()
    }

    // ── Group Management ────────────────────────────────────────────

    pub async fn create_group(
        &mut self,
        path: &GroupPath,
        description: &str,
    ) -> Result<(), WatchlistError> {
        let tree = self.gateway.create_group(path, description).await?;
        self.install(tree);
        Ok(())
    }

    /// Delete a group; its symbols end up in the default group.
    pub async fn delete_group(&mut self, path: &GroupPath) -> Result<(), WatchlistError> {
        let tree = self.gateway.delete_group(path).await?;
        self.install(tree);
        Ok(())
    }

    /// Rename a group. Expansion of the old path is not carried over, so the
    /// renamed folder shows collapsed.
    pub async fn rename_group(
        &mut self,
        path: &GroupPath,
        new_name: &str,
    ) -> Result<(), WatchlistError> {
        let tree = self.gateway.rename_group(path, new_name).await?;
        self.install(tree);
        Ok(())
    }

    pub async fn move_group(
        &mut self,
        source: &GroupPath,
        target: &GroupPath,
        mode: MoveMode,
    ) -> Result<(), WatchlistError> {
        let tree = self.gateway.move_group(source, target, mode).await?;
        self.install(tree);
        Ok(())
    }

    pub async fn reorder_group(
        &mut self,
        source: &GroupPath,
        target: &GroupPath,
        position: SiblingPosition,
    ) -> Result<(), WatchlistError> {
        let tree = self.gateway.reorder_group(source, target, position).await?;
        self.install(tree);
        Ok(())
    }

    // ── Stock Management ────────────────────────────────────────────

    pub async fn add_stock(&mut self, symbol: &str, group: &GroupPath) -> Result<(), WatchlistError> {
        let tree = self.gateway.add_stock(symbol, group).await?;
        self.install(tree);
        Ok(())
    }

    pub async fn remove_stock(
        &mut self,
        group: &GroupPath,
        symbol: &str,
    ) -> Result<(), WatchlistError> {
        let tree = self.gateway.remove_stock(group, symbol).await?;
        self.install(tree);
        Ok(())
    }

    // ── Drag & Drop ─────────────────────────────────────────────────

    /// Interpret a gesture and carry out the resulting mutation.
    ///
    /// Single mutations either install the server's tree or fail with the
    /// store untouched. A multi-symbol move reports how many symbols made
    /// it; symbols moved before a failure stay moved.
    pub async fn handle_drop(&mut self, gesture: &DragGesture) -> Result<DropOutcome, WatchlistError> {
        let intent = self.interpreter.interpret(self.store.snapshot(), gesture)?;
        match intent {
            MutationIntent::NoOp => {
                debug!(dragged = %gesture.dragged, "drop is a no-op");
                Ok(DropOutcome::NoOp)
            }
            MutationIntent::ReorderGroup {
                source,
                target,
                position,
            } => {
                self.reorder_group(&source, &target, position).await?;
                Ok(DropOutcome::Applied)
            }
            MutationIntent::MoveGroup {
                source,
                target,
                mode,
            } => {
                self.move_group(&source, &target, mode).await?;
                Ok(DropOutcome::Applied)
            }
            MutationIntent::ReorderStock {
                group,
                source_symbol,
                target_symbol,
                position,
            } => {
                let tree = self
                    .gateway
                    .reorder_stock(&group, &source_symbol, &target_symbol, position)
                    .await?;
                self.install(tree);
                Ok(DropOutcome::Applied)
            }
            MutationIntent::MoveStocks { moves, to_group } => {
                self.move_stocks(moves, &to_group).await
            }
        }
    }

    /// Same as [`handle_drop`](Self::handle_drop), taking the tree widget's raw
    /// string keys. `dragged_parent` and `target_parent` are the groups the two
    /// nodes were rendered under ([`DisplayNode::parent`]); a symbol held by
    /// several groups is resolved through them.
    pub async fn handle_widget_drop(
        &mut self,
        dragged: &str,
        dragged_parent: Option<&GroupPath>,
        target: Option<&str>,
        target_parent: Option<&GroupPath>,
        position: DropPosition,
        selection: &[&str],
    ) -> Result<DropOutcome, WatchlistError> {
        let dragged = decode_key(dragged).inspect_err(|e| error!(error = %e, "bad drag key"))?;
        let target = target
            .map(decode_key)
            .transpose()
            .inspect_err(|e| error!(error = %e, "bad drop target key"))?;
        let selection = selection
            .iter()
            .filter_map(|raw| match decode_key(raw) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, "ignoring bad selection key");
                    None
                }
            })
            .collect();
        let gesture = DragGesture::new(dragged, target, position)
            .with_selection(selection)
            .with_context(dragged_parent.cloned(), target_parent.cloned());
        self.handle_drop(&gesture).await
    }

    /// Move symbols one request at a time. Each symbol is moved locally
    /// first; a failed request restores the tree as it was before that
    /// symbol and stops the batch. Symbols found already in the destination
    /// count as neither moved nor failed.
    async fn move_stocks(
        &mut self,
        moves: Vec<StockMove>,
        to_group: &GroupPath,
    ) -> Result<DropOutcome, WatchlistError> {
        let planned = moves.len();
        let mut total = planned;
        let mut moved = 0;
        let mut failure = None;

        for planned in moves {
            if !self.lifetime.is_live() {
                break;
            }
            let symbol = planned.symbol;
            let snapshot = self.store.snapshot();
            let still_there = snapshot
                .group(&planned.from_group)
                .is_some_and(|g| g.contains(&symbol));
            let from_group = if still_there {
                planned.from_group
            } else {
                match resolve_membership(snapshot, &symbol, None) {
                    Some(group) => group,
                    None => {
                        failure = Some(WatchlistError::NotFound(format!(
                            "{symbol} is not in the watchlist"
                        )));
                        break;
                    }
                }
            };
            if &from_group == to_group {
                debug!(%symbol, "already in destination, skipped");
                total -= 1;
                continue;
            }

            let previous = snapshot.clone();
            let optimistic = match self
                .hierarchy
                .move_stock(&previous, &symbol, &from_group, to_group)
            {
                Ok(local) => {
                    self.store.replace(local);
                    self.reproject();
                    true
                }
                Err(e) => {
                    debug!(%symbol, error = %e, "skipping optimistic move");
                    false
                }
            };

            match self.gateway.move_stock(&symbol, &from_group, to_group).await {
                Ok(tree) => {
                    moved += 1;
                    self.install(tree);
                }
                Err(e) => {
                    if optimistic && self.lifetime.is_live() {
                        warn!(%symbol, "move failed, rolling back local edit");
                        self.store.replace(previous);
                        self.reproject();
                    }
                    failure = Some(e);
                    break;
                }
            }
        }

        if planned == 1 {
            if let Some(e) = failure {
                return Err(e);
            }
        }
        if failure.is_none() {
            self.selection.clear();
        }
        info!(moved, total, to = %to_group, "stock move finished");
        Ok(DropOutcome::Batch {
            moved,
            total,
            error: failure,
        })
    }

    // ── Selection ───────────────────────────────────────────────────

    /// Replace the selection. Folder keys and unknown symbols are dropped.
    /// Selecting exactly one stock makes it the selected stock and returns
    /// where to scroll, if its card has registered an anchor.
    pub fn select(&mut self, keys: Vec<NodeKey>) -> Option<ScrollRequest> {
        self.selection = keys
            .into_iter()
            .filter(|key| key.as_stock().is_some_and(|s| self.store.contains_symbol(s)))
            .collect();
        if self.selection.len() != 1 {
            return None;
        }
        let symbol = self.selection.first()?.as_stock()?.to_string();
        self.selected_stock = Some(symbol.clone());
        self.scroll_to(&symbol)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn selection(&self) -> &IndexSet<NodeKey> {
        &self.selection
    }

    #[must_use]
    pub fn selected_stock(&self) -> Option<&str> {
        self.selected_stock.as_deref()
    }

    // ── Scroll Anchors ──────────────────────────────────────────────

    pub fn register_anchor(&mut self, symbol: &str, anchor: ScrollAnchor) {
        self.anchors.insert(symbol.to_string(), anchor);
    }

    pub fn unregister_anchor(&mut self, symbol: &str) -> Option<ScrollAnchor> {
        self.anchors.remove(symbol)
    }

    #[must_use]
    pub fn scroll_to(&self, symbol: &str) -> Option<ScrollRequest> {
        self.anchors.get(symbol).map(|&anchor| ScrollRequest {
            symbol: symbol.to_string(),
            anchor,
        })
    }

    // ── Expansion ───────────────────────────────────────────────────

    /// Replace the expanded set, keeping only folders that exist.
    pub fn set_expanded(&mut self, paths: Vec<GroupPath>) {
        self.expanded = paths
            .into_iter()
            .filter(|p| self.store.contains_group(p))
            .collect();
    }

    /// Flip one folder. Returns its new state.
    pub fn toggle_expanded(&mut self, path: &GroupPath) -> bool {
        if self.expanded.shift_remove(path) {
            return false;
        }
        if !self.store.contains_group(path) {
            return false;
        }
        self.expanded.insert(path.clone());
        true
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.store.all_folder_paths().into_iter().collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Expand everything when nothing is expanded, otherwise collapse everything.
    pub fn toggle_expand_all(&mut self) {
        if self.expanded.is_empty() {
            self.expand_all();
        } else {
            self.collapse_all();
        }
    }

    #[must_use]
    pub fn is_expanded(&self, path: &GroupPath) -> bool {
        self.expanded.contains(path)
    }

    #[must_use]
    pub fn expanded(&self) -> &IndexSet<GroupPath> {
        &self.expanded
    }

    // ── Notes ───────────────────────────────────────────────────────

    /// Note for a symbol, fetched once and then served from cache until the
    /// next load or refresh.
    pub async fn note(&mut self, symbol: &str) -> Result<String, WatchlistError> {
        if let Some(note) = self.notes.get(symbol) {
            return Ok(note.clone());
        }
        let note = self.gateway.fetch_note(symbol).await?;
        if self.lifetime.is_live() {
            self.notes.insert(symbol.to_string(), note.clone());
        }
        Ok(note)
    }

    pub async fn update_note(&mut self, symbol: &str, note: &str) -> Result<(), WatchlistError> {
        self.gateway.update_note(symbol, note).await?;
        if self.lifetime.is_live() {
            self.notes.insert(symbol.to_string(), note.to_string());
        }
        Ok(())
    }

    /// First line of the cached note, cut to 30 characters with `...`.
    /// `None` when no note is cached or it is empty.
    #[must_use]
    pub fn note_preview(&self, symbol: &str) -> Option<String> {
        let note = self.notes.get(symbol)?;
        let first_line = note.lines().next().unwrap_or("");
        if first_line.is_empty() {
            return None;
        }
        let mut preview: String = first_line.chars().take(NOTE_PREVIEW_CHARS).collect();
        if first_line.chars().count() > NOTE_PREVIEW_CHARS {
            preview.push_str("...");
        }
        Some(preview)
    }

    // ── Observers & Lifetime ────────────────────────────────────────

    /// Be told about every tree replacement until unsubscribed or torn down.
    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        self.store.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Handle that can end this view from elsewhere (e.g. on unmount).
    pub fn lifetime(&self) -> ViewLifetime {
        self.lifetime.clone()
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.lifetime.is_live()
    }

    /// End the view: drop observers and anchors; later responses are discarded.
    pub fn teardown(&mut self) {
        self.lifetime.end();
        self.store.clear_subscribers();
        self.anchors.clear();
        info!("watchlist view torn down");
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Install an authoritative tree: replace the store, re-derive the display
    /// tree and drop selection, expansion and anchors that no longer resolve.
    /// Returns `false` when the view is gone and the tree was discarded.
    fn install(&mut self, tree: WatchlistData) -> bool {
        if !self.lifetime.is_live() {
            warn!("view torn down, discarding response");
            return false;
        }
        self.store.replace(tree);
        self.reproject();
        self.prune();
        true
    }

    fn reproject(&mut self) {
        self.tree = self.projector.project(self.store.snapshot());
    }

    fn prune(&mut self) {
        let store = &self.store;
        self.selection.retain(|key| match key {
            NodeKey::Folder(path) => store.contains_group(path),
            NodeKey::Stock(symbol) => store.contains_symbol(symbol),
        });
        self.expanded.retain(|path| store.contains_group(path));
        self.anchors.retain(|symbol, _| store.contains_symbol(symbol));
        if self
            .selected_stock
            .as_deref()
            .is_some_and(|s| !store.contains_symbol(s))
        {
            self.selected_stock = None;
        }
    }
}
