use tracing::{debug, info, warn};

use crate::errors::WatchlistError;
use crate::models::gesture::{MoveMode, SiblingPosition};
use crate::models::group::WatchlistData;
use crate::models::path::{normalize_symbol, GroupPath};
use crate::remote::traits::WatchlistRemote;

/// The only component that talks to the remote store.
///
/// Every mutation is one request and every success yields the full
/// authoritative tree: when an endpoint answers without one, the tree is
/// re-fetched. Failures come back as structured errors and nothing is
/// applied anywhere.
pub struct MutationGateway {
    remote: Box<dyn WatchlistRemote>,
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway")
            .field("remote", &self.remote.name())
            .finish()
    }
}

impl MutationGateway {
    pub fn new(remote: Box<dyn WatchlistRemote>) -> Self {
        Self { remote }
    }

    #[must_use]
    pub fn remote_name(&self) -> &str {
        self.remote.name()
    }

    /// Fetch the whole tree.
    pub async fn fetch(&self) -> Result<WatchlistData, WatchlistError> {
        let result = self.remote.fetch_watchlist().await;
        logged("fetch watchlist", result)
    }

    // ── Groups ──────────────────────────────────────────────────────

    pub async fn create_group(
        &self,
        path: &GroupPath,
        description: &str,
    ) -> Result<WatchlistData, WatchlistError> {
        if path.leaf_name().trim().is_empty() {
            return Err(WatchlistError::InvalidTarget("group name must not be empty".into()));
        }
        let result = self.remote.create_group(path, description.trim()).await;
        let result = self.complete(result).await;
        logged(&format!("create group '{path}'"), result)
    }

    pub async fn delete_group(&self, path: &GroupPath) -> Result<WatchlistData, WatchlistError> {
        let result = self.remote.delete_group(path).await;
        let result = self.complete(result).await;
        logged(&format!("delete group '{path}'"), result)
    }

    pub async fn rename_group(
        &self,
        path: &GroupPath,
        new_name: &str,
    ) -> Result<WatchlistData, WatchlistError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(WatchlistError::InvalidTarget("group name must not be empty".into()));
        }
        let result = self.remote.rename_group(path, new_name).await;
        let result = self.complete(result).await;
        logged(&format!("rename group '{path}' to '{new_name}'"), result)
    }

    pub async fn move_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        mode: MoveMode,
    ) -> Result<WatchlistData, WatchlistError> {
        let result = self.remote.move_group(source, target, mode).await;
        let result = self.complete(result).await;
        logged(&format!("move group '{source}' {mode} '{target}'"), result)
    }

    pub async fn reorder_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        position: SiblingPosition,
    ) -> Result<WatchlistData, WatchlistError> {
        let result = self.remote.reorder_group(source, target, position).await;
        let result = self.complete(result).await;
        logged(&format!("reorder group '{source}' {position} '{target}'"), result)
    }

    // ── Stocks ──────────────────────────────────────────────────────

    pub async fn add_stock(
        &self,
        symbol: &str,
        group: &GroupPath,
    ) -> Result<WatchlistData, WatchlistError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(WatchlistError::InvalidTarget("symbol must not be empty".into()));
        }
        let result = self.remote.add_stock(&symbol, group).await;
        let result = self.complete(result).await;
        logged(&format!("add {symbol} to '{group}'"), result)
    }

    /// Move one symbol. Same source and destination is a successful no-op
    /// that returns the current tree without mutating anything.
    pub async fn move_stock(
        &self,
        symbol: &str,
        from_group: &GroupPath,
        to_group: &GroupPath,
    ) -> Result<WatchlistData, WatchlistError> {
        if from_group == to_group {
            return self.fetch().await;
        }
        let result = self.remote.move_stock(symbol, from_group, to_group).await;
        let result = self.complete(result).await;
        logged(&format!("move {symbol} from '{from_group}' to '{to_group}'"), result)
    }

    pub async fn reorder_stock(
        &self,
        group: &GroupPath,
        source_symbol: &str,
        target_symbol: &str,
        position: SiblingPosition,
    ) -> Result<WatchlistData, WatchlistError> {
        let result = self
            .remote
            .reorder_stock(group, source_symbol, target_symbol, position)
            .await;
        let result = self.complete(result).await;
        logged(
            &format!("reorder {source_symbol} {position} {target_symbol} in '{group}'"),
            result,
        )
    }

    pub async fn remove_stock(
        &self,
        group: &GroupPath,
        symbol: &str,
    ) -> Result<WatchlistData, WatchlistError> {
        let result = self.remote.remove_stock(group, symbol).await;
        let result = self.complete(result).await;
        logged(&format!("remove {symbol} from '{group}'"), result)
    }

    // ── Notes ───────────────────────────────────────────────────────

    pub async fn fetch_note(&self, symbol: &str) -> Result<String, WatchlistError> {
        let result = self.remote.fetch_note(symbol).await;
        logged(&format!("fetch note for {symbol}"), result)
    }

    pub async fn update_note(&self, symbol: &str, note: &str) -> Result<(), WatchlistError> {
        let result = self.remote.update_note(symbol, note).await;
        logged(&format!("update note for {symbol}"), result)
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Use the tree the server sent back, or fetch it if it sent none.
    /// Failures pass through untouched.
    async fn complete(
        &self,
        answer: Result<Option<WatchlistData>, WatchlistError>,
    ) -> Result<WatchlistData, WatchlistError> {
        match answer? {
            Some(tree) => Ok(tree),
            None => {
                debug!("mutation answered without a tree, re-fetching");
                self.remote.fetch_watchlist().await
            }
        }
    }
}

fn logged<T>(operation: &str, result: Result<T, WatchlistError>) -> Result<T, WatchlistError> {
    match &result {
        Ok(_) => info!(operation, "remote call succeeded"),
        Err(e) => warn!(operation, error = %e, "remote call failed"),
    }
    result
}
