use async_trait::async_trait;

use crate::errors::WatchlistError;
use crate::models::gesture::{MoveMode, SiblingPosition};
use crate::models::group::WatchlistData;
use crate::models::path::GroupPath;

/// The remote store holding the authoritative watchlist.
///
/// One method per endpoint. Only [`fetch_watchlist`](Self::fetch_watchlist)
/// is guaranteed a tree; a mutation returns `Some` when the server sent the
/// whole tree back and `None` when it did not, in which case the gateway
/// re-fetches. Implementations: [`HttpRemote`](super::http::HttpRemote)
/// for the real server, [`MemoryRemote`](super::memory::MemoryRemote) for
/// offline use and tests.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WatchlistRemote: Send + Sync {
    /// Human-readable name of this remote (for logs).
    fn name(&self) -> &str;

    async fn fetch_watchlist(&self) -> Result<WatchlistData, WatchlistError>;

    async fn create_group(
        &self,
        path: &GroupPath,
        description: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn delete_group(&self, path: &GroupPath) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn rename_group(
        &self,
        path: &GroupPath,
        new_name: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn move_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        mode: MoveMode,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn reorder_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn add_stock(
        &self,
        symbol: &str,
        group: &GroupPath,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn move_stock(
        &self,
        symbol: &str,
        from_group: &GroupPath,
        to_group: &GroupPath,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn reorder_stock(
        &self,
        group: &GroupPath,
        source_symbol: &str,
        target_symbol: &str,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    async fn remove_stock(
        &self,
        group: &GroupPath,
        symbol: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError>;

    /// Free-text note attached to a symbol; empty when none was saved.
    async fn fetch_note(&self, symbol: &str) -> Result<String, WatchlistError>;

    async fn update_note(&self, symbol: &str, note: &str) -> Result<(), WatchlistError>;
}
