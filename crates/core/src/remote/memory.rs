use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::errors::WatchlistError;
use crate::models::gesture::{MoveMode, SiblingPosition};
use crate::models::group::WatchlistData;
use crate::models::path::GroupPath;
use crate::services::hierarchy_service::HierarchyService;

use super::traits::WatchlistRemote;

/// In-process remote store.
///
/// Holds the authoritative tree behind a mutex and applies every request
/// through [`HierarchyService`], so it answers exactly as the server does.
/// Useful offline and as the backing store in tests.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    data: Mutex<WatchlistData>,
    notes: Mutex<HashMap<String, String>>,
    hierarchy: HierarchyService,
}

impl MemoryRemote {
    pub fn new(data: WatchlistData) -> Self {
        Self {
            data: Mutex::new(data),
            notes: Mutex::new(HashMap::new()),
            hierarchy: HierarchyService::new(),
        }
    }

    /// Copy of the tree currently held.
    pub fn snapshot(&self) -> Result<WatchlistData, WatchlistError> {
        Ok(self.lock_data()?.clone())
    }

    fn lock_data(&self) -> Result<MutexGuard<'_, WatchlistData>, WatchlistError> {
        self.data
            .lock()
            .map_err(|_| WatchlistError::Internal("watchlist lock poisoned".into()))
    }

    fn lock_notes(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, WatchlistError> {
        self.notes
            .lock()
            .map_err(|_| WatchlistError::Internal("notes lock poisoned".into()))
    }

    /// Run a mutation against the held tree; commit only on success.
    fn apply<F>(&self, mutate: F) -> Result<WatchlistData, WatchlistError>
    where
        F: FnOnce(&HierarchyService, &WatchlistData) -> Result<WatchlistData, WatchlistError>,
    {
        let mut data = self.lock_data()?;
        let updated = mutate(&self.hierarchy, &data)?;
        *data = updated.clone();
        Ok(updated)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WatchlistRemote for MemoryRemote {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_watchlist(&self) -> Result<WatchlistData, WatchlistError> {
        self.snapshot()
    }

    async fn create_group(
        &self,
        path: &GroupPath,
        description: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.create_group(d, path, description)).map(Some)
    }

    async fn delete_group(&self, path: &GroupPath) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.delete_group(d, path)).map(Some)
    }

    async fn rename_group(
        &self,
        path: &GroupPath,
        new_name: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.rename_group(d, path, new_name)).map(Some)
    }

    async fn move_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        mode: MoveMode,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.move_group(d, source, target, mode)).map(Some)
    }

    async fn reorder_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.reorder_group(d, source, target, position))
            .map(Some)
    }

    async fn add_stock(
        &self,
        symbol: &str,
        group: &GroupPath,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.add_stock(d, symbol, group)).map(Some)
    }

    async fn move_stock(
        &self,
        symbol: &str,
        from_group: &GroupPath,
        to_group: &GroupPath,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        // The real endpoint answers with a bare status; mirror that.
        self.apply(|h, d| h.move_stock(d, symbol, from_group, to_group))
            .map(|_| None)
    }

    async fn reorder_stock(
        &self,
        group: &GroupPath,
        source_symbol: &str,
        target_symbol: &str,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.reorder_stock(d, group, source_symbol, target_symbol, position))
            .map(Some)
    }

    async fn remove_stock(
        &self,
        group: &GroupPath,
        symbol: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.apply(|h, d| h.remove_stock(d, group, symbol)).map(|_| None)
    }

    async fn fetch_note(&self, symbol: &str) -> Result<String, WatchlistError> {
        Ok(self.lock_notes()?.get(symbol).cloned().unwrap_or_default())
    }

    async fn update_note(&self, symbol: &str, note: &str) -> Result<(), WatchlistError> {
        self.lock_notes()?.insert(symbol.to_string(), note.to_string());
        Ok(())
    }
}
