use crate::errors::WatchlistError;
use crate::models::gesture::{MoveMode, SiblingPosition};
use crate::models::group::{WatchlistData, DEFAULT_GROUP};
use crate::models::path::{normalize_symbol, GroupPath, PATH_SEPARATOR};
use crate::store::arena::{GroupArena, GroupId};

/// Applies hierarchy mutations to a snapshot and returns the resulting tree.
///
/// Pure business logic: the input snapshot is never touched, so a failed
/// mutation leaves the caller holding exactly what it had. These are the
/// semantics the remote store enforces; the in-process remote and the
/// dashboard's optimistic edits both run through here.
#[derive(Debug, Default)]
pub struct HierarchyService;

impl HierarchyService {
    pub fn new() -> Self {
        Self
    }

    // ── Groups ──────────────────────────────────────────────────────

    /// Create an empty group at `path`. A nested path requires its parent to exist.
    pub fn create_group(
        &self,
        data: &WatchlistData,
        path: &GroupPath,
        description: &str,
    ) -> Result<WatchlistData, WatchlistError> {
        if path.is_root() {
            return Err(WatchlistError::InvalidTarget("group name must not be empty".into()));
        }
        let name = path.leaf_name();
        validate_name(name)?;

        let mut arena = GroupArena::from_data(data);
        let parent = match path.parent() {
            Some(parent_path) => {
                if parent_path.as_str() == DEFAULT_GROUP {
                    return Err(WatchlistError::InvalidTarget(format!(
                        "'{DEFAULT_GROUP}' cannot contain subgroups"
                    )));
                }
                let id = arena
                    .resolve(&parent_path)
                    .ok_or_else(|| WatchlistError::NotFound(format!("group '{parent_path}'")))?;
                Some(id)
            }
            None => None,
        };

        if arena.child_named(parent, name).is_some() {
            return Err(WatchlistError::DuplicateName(format!("group '{path}' already exists")));
        }

        arena.insert(parent, name, description);
        Ok(arena.to_data())
    }

    /// Delete a group and its subgroups. Their symbols move to the default group.
    pub fn delete_group(
        &self,
        data: &WatchlistData,
        path: &GroupPath,
    ) -> Result<WatchlistData, WatchlistError> {
        reject_default(path, "deleted")?;
        let mut arena = GroupArena::from_data(data);
        let id = resolve(&arena, path)?;

        let orphans = arena.remove_subtree(id);
        let default = arena.ensure_root(DEFAULT_GROUP);
        if let Some(stocks) = arena.stocks_mut(default) {
            for symbol in orphans {
                if !stocks.contains(&symbol) {
                    stocks.push(symbol);
                }
            }
        }
        Ok(arena.to_data())
    }

    /// Give a group a new short name, keeping it in place.
    pub fn rename_group(
        &self,
        data: &WatchlistData,
        path: &GroupPath,
        new_name: &str,
    ) -> Result<WatchlistData, WatchlistError> {
        reject_default(path, "renamed")?;
        validate_name(new_name)?;
        let mut arena = GroupArena::from_data(data);
        let id = resolve(&arena, path)?;

        if path.leaf_name() == new_name {
            return Ok(data.clone());
        }
        if arena.child_named(arena.parent(id), new_name).is_some() {
            let sibling = path.parent().unwrap_or_default().join(new_name);
            return Err(WatchlistError::DuplicateName(format!("group '{sibling}' already exists")));
        }

        arena.rename(id, new_name);
        Ok(arena.to_data())
    }

    /// Relocate a group. `Into` with the root path moves it to the top level;
    /// `Before`/`After` place it beside `target` under the target's parent.
    pub fn move_group(
        &self,
        data: &WatchlistData,
        source: &GroupPath,
        target: &GroupPath,
        mode: MoveMode,
    ) -> Result<WatchlistData, WatchlistError> {
        reject_default(source, "moved")?;
        let mut arena = GroupArena::from_data(data);
        let src = resolve(&arena, source)?;

        let (dest_parent, anchor) = match mode {
            MoveMode::Into if target.is_root() => (None, None),
            MoveMode::Into => {
                if target.as_str() == DEFAULT_GROUP {
                    return Err(WatchlistError::InvalidTarget(format!(
                        "'{DEFAULT_GROUP}' cannot contain subgroups"
                    )));
                }
                let tgt = resolve(&arena, target)?;
                if arena.is_same_or_ancestor(src, tgt) {
                    return Err(WatchlistError::InvalidTarget(format!(
                        "cannot move '{source}' into itself or its descendant '{target}'"
                    )));
                }
                (Some(tgt), None)
            }
            MoveMode::Before | MoveMode::After => {
                if target.is_root() {
                    return Err(WatchlistError::InvalidTarget(format!(
                        "'{source}' needs a sibling to be placed {mode}"
                    )));
                }
                let tgt = resolve(&arena, target)?;
                if tgt == src {
                    return Ok(data.clone());
                }
                if arena.is_same_or_ancestor(src, tgt) {
                    return Err(WatchlistError::InvalidTarget(format!(
                        "cannot place '{source}' beside its own descendant '{target}'"
                    )));
                }
                (arena.parent(tgt), Some(tgt))
            }
        };

        let current_parent = arena.parent(src);
        if anchor.is_none() && dest_parent == current_parent {
            return Ok(data.clone());
        }
        let name = arena.name(src).unwrap_or_default().to_string();
        if dest_parent != current_parent && arena.child_named(dest_parent, &name).is_some() {
            let dest = dest_parent.map(|p| arena.path_of(p)).unwrap_or_default();
            return Err(WatchlistError::DuplicateName(format!(
                "group '{}' already exists",
                dest.join(&name)
            )));
        }

        arena.detach(src);
        let index = anchor.and_then(|a| arena.sibling_index(a)).map(|i| match mode {
            MoveMode::After => i + 1,
            _ => i,
        });
        arena.attach(src, dest_parent, index);
        Ok(arena.to_data())
    }

    /// Reorder a group relative to a sibling under the same parent.
    pub fn reorder_group(
        &self,
        data: &WatchlistData,
        source: &GroupPath,
        target: &GroupPath,
        position: SiblingPosition,
    ) -> Result<WatchlistData, WatchlistError> {
        reject_default(source, "reordered")?;
        reject_default(target, "used as a reorder target")?;
        let mut arena = GroupArena::from_data(data);
        let src = resolve(&arena, source)?;
        let tgt = resolve(&arena, target)?;

        if arena.parent(src) != arena.parent(tgt) {
            return Err(WatchlistError::InvalidTarget(format!(
                "'{source}' and '{target}' are not in the same folder"
            )));
        }
        if src == tgt {
            return Ok(data.clone());
        }

        let parent = arena.parent(src);
        arena.detach(src);
        let index = arena.sibling_index(tgt).map(|i| match position {
            SiblingPosition::Before => i,
            SiblingPosition::After => i + 1,
        });
        arena.attach(src, parent, index);
        Ok(arena.to_data())
    }

    // ── Stocks ──────────────────────────────────────────────────────

    /// Append a symbol to a group. The default group is created on demand.
    pub fn add_stock(
        &self,
        data: &WatchlistData,
        symbol: &str,
        group: &GroupPath,
    ) -> Result<WatchlistData, WatchlistError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(WatchlistError::InvalidTarget("symbol must not be empty".into()));
        }
        let mut arena = GroupArena::from_data(data);
        let id = resolve_or_default(&mut arena, group)?;
        let stocks = stocks_mut(&mut arena, id, group)?;
        if stocks.contains(&symbol) {
            return Err(WatchlistError::DuplicateName(format!("{symbol} is already in '{group}'")));
        }
        stocks.push(symbol);
        Ok(arena.to_data())
    }

    /// Drop a symbol from one group.
    pub fn remove_stock(
        &self,
        data: &WatchlistData,
        group: &GroupPath,
        symbol: &str,
    ) -> Result<WatchlistData, WatchlistError> {
        let mut arena = GroupArena::from_data(data);
        let id = resolve(&arena, group)?;
        let stocks = stocks_mut(&mut arena, id, group)?;
        let idx = stocks
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| WatchlistError::NotFound(format!("{symbol} is not in '{group}'")))?;
        stocks.remove(idx);
        Ok(arena.to_data())
    }

    /// Move a symbol between groups, appending it to the destination.
    pub fn move_stock(
        &self,
        data: &WatchlistData,
        symbol: &str,
        from_group: &GroupPath,
        to_group: &GroupPath,
    ) -> Result<WatchlistData, WatchlistError> {
        let mut arena = GroupArena::from_data(data);
        let from = resolve(&arena, from_group)?;
        if !arena.stocks(from).is_some_and(|s| s.iter().any(|x| x == symbol)) {
            return Err(WatchlistError::NotFound(format!("{symbol} is not in '{from_group}'")));
        }
        if from_group == to_group {
            return Ok(data.clone());
        }

        let to = resolve_or_default(&mut arena, to_group)?;
        if let Some(stocks) = arena.stocks_mut(from) {
            stocks.retain(|s| s != symbol);
        }
        let dest = stocks_mut(&mut arena, to, to_group)?;
        if !dest.iter().any(|s| s == symbol) {
            dest.push(symbol.to_string());
        }
        Ok(arena.to_data())
    }

    /// Place `source_symbol` immediately before or after `target_symbol` in one group.
    pub fn reorder_stock(
        &self,
        data: &WatchlistData,
        group: &GroupPath,
        source_symbol: &str,
        target_symbol: &str,
        position: SiblingPosition,
    ) -> Result<WatchlistData, WatchlistError> {
        let mut arena = GroupArena::from_data(data);
        let id = resolve(&arena, group)?;
        let stocks = stocks_mut(&mut arena, id, group)?;

        let src = stocks
            .iter()
            .position(|s| s == source_symbol)
            .ok_or_else(|| WatchlistError::NotFound(format!("{source_symbol} is not in '{group}'")))?;
        if !stocks.iter().any(|s| s == target_symbol) {
            return Err(WatchlistError::NotFound(format!("{target_symbol} is not in '{group}'")));
        }
        if source_symbol == target_symbol {
            return Ok(data.clone());
        }

        let moved = stocks.remove(src);
        let tgt = stocks.iter().position(|s| s == target_symbol).unwrap_or(stocks.len());
        let at = match position {
            SiblingPosition::Before => tgt,
            SiblingPosition::After => tgt + 1,
        };
        stocks.insert(at.min(stocks.len()), moved);
        Ok(arena.to_data())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn validate_name(name: &str) -> Result<(), WatchlistError> {
    if name.trim().is_empty() {
        return Err(WatchlistError::InvalidTarget("group name must not be empty".into()));
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(WatchlistError::InvalidTarget(format!(
            "group name '{name}' must not contain '{PATH_SEPARATOR}'"
        )));
    }
    if name == DEFAULT_GROUP {
        return Err(WatchlistError::InvalidTarget(format!("'{DEFAULT_GROUP}' is reserved")));
    }
    Ok(())
}

fn reject_default(path: &GroupPath, verb: &str) -> Result<(), WatchlistError> {
    if path.as_str() == DEFAULT_GROUP {
        return Err(WatchlistError::InvalidTarget(format!(
            "'{DEFAULT_GROUP}' cannot be {verb}"
        )));
    }
    Ok(())
}

fn resolve(arena: &GroupArena, path: &GroupPath) -> Result<GroupId, WatchlistError> {
    arena
        .resolve(path)
        .ok_or_else(|| WatchlistError::NotFound(format!("group '{path}'")))
}

fn resolve_or_default(arena: &mut GroupArena, path: &GroupPath) -> Result<GroupId, WatchlistError> {
    if path.as_str() == DEFAULT_GROUP {
        return Ok(arena.ensure_root(DEFAULT_GROUP));
    }
    resolve(arena, path)
}

fn stocks_mut<'a>(
    arena: &'a mut GroupArena,
    id: GroupId,
    path: &GroupPath,
) -> Result<&'a mut Vec<String>, WatchlistError> {
    arena
        .stocks_mut(id)
        .ok_or_else(|| WatchlistError::NotFound(format!("group '{path}'")))
}
