use indexmap::IndexSet;
use tracing::debug;

use crate::errors::WatchlistError;
use crate::models::gesture::{DragGesture, DropPosition, MoveMode, MutationIntent, StockMove};
use crate::models::group::{WatchlistData, DEFAULT_GROUP};
use crate::models::path::{GroupPath, NodeKey};

/// Maps one drag gesture onto exactly one mutation intent.
///
/// Stateless: everything it needs is the current snapshot and the gesture.
/// It performs no I/O; the dashboard hands the intent to the gateway.
///
/// Decision order (first match wins):
/// 1. folder beside a folder → reorder groups
/// 2. folder inside a node → move group into it
/// 3. stock onto a folder → move stock to that folder
/// 4. stock onto a stock in the same group → reorder stocks
/// 5. stock onto a stock in another group → move stock (appended)
/// 6. stock onto empty space → move stock to the default group
/// 7. any stock move whose source and destination coincide → no-op
#[derive(Debug, Default)]
pub struct DragInterpreter;

impl DragInterpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn interpret(
        &self,
        snapshot: &WatchlistData,
        gesture: &DragGesture,
    ) -> Result<MutationIntent, WatchlistError> {
        let intent = match &gesture.dragged {
            NodeKey::Folder(source) => self.interpret_folder(snapshot, source, gesture)?,
            NodeKey::Stock(symbol) => self.interpret_stock(snapshot, symbol, gesture)?,
        };
        debug!(dragged = %gesture.dragged, position = ?gesture.position, ?intent, "drag interpreted");
        Ok(intent)
    }

    fn interpret_folder(
        &self,
        snapshot: &WatchlistData,
        source: &GroupPath,
        gesture: &DragGesture,
    ) -> Result<MutationIntent, WatchlistError> {
        if gesture.target.as_ref() == Some(&gesture.dragged) {
            return Ok(MutationIntent::NoOp);
        }

        if gesture.position != DropPosition::Inside {
            return match &gesture.target {
                Some(NodeKey::Folder(target)) => Ok(MutationIntent::ReorderGroup {
                    source: source.clone(),
                    target: target.clone(),
                    position: gesture.position.as_sibling(),
                }),
                Some(NodeKey::Stock(symbol)) => Err(WatchlistError::InvalidTarget(format!(
                    "folder '{source}' can only be reordered next to another folder, not {symbol}"
                ))),
                None => Ok(move_group_to_root(source)),
            };
        }

        let target = match &gesture.target {
            Some(NodeKey::Folder(target)) => target.clone(),
            Some(NodeKey::Stock(symbol)) => {
                match resolve_membership(snapshot, symbol, gesture.target_parent.as_ref()) {
                    Some(group) if group.as_str() != DEFAULT_GROUP => group,
                    _ => GroupPath::root(),
                }
            }
            None => GroupPath::root(),
        };
        Ok(MutationIntent::MoveGroup {
            source: source.clone(),
            target,
            mode: MoveMode::Into,
        })
    }

    fn interpret_stock(
        &self,
        snapshot: &WatchlistData,
        symbol: &str,
        gesture: &DragGesture,
    ) -> Result<MutationIntent, WatchlistError> {
        let from_group = resolve_membership(snapshot, symbol, gesture.dragged_parent.as_ref())
            .ok_or_else(|| WatchlistError::NotFound(format!("{symbol} is not in the watchlist")))?;

        let to_group = match &gesture.target {
            Some(NodeKey::Folder(target)) => target.clone(),
            Some(NodeKey::Stock(target_symbol)) => {
                let target_group =
                    resolve_membership(snapshot, target_symbol, gesture.target_parent.as_ref())
                        .ok_or_else(|| {
                            WatchlistError::NotFound(format!("{target_symbol} is not in the watchlist"))
                        })?;
                if target_group == from_group {
                    if target_symbol == symbol {
                        return Ok(MutationIntent::NoOp);
                    }
                    return Ok(MutationIntent::ReorderStock {
                        group: from_group,
                        source_symbol: symbol.to_string(),
                        target_symbol: target_symbol.clone(),
                        position: gesture.position.as_sibling(),
                    });
                }
                target_group
            }
            None => GroupPath::new(DEFAULT_GROUP),
        };

        if from_group == to_group {
            return Ok(MutationIntent::NoOp);
        }

        let moves = self.fan_out(snapshot, symbol, &from_group, &to_group, gesture);
        Ok(MutationIntent::MoveStocks { moves, to_group })
    }

    /// Apply the dragged symbol's destination to the whole multi-selection,
    /// if the dragged key is part of it. Each symbol is planned once.
    fn fan_out(
        &self,
        snapshot: &WatchlistData,
        symbol: &str,
        from_group: &GroupPath,
        to_group: &GroupPath,
        gesture: &DragGesture,
    ) -> Vec<StockMove> {
        let dragged = StockMove {
            symbol: symbol.to_string(),
            from_group: from_group.clone(),
        };
        if gesture.selection.len() <= 1 || !gesture.selection.contains(&gesture.dragged) {
            return vec![dragged];
        }

        let selected_symbols: IndexSet<&str> = gesture
            .selection
            .iter()
            .filter_map(NodeKey::as_stock)
            .collect();
        let mut moves = Vec::new();
        for selected in selected_symbols {
            if selected == symbol {
                moves.push(dragged.clone());
                continue;
            }
            match resolve_membership(snapshot, selected, None) {
                Some(group) if &group == to_group => {
                    debug!(symbol = selected, group = %group, "already in destination, skipped");
                }
                Some(group) => moves.push(StockMove {
                    symbol: selected.to_string(),
                    from_group: group,
                }),
                None => debug!(symbol = selected, "selected symbol not in watchlist, skipped"),
            }
        }
        moves
    }
}

/// Group holding `symbol`, using the rendered parent when it really holds
/// the symbol, else the first non-default group, else the default group.
#[must_use]
pub fn resolve_membership(
    snapshot: &WatchlistData,
    symbol: &str,
    context: Option<&GroupPath>,
) -> Option<GroupPath> {
    if let Some(ctx) = context {
        if snapshot.group(ctx).is_some_and(|g| g.contains(symbol)) {
            return Some(ctx.clone());
        }
    }
    let candidates = snapshot.groups_containing(symbol);
    candidates
        .iter()
        .find(|p| !p.starts_with(&GroupPath::new(DEFAULT_GROUP)))
        .or_else(|| candidates.first())
        .cloned()
}

fn move_group_to_root(source: &GroupPath) -> MutationIntent {
    MutationIntent::MoveGroup {
        source: source.clone(),
        target: GroupPath::root(),
        mode: MoveMode::Into,
    }
}
