use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::WatchlistError;

use super::path::{GroupPath, NodeKey};

/// Where a dragged node lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropPosition {
    /// Above the target, at the dragged item's own level.
    Before,
    /// Onto the target (re-parent).
    Inside,
    /// Below the target, at the dragged item's own level.
    After,
}

impl DropPosition {
    /// Interpret the tree widget's relative offset: `-1`, `0` or `1`.
    #[must_use]
    pub fn from_offset(offset: i64) -> Self {
        match offset {
            o if o < 0 => DropPosition::Before,
            0 => DropPosition::Inside,
            _ => DropPosition::After,
        }
    }

    /// Compute the relative position from the widget's absolute drop index and
    /// the target node's `pos` string (`"0-2-1"`): the drop index minus the
    /// target's own index among its siblings.
    #[must_use]
    pub fn from_tree_positions(drop_position: i64, node_pos: &str) -> Self {
        let own_index = node_pos
            .rsplit('-')
            .next()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);
        Self::from_offset(drop_position - own_index)
    }

    /// Sibling placement for reorders. `Inside` on a leaf is treated as `After`.
    #[must_use]
    pub fn as_sibling(self) -> SiblingPosition {
        match self {
            DropPosition::Before => SiblingPosition::Before,
            DropPosition::Inside | DropPosition::After => SiblingPosition::After,
        }
    }
}

/// Placement of a node relative to a sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingPosition {
    Before,
    After,
}

impl fmt::Display for SiblingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiblingPosition::Before => write!(f, "before"),
            SiblingPosition::After => write!(f, "after"),
        }
    }
}

/// How a group move relates to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveMode {
    Into,
    Before,
    After,
}

impl From<SiblingPosition> for MoveMode {
    fn from(p: SiblingPosition) -> Self {
        match p {
            SiblingPosition::Before => MoveMode::Before,
            SiblingPosition::After => MoveMode::After,
        }
    }
}

impl fmt::Display for MoveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveMode::Into => write!(f, "into"),
            MoveMode::Before => write!(f, "before"),
            MoveMode::After => write!(f, "after"),
        }
    }
}

/// One completed pointer gesture, as reported by the tree widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGesture {
    pub dragged: NodeKey,

    /// `None` when dropped on empty space (the ungrouped area).
    pub target: Option<NodeKey>,

    pub position: DropPosition,

    /// Keys selected at drop time.
    pub selection: Vec<NodeKey>,

    /// Group the dragged node was rendered under, if known.
    pub dragged_parent: Option<GroupPath>,

    /// Group the target node was rendered under, if known.
    pub target_parent: Option<GroupPath>,
}

impl DragGesture {
    pub fn new(dragged: NodeKey, target: Option<NodeKey>, position: DropPosition) -> Self {
        Self {
            dragged,
            target,
            position,
            selection: Vec::new(),
            dragged_parent: None,
            target_parent: None,
        }
    }

    pub fn with_selection(mut self, selection: Vec<NodeKey>) -> Self {
        self.selection = selection;
        self
    }

    /// Attach the rendered parents of the dragged and target nodes, used to
    /// resolve symbols that appear in more than one group.
    pub fn with_context(
        mut self,
        dragged_parent: Option<GroupPath>,
        target_parent: Option<GroupPath>,
    ) -> Self {
        self.dragged_parent = dragged_parent;
        self.target_parent = target_parent;
        self
    }
}

/// A symbol and the group it is leaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMove {
    pub symbol: String,
    pub from_group: GroupPath,
}

/// The single mutation a gesture resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    ReorderGroup {
        source: GroupPath,
        target: GroupPath,
        position: SiblingPosition,
    },
    /// `target` is the root path when moving to the top level.
    MoveGroup {
        source: GroupPath,
        target: GroupPath,
        mode: MoveMode,
    },
    /// One entry per symbol; issued sequentially.
    MoveStocks {
        moves: Vec<StockMove>,
        to_group: GroupPath,
    },
    ReorderStock {
        group: GroupPath,
        source_symbol: String,
        target_symbol: String,
        position: SiblingPosition,
    },
    /// Source and destination coincide; nothing to send.
    NoOp,
}

impl MutationIntent {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, MutationIntent::NoOp)
    }
}

/// What a drop ended up doing.
#[derive(Debug)]
pub enum DropOutcome {
    /// Nothing to send; the tree is unchanged.
    NoOp,
    /// One mutation confirmed by the server.
    Applied,
    /// Multi-symbol move. Symbols moved before a failure stay moved.
    Batch {
        moved: usize,
        total: usize,
        error: Option<WatchlistError>,
    },
}

impl DropOutcome {
    /// User-facing status line.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            DropOutcome::NoOp => "nothing to move".to_string(),
            DropOutcome::Applied => "done".to_string(),
            DropOutcome::Batch {
                moved,
                total,
                error: None,
            } => format!("{moved} of {total} moved"),
            DropOutcome::Batch {
                moved,
                total,
                error: Some(e),
            } => format!("{moved} of {total} moved ({e})"),
        }
    }
}
