use serde::{Deserialize, Serialize};

use super::path::{GroupPath, NodeKey};

/// One entry of the rendered watchlist tree.
///
/// Derived from a snapshot on every change; carries no selection or
/// expansion state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNode {
    pub key: NodeKey,

    /// Symbol for leaves, short group name for folders.
    pub label: String,

    /// Stocks first, then subgroups. Always empty for leaves.
    pub children: Vec<DisplayNode>,

    pub is_leaf: bool,

    /// Group the node is rendered under. For a leaf this is the group whose
    /// `stocks` holds it (the default group for ungrouped leaves); for a
    /// folder it is the parent group, `None` at the top level.
    pub parent: Option<GroupPath>,
}

impl DisplayNode {
    pub fn leaf(symbol: &str, parent: GroupPath) -> Self {
        Self {
            key: NodeKey::stock(symbol),
            label: symbol.to_string(),
            children: Vec::new(),
            is_leaf: true,
            parent: Some(parent),
        }
    }

    pub fn folder(path: &GroupPath, children: Vec<DisplayNode>) -> Self {
        Self {
            key: NodeKey::Folder(path.clone()),
            label: path.leaf_name().to_string(),
            children,
            is_leaf: false,
            parent: path.parent(),
        }
    }

    /// Depth-first search for a node by key.
    #[must_use]
    pub fn find(&self, key: &NodeKey) -> Option<&DisplayNode> {
        if &self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// Total number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DisplayNode::node_count).sum::<usize>()
    }
}

/// Opaque handle to where a symbol's card is rendered (an offset, an
/// element index, ...). Only the renderer interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrollAnchor(pub u64);

/// Request to bring a symbol's card into view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub symbol: String,
    pub anchor: ScrollAnchor,
}
