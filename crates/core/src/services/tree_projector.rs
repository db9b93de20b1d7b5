use crate::models::display::DisplayNode;
use crate::models::group::{StockGroup, WatchlistData, DEFAULT_GROUP};
use crate::models::path::GroupPath;
use crate::store::watchlist_store::ungrouped_symbols;

/// Derives the display tree from a snapshot.
///
/// Layout: ungrouped symbols first as leaves, then every non-default
/// top-level group in stored order. A folder lists its own stocks before
/// its subgroups. No side effects, so it is re-run after every change.
#[derive(Debug, Default)]
pub struct TreeProjector;

impl TreeProjector {
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn project(&self, snapshot: &WatchlistData) -> Vec<DisplayNode> {
        let default_path = GroupPath::new(DEFAULT_GROUP);
        let mut nodes: Vec<DisplayNode> = ungrouped_symbols(snapshot)
            .iter()
            .map(|symbol| DisplayNode::leaf(symbol, default_path.clone()))
            .collect();

        nodes.extend(project_groups(snapshot));
        nodes
    }
}

fn project_groups(data: &WatchlistData) -> Vec<DisplayNode> {
    data.groups
        .iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_GROUP)
        .map(|(name, group)| project_folder(&GroupPath::new(name.clone()), group))
        .collect()
}

fn project_folder(path: &GroupPath, group: &StockGroup) -> DisplayNode {
    let mut children: Vec<DisplayNode> = group
        .stocks
        .iter()
        .map(|symbol| DisplayNode::leaf(symbol, path.clone()))
        .collect();
    children.extend(
        group
            .sub_groups
            .iter()
            .map(|(name, child)| project_folder(&path.join(name), child)),
    );
    DisplayNode::folder(path, children)
}
