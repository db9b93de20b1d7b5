use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::path::GroupPath;

/// Reserved top-level group holding symbols not filed anywhere else.
/// Never rendered as a folder and never nested.
pub const DEFAULT_GROUP: &str = "默认分组";

/// A named folder of stock symbols, possibly containing nested subgroups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StockGroup {
    /// Free-text label.
    #[serde(default)]
    pub description: String,

    /// Symbols in display order. A symbol appears at most once per group.
    #[serde(default)]
    pub stocks: Vec<String>,

    /// Child groups keyed by short name, in display order.
    #[serde(
        default,
        rename = "subGroups",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub sub_groups: IndexMap<String, StockGroup>,
}

impl StockGroup {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper: replace the symbol list.
    pub fn with_stocks<I, S>(mut self, stocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stocks = stocks.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style helper: append a child group.
    pub fn with_sub_group(mut self, name: impl Into<String>, group: StockGroup) -> Self {
        self.sub_groups.insert(name.into(), group);
        self
    }

    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.stocks.iter().any(|s| s == symbol)
    }
}

/// The full watchlist tree as exchanged with the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WatchlistData {
    #[serde(default)]
    pub groups: IndexMap<String, StockGroup>,
}

impl WatchlistData {
    pub fn new(groups: IndexMap<String, StockGroup>) -> Self {
        Self { groups }
    }

    /// Look up a group by full path.
    #[must_use]
    pub fn group(&self, path: &GroupPath) -> Option<&StockGroup> {
        let mut segments = path.segments();
        let mut current = self.groups.get(segments.next()?)?;
        for name in segments {
            current = current.sub_groups.get(name)?;
        }
        Some(current)
    }

    #[must_use]
    pub fn contains_group(&self, path: &GroupPath) -> bool {
        self.group(path).is_some()
    }

    /// Visit every group depth-first, parents before children, in stored order.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&GroupPath, &StockGroup),
    {
        fn descend<F: FnMut(&GroupPath, &StockGroup)>(
            path: &GroupPath,
            group: &StockGroup,
            visit: &mut F,
        ) {
            visit(path, group);
            for (name, child) in &group.sub_groups {
                descend(&path.join(name), child, visit);
            }
        }

        for (name, group) in &self.groups {
            descend(&GroupPath::new(name.clone()), group, &mut visit);
        }
    }

    /// First group (depth-first, stored order) whose `stocks` contains `symbol`.
    #[must_use]
    pub fn find_symbol(&self, symbol: &str) -> Option<GroupPath> {
        let mut found = None;
        self.walk(|path, group| {
            if found.is_none() && group.contains(symbol) {
                found = Some(path.clone());
            }
        });
        found
    }

    /// Every group path whose `stocks` contains `symbol`.
    #[must_use]
    pub fn groups_containing(&self, symbol: &str) -> Vec<GroupPath> {
        let mut paths = Vec::new();
        self.walk(|path, group| {
            if group.contains(symbol) {
                paths.push(path.clone());
            }
        });
        paths
    }

    /// Check the structural invariants: no symbol twice within one group,
    /// and the default group has no subgroups.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut ok = true;
        self.walk(|_, group| {
            let mut seen = std::collections::HashSet::new();
            if !group.stocks.iter().all(|s| seen.insert(s)) {
                ok = false;
            }
        });
        if let Some(default) = self.groups.get(DEFAULT_GROUP) {
            ok &= default.sub_groups.is_empty();
        }
        ok
    }
}
