use indexmap::IndexMap;

use crate::models::group::{StockGroup, WatchlistData};
use crate::models::path::GroupPath;

/// Slot index of a group record inside a [`GroupArena`].
pub type GroupId = usize;

#[derive(Debug, Clone)]
struct GroupRecord {
    name: String,
    description: String,
    stocks: Vec<String>,
    parent: Option<GroupId>,
    children: Vec<GroupId>,
}

/// Flat arena of group records linked by parent/child ids.
///
/// Renaming or moving a group only touches its own record and the two
/// sibling lists involved; descendants keep their records and pick up the
/// new path implicitly. Converted from and back to the nested wire form at
/// the edges of every mutation.
#[derive(Debug, Clone, Default)]
pub struct GroupArena {
    records: Vec<Option<GroupRecord>>,
    roots: Vec<GroupId>,
}

impl GroupArena {
    pub fn from_data(data: &WatchlistData) -> Self {
        let mut arena = Self::default();
        for (name, group) in &data.groups {
            let id = arena.load(name, group, None);
            arena.roots.push(id);
        }
        arena
    }

    fn load(&mut self, name: &str, group: &StockGroup, parent: Option<GroupId>) -> GroupId {
        let id = self.records.len();
        self.records.push(Some(GroupRecord {
            name: name.to_string(),
            description: group.description.clone(),
            stocks: group.stocks.clone(),
            parent,
            children: Vec::new(),
        }));
        let children: Vec<GroupId> = group
            .sub_groups
            .iter()
            .map(|(child_name, child)| self.load(child_name, child, Some(id)))
            .collect();
        if let Some(record) = self.records[id].as_mut() {
            record.children = children;
        }
        id
    }

    /// Rebuild the nested wire form, preserving sibling order.
    #[must_use]
    pub fn to_data(&self) -> WatchlistData {
        let groups = self
            .roots
            .iter()
            .filter_map(|&id| self.export(id))
            .collect::<IndexMap<_, _>>();
        WatchlistData::new(groups)
    }

    fn export(&self, id: GroupId) -> Option<(String, StockGroup)> {
        let record = self.record(id)?;
        let sub_groups = record
            .children
            .iter()
            .filter_map(|&child| self.export(child))
            .collect();
        Some((
            record.name.clone(),
            StockGroup {
                description: record.description.clone(),
                stocks: record.stocks.clone(),
                sub_groups,
            },
        ))
    }

    fn record(&self, id: GroupId) -> Option<&GroupRecord> {
        self.records.get(id).and_then(Option::as_ref)
    }

    fn record_mut(&mut self, id: GroupId) -> Option<&mut GroupRecord> {
        self.records.get_mut(id).and_then(Option::as_mut)
    }

    fn siblings(&self, parent: Option<GroupId>) -> &[GroupId] {
        match parent {
            None => &self.roots,
            Some(p) => self.record(p).map_or(&[][..], |r| r.children.as_slice()),
        }
    }

    fn siblings_mut(&mut self, parent: Option<GroupId>) -> Option<&mut Vec<GroupId>> {
        match parent {
            None => Some(&mut self.roots),
            Some(p) => self.record_mut(p).map(|r| &mut r.children),
        }
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Resolve a full path to its record. The root path resolves to nothing.
    #[must_use]
    pub fn resolve(&self, path: &GroupPath) -> Option<GroupId> {
        let mut current = None;
        for name in path.segments() {
            current = Some(self.child_named(current, name)?);
        }
        current
    }

    /// Direct child of `parent` (or top-level group when `None`) named `name`.
    #[must_use]
    pub fn child_named(&self, parent: Option<GroupId>, name: &str) -> Option<GroupId> {
        self.siblings(parent)
            .iter()
            .copied()
            .find(|&id| self.record(id).is_some_and(|r| r.name == name))
    }

    #[must_use]
    pub fn name(&self, id: GroupId) -> Option<&str> {
        self.record(id).map(|r| r.name.as_str())
    }

    #[must_use]
    pub fn parent(&self, id: GroupId) -> Option<GroupId> {
        self.record(id).and_then(|r| r.parent)
    }

    /// Current full path of a record, derived by walking parent links.
    #[must_use]
    pub fn path_of(&self, id: GroupId) -> GroupPath {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.record(cur) {
                Some(record) => {
                    names.push(record.name.as_str());
                    current = record.parent;
                }
                None => break,
            }
        }
        names.reverse();
        GroupPath::from_segments(names)
    }

    /// `true` if `ancestor` is `id` itself or one of its ancestors.
    #[must_use]
    pub fn is_same_or_ancestor(&self, ancestor: GroupId, id: GroupId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.parent(cur);
        }
        false
    }

    /// Position of `id` within its sibling list.
    #[must_use]
    pub fn sibling_index(&self, id: GroupId) -> Option<usize> {
        let parent = self.parent(id);
        self.siblings(parent).iter().position(|&s| s == id)
    }

    #[must_use]
    pub fn stocks(&self, id: GroupId) -> Option<&[String]> {
        self.record(id).map(|r| r.stocks.as_slice())
    }

    pub fn stocks_mut(&mut self, id: GroupId) -> Option<&mut Vec<String>> {
        self.record_mut(id).map(|r| &mut r.stocks)
    }

    // ── Relinking ───────────────────────────────────────────────────

    /// Append a new empty group under `parent`.
    pub fn insert(&mut self, parent: Option<GroupId>, name: &str, description: &str) -> GroupId {
        let id = self.records.len();
        self.records.push(Some(GroupRecord {
            name: name.to_string(),
            description: description.to_string(),
            stocks: Vec::new(),
            parent,
            children: Vec::new(),
        }));
        if let Some(siblings) = self.siblings_mut(parent) {
            siblings.push(id);
        }
        id
    }

    /// Top-level group named `name`, created at the end if absent.
    pub fn ensure_root(&mut self, name: &str) -> GroupId {
        match self.child_named(None, name) {
            Some(id) => id,
            None => self.insert(None, name, ""),
        }
    }

    pub fn rename(&mut self, id: GroupId, name: &str) {
        if let Some(record) = self.record_mut(id) {
            record.name = name.to_string();
        }
    }

    /// Unlink `id` from its sibling list; returns the index it occupied.
    pub fn detach(&mut self, id: GroupId) -> Option<usize> {
        let parent = self.parent(id);
        let siblings = self.siblings_mut(parent)?;
        let index = siblings.iter().position(|&s| s == id)?;
        siblings.remove(index);
        Some(index)
    }

    /// Link a detached `id` under `parent` at `index` (appended when `None`
    /// or past the end).
    pub fn attach(&mut self, id: GroupId, parent: Option<GroupId>, index: Option<usize>) {
        if let Some(siblings) = self.siblings_mut(parent) {
            let at = index.unwrap_or(siblings.len()).min(siblings.len());
            siblings.insert(at, id);
        }
        if let Some(record) = self.record_mut(id) {
            record.parent = parent;
        }
    }

    /// Remove a group and all its descendants. Returns their symbols, the
    /// group's own first, then each subgroup depth-first.
    pub fn remove_subtree(&mut self, id: GroupId) -> Vec<String> {
        self.detach(id);
        let mut symbols = Vec::new();
        self.drain(id, &mut symbols);
        symbols
    }

    fn drain(&mut self, id: GroupId, symbols: &mut Vec<String>) {
        let Some(record) = self.records.get_mut(id).and_then(Option::take) else {
            return;
        };
        symbols.extend(record.stocks);
        for child in record.children {
            self.drain(child, symbols);
        }
    }
}
