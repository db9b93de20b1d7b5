use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::WatchlistError;

/// Separator between short names in a group path.
pub const PATH_SEPARATOR: char = '/';

/// Key prefix for folder (group) nodes in the display tree.
pub const FOLDER_PREFIX: &str = "folder-";

/// Key prefix for stock (leaf) nodes in the display tree.
pub const STOCK_PREFIX: &str = "stock-";

/// A `/`-joined chain of short names identifying a group from the root,
/// e.g. `"Tech/Semis"`. The empty path is the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct GroupPath(String);

impl GroupPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The empty path, addressing the top level of the hierarchy.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Build a path from short names.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Short names from the top level down. Empty for the root path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of levels below the root (top-level groups have depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Path of the containing group, `None` for top-level groups and the root.
    #[must_use]
    pub fn parent(&self) -> Option<GroupPath> {
        parent_path(self)
    }

    /// Last short name, used as the display label.
    #[must_use]
    pub fn leaf_name(&self) -> &str {
        leaf_name(self)
    }

    /// Path of a direct child named `name`.
    #[must_use]
    pub fn join(&self, name: &str) -> GroupPath {
        if self.is_root() {
            GroupPath(name.to_string())
        } else {
            GroupPath(format!("{}{PATH_SEPARATOR}{name}", self.0))
        }
    }

    /// `true` if `self` is `other` or lies somewhere below it.
    #[must_use]
    pub fn starts_with(&self, other: &GroupPath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0
            || (self.0.starts_with(&other.0)
                && self.0[other.0.len()..].starts_with(PATH_SEPARATOR))
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GroupPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Typed identity of a display-tree node.
///
/// Decoded once from the tree widget's string key, then matched exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Folder(GroupPath),
    Stock(String),
}

impl NodeKey {
    pub fn folder(path: impl Into<GroupPath>) -> Self {
        NodeKey::Folder(path.into())
    }

    pub fn stock(symbol: impl Into<String>) -> Self {
        NodeKey::Stock(symbol.into())
    }

    #[must_use]
    pub fn is_stock(&self) -> bool {
        matches!(self, NodeKey::Stock(_))
    }

    #[must_use]
    pub fn as_stock(&self) -> Option<&str> {
        match self {
            NodeKey::Stock(symbol) => Some(symbol),
            NodeKey::Folder(_) => None,
        }
    }

    #[must_use]
    pub fn as_folder(&self) -> Option<&GroupPath> {
        match self {
            NodeKey::Folder(path) => Some(path),
            NodeKey::Stock(_) => None,
        }
    }

    /// Encode back to the widget's string form (`folder-<path>` / `stock-<symbol>`).
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Folder(path) => write!(f, "{FOLDER_PREFIX}{path}"),
            NodeKey::Stock(symbol) => write!(f, "{STOCK_PREFIX}{symbol}"),
        }
    }
}

impl std::str::FromStr for NodeKey {
    type Err = WatchlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_key(s)
    }
}

impl Serialize for NodeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode_key(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Addressing functions ────────────────────────────────────────────

/// Decode a widget key into a [`NodeKey`].
///
/// Fails with `MalformedKey` when the prefix is missing or the body is empty.
pub fn decode_key(key: &str) -> Result<NodeKey, WatchlistError> {
    if let Some(path) = key.strip_prefix(FOLDER_PREFIX) {
        if path.is_empty() {
            return Err(WatchlistError::MalformedKey(format!("'{key}' has an empty group path")));
        }
        return Ok(NodeKey::Folder(GroupPath::new(path)));
    }
    if let Some(symbol) = key.strip_prefix(STOCK_PREFIX) {
        if symbol.is_empty() {
            return Err(WatchlistError::MalformedKey(format!("'{key}' has an empty symbol")));
        }
        return Ok(NodeKey::Stock(symbol.to_string()));
    }
    Err(WatchlistError::MalformedKey(format!(
        "'{key}' must start with '{FOLDER_PREFIX}' or '{STOCK_PREFIX}'"
    )))
}

/// Path of the containing group: split on `/` and drop the last segment.
#[must_use]
pub fn parent_path(path: &GroupPath) -> Option<GroupPath> {
    let (parent, _) = path.as_str().rsplit_once(PATH_SEPARATOR)?;
    Some(GroupPath::new(parent))
}

/// Last `/`-delimited segment of a path.
#[must_use]
pub fn leaf_name(path: &GroupPath) -> &str {
    match path.as_str().rsplit_once(PATH_SEPARATOR) {
        Some((_, leaf)) => leaf,
        None => path.as_str(),
    }
}

/// Normalize a ticker for storage: trimmed and upper-cased.
#[must_use]
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_from_root_has_no_separator() {
        assert_eq!(GroupPath::root().join("Tech").as_str(), "Tech");
        assert_eq!(GroupPath::new("Tech").join("Semis").as_str(), "Tech/Semis");
    }

    #[test]
    fn starts_with_respects_segment_boundaries() {
        let semis = GroupPath::new("Tech/Semis");
        assert!(semis.starts_with(&GroupPath::new("Tech")));
        assert!(semis.starts_with(&semis));
        assert!(!GroupPath::new("Technology").starts_with(&GroupPath::new("Tech")));
        assert!(semis.starts_with(&GroupPath::root()));
    }
}
