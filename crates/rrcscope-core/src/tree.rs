//! # Value-notation tree
//!
//! [`TreeValue`] is the generic shape produced by the value-notation parser:
//! a string leaf, an insertion-ordered mapping, or a list.
//!
//! The input grammar does not distinguish objects from lists syntactically.
//! The parser emits mappings and a reclassification pass turns some of them
//! into lists (see `rrcscope_parser::asn1::reclassify`). That heuristic can
//! mis-classify adversarial input, e.g. an intentionally empty object inside
//! a structure is indistinguishable from a bare scalar list element.

use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A parsed value-notation node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValue {
    /// Scalar text, e.g. `171` or `'00101010'B`
    Leaf(String),

    /// Ordered `(key, value)` pairs with unique keys
    Mapping(Vec<(String, TreeValue)>),

    /// Ordered elements
    List(Vec<TreeValue>),
}

/// One step of a [`TreePath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a node inside a tree, from the root down
pub type TreePath = Vec<PathSegment>;

impl TreeValue {
    /// An empty mapping, the placeholder the parser creates for every key
    pub fn empty() -> Self {
        TreeValue::Mapping(Vec::new())
    }

    pub fn leaf(text: impl Into<String>) -> Self {
        TreeValue::Leaf(text.into())
    }

    /// `true` for a mapping without entries
    pub fn is_empty_mapping(&self) -> bool {
        matches!(self, TreeValue::Mapping(entries) if entries.is_empty())
    }

    /// Insert or replace `key`, keeping the position of an existing key
    ///
    /// No-op unless `self` is a mapping.
    pub fn insert(&mut self, key: impl Into<String>, value: TreeValue) {
        if let TreeValue::Mapping(entries) = self {
            let key = key.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Value of a direct child with exactly this key
    pub fn get(&self, key: &str) -> Option<&TreeValue> {
        match self {
            TreeValue::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Value of the first direct child whose key starts with `prefix`
    ///
    /// Signalling keys carry release suffixes (`physCellId-r10`), so lookups
    /// by stem are the common case.
    pub fn child_with_prefix(&self, prefix: &str) -> Option<&TreeValue> {
        match self {
            TreeValue::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k.starts_with(prefix))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Like [`child_with_prefix`](Self::child_with_prefix), but also reads a
    /// block that reclassification turned into a list
    ///
    /// A block with an empty `{ }` sibling becomes a list of single-entry
    /// mappings and bare-key leaves; its fields are the single-entry
    /// mappings.
    pub fn field(&self, prefix: &str) -> Option<&TreeValue> {
        match self {
            TreeValue::Mapping(_) => self.child_with_prefix(prefix),
            TreeValue::List(items) => items.iter().find_map(|item| match item {
                TreeValue::Mapping(entries) if entries.len() == 1 => {
                    let (key, value) = &entries[0];
                    key.starts_with(prefix).then_some(value)
                }
                _ => None,
            }),
            TreeValue::Leaf(_) => None,
        }
    }

    /// Whether this list is one reclassified block rather than a sequence
    /// of elements
    ///
    /// Only a reclassified block mixes bare-key leaves with single-entry
    /// mappings, so a list holding a leaf and a `prefix` field is read as
    /// one element.
    pub fn is_reclassified_block(&self, prefix: &str) -> bool {
        match self {
            TreeValue::List(items) => {
                items.iter().any(|item| matches!(item, TreeValue::Leaf(_)))
                    && self.field(prefix).is_some()
            }
            _ => false,
        }
    }

    /// Text of a leaf
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TreeValue::Leaf(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a leaf as a number (or anything else implementing `FromStr`)
    pub fn parse_leaf<T: FromStr>(&self) -> Option<T> {
        self.as_str().and_then(|s| s.trim().parse().ok())
    }

    /// First key of a mapping, the text of a leaf, or the first element's
    /// tag for a list
    ///
    /// Used to read CHOICE selections such as `handoverType intraLTE : {..}`.
    pub fn first_key(&self) -> Option<&str> {
        match self {
            TreeValue::Leaf(s) => Some(s),
            TreeValue::Mapping(entries) => entries.first().map(|(k, _)| k.as_str()),
            TreeValue::List(items) => items.first().and_then(|v| v.first_key()),
        }
    }

    /// Treat this node as a sequence: a list yields its elements, anything
    /// else yields itself once
    ///
    /// A single-element list collapses during reclassification, so callers
    /// iterating a SEQUENCE OF must accept both shapes.
    pub fn elements(&self) -> std::slice::Iter<'_, TreeValue> {
        match self {
            TreeValue::List(items) => items.iter(),
            other => std::slice::from_ref(other).iter(),
        }
    }

    /// Number of direct children (entries or elements); 0 for a leaf
    pub fn len(&self) -> usize {
        match self {
            TreeValue::Leaf(_) => 0,
            TreeValue::Mapping(entries) => entries.len(),
            TreeValue::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths to every mapping key containing `needle`, in pre-order
    ///
    /// Matching keys are also descended into, so nested matches are
    /// reported after their ancestor.
    pub fn find_keys(&self, needle: &str) -> Vec<TreePath> {
        let mut matches = Vec::new();
        let mut path = Vec::new();
        self.collect_keys(needle, &mut path, &mut matches);
        matches
    }

    fn collect_keys(&self, needle: &str, path: &mut TreePath, out: &mut Vec<TreePath>) {
        match self {
            TreeValue::Leaf(_) => {}
            TreeValue::Mapping(entries) => {
                for (key, value) in entries {
                    path.push(PathSegment::Key(key.clone()));
                    if key.contains(needle) {
                        out.push(path.clone());
                    }
                    value.collect_keys(needle, path, out);
                    path.pop();
                }
            }
            TreeValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    item.collect_keys(needle, path, out);
                    path.pop();
                }
            }
        }
    }

    /// Resolve a path produced by [`find_keys`](Self::find_keys)
    pub fn at(&self, path: &[PathSegment]) -> Option<&TreeValue> {
        path.iter().try_fold(self, |node, segment| match segment {
            PathSegment::Key(key) => node.get(key),
            PathSegment::Index(i) => match node {
                TreeValue::List(items) => items.get(*i),
                _ => None,
            },
        })
    }

    /// Values of every key containing `needle`, in pre-order
    pub fn find_values(&self, needle: &str) -> Vec<&TreeValue> {
        self.find_keys(needle)
            .iter()
            .filter_map(|path| self.at(path))
            .collect()
    }
}

impl Default for TreeValue {
    fn default() -> Self {
        TreeValue::empty()
    }
}

impl Serialize for TreeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeValue::Leaf(s) => serializer.serialize_str(s),
            TreeValue::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            TreeValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Render a path as `a -> b -> [0] -> c`
pub fn format_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
