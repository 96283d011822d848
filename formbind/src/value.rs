//! Nested field value trees.
//!
//! Form data, touched flags, and validation messages all share one shape:
//! a tree of maps and lists with typed leaves. [`FieldNode`] is that tree,
//! generic over the leaf type; [`FieldValue`] is the leaf type for data.

use std::collections::BTreeMap;

use formdom::FileHandle;
use serde::Serialize;

use crate::path::FieldPath;

/// A scalar form value.
///
/// `Empty` plays the role of "no value": an unchecked radio group, an
/// unparseable number input, an empty file picker.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    File(FileHandle),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(f: FileHandle) -> Self {
        FieldValue::File(f)
    }
}

/// A nested tree of field values.
///
/// Maps key on path segments; lists hold indexed slots for repeated
/// fields. The same tree shape carries data (`FieldValue` leaves), touched
/// flags (`bool` leaves), and validation messages (`Vec<String>` leaves).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldNode<L> {
    Leaf(L),
    List(Vec<FieldNode<L>>),
    Map(BTreeMap<String, FieldNode<L>>),
}

/// The data tree of a bound form.
pub type Data = FieldNode<FieldValue>;

/// Per-field interaction flags, shape-mirroring [`Data`].
pub type Touched = FieldNode<bool>;

/// Per-field validation messages, shape-mirroring [`Data`].
/// An empty message list means "no error".
pub type Errors = FieldNode<Vec<String>>;

impl<L> FieldNode<L> {
    /// An empty map node, the root of every tree.
    pub fn map() -> Self {
        FieldNode::Map(BTreeMap::new())
    }

    pub fn is_empty_map(&self) -> bool {
        matches!(self, FieldNode::Map(m) if m.is_empty())
    }

    /// Look up the node at `path`.
    pub fn get(&self, path: &FieldPath) -> Option<&FieldNode<L>> {
        let mut current = self;
        for segment in path.segments() {
            current = match current {
                FieldNode::Map(map) => map.get(segment)?,
                FieldNode::List(list) => {
                    let index: usize = segment.parse().ok()?;
                    list.get(index)?
                }
                FieldNode::Leaf(_) => return None,
            };
        }
        Some(current)
    }

    /// Whether any leaf satisfies `pred`.
    pub fn deep_some(&self, pred: &impl Fn(&L) -> bool) -> bool {
        match self {
            FieldNode::Leaf(leaf) => pred(leaf),
            FieldNode::List(list) => list.iter().any(|n| n.deep_some(pred)),
            FieldNode::Map(map) => map.values().any(|n| n.deep_some(pred)),
        }
    }

    /// Build a tree with the same shape, every leaf replaced by `value`.
    pub fn mirror<M: Clone>(&self, value: M) -> FieldNode<M> {
        match self {
            FieldNode::Leaf(_) => FieldNode::Leaf(value),
            FieldNode::List(list) => {
                FieldNode::List(list.iter().map(|n| n.mirror(value.clone())).collect())
            }
            FieldNode::Map(map) => FieldNode::Map(
                map.iter()
                    .map(|(k, n)| (k.clone(), n.mirror(value.clone())))
                    .collect(),
            ),
        }
    }
}

impl<L: Clone + Default> FieldNode<L> {
    /// Write `node` at `path`, creating intermediate containers.
    ///
    /// Numeric segments create lists (padded with default leaves), other
    /// segments create maps. An intermediate of the wrong shape is
    /// replaced.
    pub fn set(&mut self, path: &FieldPath, node: FieldNode<L>) {
        let segments = path.segments();
        if segments.is_empty() {
            *self = node;
            return;
        }
        let mut current = self;
        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            let index: Option<usize> = segment.parse().ok();

            if let Some(index) = index {
                if !matches!(current, FieldNode::List(_)) {
                    *current = FieldNode::List(Vec::new());
                }
                let FieldNode::List(list) = current else {
                    unreachable!()
                };
                while list.len() <= index {
                    list.push(FieldNode::Leaf(L::default()));
                }
                if last {
                    list[index] = node;
                    return;
                }
                current = &mut list[index];
            } else {
                if !matches!(current, FieldNode::Map(_)) {
                    *current = FieldNode::Map(BTreeMap::new());
                }
                let FieldNode::Map(map) = current else {
                    unreachable!()
                };
                if last {
                    map.insert(segment.clone(), node);
                    return;
                }
                current = map
                    .entry(segment.clone())
                    .or_insert_with(|| FieldNode::Map(BTreeMap::new()));
            }
        }
    }

    /// Write a leaf at `path`.
    pub fn set_leaf(&mut self, path: &FieldPath, leaf: L) {
        self.set(path, FieldNode::Leaf(leaf));
    }

    /// Remove the node at `path` entirely. Map keys are deleted; list
    /// slots are spliced out. Returns the removed node.
    pub fn unset(&mut self, path: &FieldPath) -> Option<FieldNode<L>> {
        let segments = path.segments();
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for segment in parents {
            current = match current {
                FieldNode::Map(map) => map.get_mut(segment)?,
                FieldNode::List(list) => {
                    let index: usize = segment.parse().ok()?;
                    list.get_mut(index)?
                }
                FieldNode::Leaf(_) => return None,
            };
        }
        match current {
            FieldNode::Map(map) => map.remove(last),
            FieldNode::List(list) => {
                let index: usize = last.parse().ok()?;
                if index < list.len() {
                    Some(list.remove(index))
                } else {
                    None
                }
            }
            FieldNode::Leaf(_) => None,
        }
    }

    /// Replace every leaf in the subtree at `path` with `value`.
    /// Creates a leaf when the path does not exist yet.
    pub fn set_all(&mut self, path: &FieldPath, value: L) {
        if self.get(path).is_some() {
            if let Some(node) = self.get_mut_existing(path) {
                node.fill_with(value);
            }
        } else {
            self.set_leaf(path, value);
        }
    }

    fn get_mut_existing(&mut self, path: &FieldPath) -> Option<&mut FieldNode<L>> {
        let mut current = self;
        for segment in path.segments() {
            current = match current {
                FieldNode::Map(map) => map.get_mut(segment)?,
                FieldNode::List(list) => {
                    let index: usize = segment.parse().ok()?;
                    list.get_mut(index)?
                }
                FieldNode::Leaf(_) => return None,
            };
        }
        Some(current)
    }

    /// Replace every leaf with `value`, preserving the shape.
    pub fn fill_with(&mut self, value: L) {
        match self {
            FieldNode::Leaf(leaf) => *leaf = value,
            FieldNode::List(list) => {
                for node in list {
                    node.fill_with(value.clone());
                }
            }
            FieldNode::Map(map) => {
                for node in map.values_mut() {
                    node.fill_with(value.clone());
                }
            }
        }
    }

    /// Add leaves and subtrees present in `defaults` but missing here.
    /// Existing values are never overwritten.
    pub fn fill_missing(&mut self, defaults: &FieldNode<L>) {
        match (self, defaults) {
            (FieldNode::Map(map), FieldNode::Map(default_map)) => {
                for (key, default_node) in default_map {
                    match map.get_mut(key) {
                        Some(node) => node.fill_missing(default_node),
                        None => {
                            map.insert(key.clone(), default_node.clone());
                        }
                    }
                }
            }
            (FieldNode::List(list), FieldNode::List(default_list)) => {
                for (i, default_node) in default_list.iter().enumerate() {
                    match list.get_mut(i) {
                        Some(node) => node.fill_missing(default_node),
                        None => list.push(default_node.clone()),
                    }
                }
            }
            // Shape mismatch or existing leaf: the current value wins.
            _ => {}
        }
    }

    /// Overwrite this tree with values from `other`, leaf by leaf.
    /// Maps recurse; leaves and lists from `other` replace wholesale.
    pub fn deep_assign(&mut self, other: &FieldNode<L>) {
        match (&mut *self, other) {
            (FieldNode::Map(map), FieldNode::Map(other_map)) => {
                for (key, other_node) in other_map {
                    match map.get_mut(key) {
                        Some(node) => node.deep_assign(other_node),
                        None => {
                            map.insert(key.clone(), other_node.clone());
                        }
                    }
                }
            }
            (slot, other) => *slot = other.clone(),
        }
    }
}

impl Data {
    /// Convert to a `serde_json::Value`. Files become `{name, size}`
    /// objects; `Empty` becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Build a data tree from a `serde_json::Value`. Objects become maps,
    /// arrays become lists, `null` becomes `Empty`. Files cannot round-trip
    /// through JSON and come back as plain objects.
    pub fn from_json(value: &serde_json::Value) -> Data {
        match value {
            serde_json::Value::Null => FieldNode::Leaf(FieldValue::Empty),
            serde_json::Value::Bool(b) => FieldNode::Leaf(FieldValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                FieldNode::Leaf(n.as_f64().map(FieldValue::Number).unwrap_or_default())
            }
            serde_json::Value::String(s) => FieldNode::Leaf(FieldValue::Text(s.clone())),
            serde_json::Value::Array(items) => {
                FieldNode::List(items.iter().map(Data::from_json).collect())
            }
            serde_json::Value::Object(map) => FieldNode::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Data::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<FieldValue> for Data {
    fn from(value: FieldValue) -> Self {
        FieldNode::Leaf(value)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        FieldNode::Leaf(FieldValue::from(s))
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        FieldNode::Leaf(FieldValue::from(s))
    }
}

impl From<f64> for Data {
    fn from(n: f64) -> Self {
        FieldNode::Leaf(FieldValue::from(n))
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        FieldNode::Leaf(FieldValue::from(b))
    }
}
