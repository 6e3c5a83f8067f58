//! Identity-bearing schema nodes.
//!
//! During generation a schema body must be referable before it is complete
//! and the same body may be embedded in several places until finalization
//! decides its fate. Nodes therefore live in an arena and are addressed by
//! [`NodeId`]; entries may hold plain JSON or point at other nodes. Only
//! [`SchemaArena::materialize`] turns a node into a `serde_json::Value`.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::GenerateError;

/// Handle of a node inside a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Value stored under a node entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(Value),
    Node(NodeId),
    Array(Vec<Slot>),
    Object(IndexMap<String, Slot>),
}

impl Slot {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Slot::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Value(value)
    }
}

impl From<NodeId> for Slot {
    fn from(id: NodeId) -> Self {
        Slot::Node(id)
    }
}

impl From<&str> for Slot {
    fn from(s: &str) -> Self {
        Slot::Value(Value::String(s.to_string()))
    }
}

impl From<String> for Slot {
    fn from(s: String) -> Self {
        Slot::Value(Value::String(s))
    }
}

impl From<bool> for Slot {
    fn from(b: bool) -> Self {
        Slot::Value(Value::Bool(b))
    }
}

/// Storage for all nodes of one generation run.
#[derive(Debug, Default)]
pub struct SchemaArena {
    nodes: Vec<IndexMap<String, Slot>>,
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty node.
    pub fn create_node(&mut self) -> NodeId {
        self.nodes.push(IndexMap::new());
        NodeId(self.nodes.len() - 1)
    }

    /// Allocate a node holding the entries of a JSON object.
    ///
    /// Non-object values produce an empty node.
    pub fn node_from_value(&mut self, value: &Value) -> NodeId {
        let id = self.create_node();
        if let Value::Object(map) = value {
            for (key, entry) in map {
                self.insert(id, key.clone(), Slot::Value(entry.clone()));
            }
        }
        id
    }

    pub fn entries(&self, id: NodeId) -> &IndexMap<String, Slot> {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId, key: &str) -> Option<&Slot> {
        self.nodes[id.0].get(key)
    }

    pub fn contains_key(&self, id: NodeId, key: &str) -> bool {
        self.nodes[id.0].contains_key(key)
    }

    pub fn len(&self, id: NodeId) -> usize {
        self.nodes[id.0].len()
    }

    pub fn is_empty(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_empty()
    }

    /// Set an entry; existing keys keep their position.
    pub fn insert(&mut self, id: NodeId, key: impl Into<String>, slot: impl Into<Slot>) {
        self.nodes[id.0].insert(key.into(), slot.into());
    }

    pub fn remove(&mut self, id: NodeId, key: &str) -> Option<Slot> {
        self.nodes[id.0].shift_remove(key)
    }

    /// Remove and return every entry of a node.
    pub fn take_entries(&mut self, id: NodeId) -> IndexMap<String, Slot> {
        std::mem::take(&mut self.nodes[id.0])
    }

    /// Copy every entry of `source` into `target`, overwriting.
    pub fn set_all(&mut self, target: NodeId, source: NodeId) {
        if target == source {
            return;
        }
        let entries = self.nodes[source.0].clone();
        self.nodes[target.0].extend(entries);
    }

    /// Copy the entries of `source` that `target` does not have yet.
    pub fn merge_missing(&mut self, target: NodeId, source: NodeId) {
        if target == source {
            return;
        }
        let entries = self.nodes[source.0].clone();
        let node = &mut self.nodes[target.0];
        for (key, slot) in entries {
            node.entry(key).or_insert(slot);
        }
    }

    /// Shallow copy of a node under a new id.
    pub fn copy_node(&mut self, id: NodeId) -> NodeId {
        let entries = self.nodes[id.0].clone();
        self.nodes.push(entries);
        NodeId(self.nodes.len() - 1)
    }

    /// Whether the slot is a plain value or node equal to `expected`.
    pub fn slot_equals(&self, slot: &Slot, expected: &Value) -> bool {
        match self.slot_to_value(slot, &mut Vec::new()) {
            Ok(value) => &value == expected,
            Err(_) => false,
        }
    }

    /// Convert a node and everything it points at into JSON.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::CircularNode` if the node contains itself.
    pub fn materialize(&self, id: NodeId) -> Result<Value, GenerateError> {
        self.node_to_value(id, &mut Vec::new())
    }

    /// Convert a slot into JSON.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::CircularNode` if a node contains itself.
    pub fn materialize_slot(&self, slot: &Slot) -> Result<Value, GenerateError> {
        self.slot_to_value(slot, &mut Vec::new())
    }

    fn node_to_value(&self, id: NodeId, visiting: &mut Vec<NodeId>) -> Result<Value, GenerateError> {
        if visiting.contains(&id) {
            return Err(GenerateError::CircularNode);
        }
        visiting.push(id);
        let mut map = Map::new();
        for (key, slot) in &self.nodes[id.0] {
            map.insert(key.clone(), self.slot_to_value(slot, visiting)?);
        }
        visiting.pop();
        Ok(Value::Object(map))
    }

    fn slot_to_value(&self, slot: &Slot, visiting: &mut Vec<NodeId>) -> Result<Value, GenerateError> {
        match slot {
            Slot::Value(value) => Ok(value.clone()),
            Slot::Node(id) => self.node_to_value(*id, visiting),
            Slot::Array(items) => items
                .iter()
                .map(|item| self.slot_to_value(item, visiting))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Slot::Object(entries) => {
                let mut map = Map::new();
                for (key, entry) in entries {
                    map.insert(key.clone(), self.slot_to_value(entry, visiting)?);
                }
                Ok(Value::Object(map))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn materialize_follows_node_links() {
        let mut arena = SchemaArena::new();
        let item = arena.create_node();
        arena.insert(item, "type", "string");
        let root = arena.create_node();
        arena.insert(root, "type", "array");
        arena.insert(root, "items", item);
        arena.insert(root, "anyOf", Slot::Array(vec![Slot::Node(item), json!(true).into()]));

        assert_eq!(
            arena.materialize(root).unwrap(),
            json!({
                "type": "array",
                "items": { "type": "string" },
                "anyOf": [{ "type": "string" }, true]
            })
        );
    }

    #[test]
    fn shared_nodes_reflect_later_changes() {
        let mut arena = SchemaArena::new();
        let shared = arena.create_node();
        let root = arena.create_node();
        arena.insert(root, "a", shared);
        arena.insert(root, "b", shared);
        arena.insert(shared, "$ref", "#/$defs/A");

        let value = arena.materialize(root).unwrap();
        assert_eq!(value["a"], json!({ "$ref": "#/$defs/A" }));
        assert_eq!(value["a"], value["b"]);
    }

    #[test]
    fn cycles_are_reported() {
        let mut arena = SchemaArena::new();
        let a = arena.create_node();
        let b = arena.create_node();
        arena.insert(a, "next", b);
        arena.insert(b, "next", a);
        assert!(matches!(arena.materialize(a), Err(GenerateError::CircularNode)));
    }

    #[test]
    fn merge_missing_keeps_existing_entries() {
        let mut arena = SchemaArena::new();
        let target = arena.node_from_value(&json!({ "type": "string", "title": "kept" }));
        let source = arena.node_from_value(&json!({ "title": "ignored", "description": "added" }));
        arena.merge_missing(target, source);
        assert_eq!(
            arena.materialize(target).unwrap(),
            json!({ "type": "string", "title": "kept", "description": "added" })
        );

        arena.set_all(target, source);
        assert_eq!(arena.get(target, "title").and_then(Slot::as_str), Some("ignored"));
    }
}
