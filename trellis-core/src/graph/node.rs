//! Graph Nodes
//!
//! This module defines the node records stored in the graph and the
//! identifiers used to link them together.

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a node in the graph.
///
/// Ids are opaque strings chosen by the caller. They are unique within one
/// graph, and every link between nodes (declared dependencies, tree view
/// edges) is expressed as an id rather than a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Keys taken by [`Node`]'s own fields when serialized.
const RESERVED_KEYS: [&str; 2] = ["id", "deps"];

/// A node in the dependency graph.
///
/// Nodes are immutable snapshots. Changing a node means building a new record
/// with the same id and handing it to [`Graph::replace_node`].
///
/// Besides its id and dependency list a node carries an opaque payload of
/// JSON fields. When serialized the payload is flattened next to `id` and
/// `deps`, so `{"id": "bob", "mark": "new"}` is a node with one field.
///
/// [`Graph::replace_node`]: crate::graph::Graph::replace_node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// Nodes that must exist before this one, in declaration order.
    /// Repeats are allowed and carry no extra meaning.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    deps: Vec<NodeId>,

    /// Caller-owned fields.
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Node {
    /// Create a node without dependencies or payload.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            deps: Vec::new(),
            payload: Map::new(),
        }
    }

    /// Set the declared dependencies.
    pub fn with_deps<I, D>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<NodeId>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set a payload field, overwriting any previous value under `key`.
    ///
    /// `id` and `deps` name the node's own fields in the serialized form, so
    /// they cannot be payload keys. Setting either is ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            tracing::debug!(node = %self.id, key = %key, "reserved payload key ignored");
            return self;
        }
        self.payload.insert(key, value.into());
        self
    }

    /// Get the node's id.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Get the declared dependencies.
    pub fn deps(&self) -> &[NodeId] {
        &self.deps
    }

    /// Get a payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Get the whole payload.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// A root declares no dependencies.
    pub fn is_root(&self) -> bool {
        self.deps.is_empty()
    }

    /// Check whether `id` is among the declared dependencies.
    pub fn depends_on(&self, id: &str) -> bool {
        self.deps.iter().any(|dep| dep.as_str() == id)
    }

    /// Collapse repeated dependencies, keeping the first occurrence of each.
    pub(crate) fn dedup_deps(mut self) -> Self {
        if self.deps.len() > 1 {
            let unique: IndexSet<NodeId> = self.deps.drain(..).collect();
            self.deps = unique.into_iter().collect();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(NodeId::from("bob"), NodeId::new(String::from("bob")));
        assert_ne!(NodeId::from("bob"), NodeId::from("boris"));
        assert_eq!(NodeId::from("bob").to_string(), "bob");
    }

    #[test]
    fn builder_sets_deps_and_fields() {
        let node = Node::new("boris")
            .with_deps(["bob"])
            .with_field("mark", "original");

        assert_eq!(node.id().as_str(), "boris");
        assert_eq!(node.deps(), &[NodeId::from("bob")]);
        assert_eq!(node.field("mark"), Some(&json!("original")));
        assert!(node.depends_on("bob"));
        assert!(!node.is_root());
    }

    #[test]
    fn payload_is_flattened_when_serialized() {
        let node = Node::new("bob").with_field("mark", "new");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value, json!({ "id": "bob", "mark": "new" }));

        let parsed: Node =
            serde_json::from_value(json!({ "id": "boris", "deps": ["bob"], "age": 3 })).unwrap();
        assert_eq!(parsed.deps(), &[NodeId::from("bob")]);
        assert_eq!(parsed.field("age"), Some(&json!(3)));
        assert!(parsed.field("deps").is_none());
    }

    #[test]
    fn reserved_keys_stay_out_of_payload() {
        let node = Node::new("a")
            .with_deps(["x"])
            .with_field("id", "b")
            .with_field("deps", json!(["y"]))
            .with_field("mark", 1);

        assert!(node.field("id").is_none());
        assert!(node.field("deps").is_none());
        assert_eq!(node.payload().len(), 1);

        let parsed: Node = serde_json::from_value(serde_json::to_value(&node).unwrap()).unwrap();
        assert_eq!(parsed, node);
        assert_eq!(parsed.id().as_str(), "a");
        assert_eq!(parsed.deps(), &[NodeId::from("x")]);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let node = Node::new("c").with_deps(["b", "a", "b", "a"]).dedup_deps();
        assert_eq!(node.deps(), &[NodeId::from("b"), NodeId::from("a")]);
    }
}
