//! Node Store
//!
//! The store is the authoritative id → node table. Next to it we keep a
//! reverse index from every dependency id to the stored nodes declaring it,
//! so cascade removal can find dependents without scanning the whole table.
//!
//! The store itself does not validate anything. Keeping it free of dangling
//! dependencies and cycles is the job of [`Graph`](super::Graph), which only
//! calls [`NodeStore::put`] with batches the resolver has accepted.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use super::node::{Node, NodeId};
use super::tree::TreeView;

/// All nodes of a graph, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    /// Stored nodes in insertion order.
    nodes: IndexMap<NodeId, Node>,

    /// Reverse edges: dependency id → ids of stored nodes declaring it.
    dependents: HashMap<NodeId, IndexSet<NodeId>>,
}

impl NodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a stored node.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over stored nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Borrow the flattened id → node map.
    pub fn as_map(&self) -> &IndexMap<NodeId, Node> {
        &self.nodes
    }

    /// Copy the flattened map. The copy shares nothing with the store.
    pub fn snapshot(&self) -> IndexMap<NodeId, Node> {
        self.nodes.clone()
    }

    /// Insert a node, replacing any node stored under the same id.
    ///
    /// A replaced node keeps its position in the insertion order. Returns the
    /// node that was replaced.
    pub fn put(&mut self, node: Node) -> Option<Node> {
        let id = node.id().clone();
        self.link(&node);
        let previous = self.nodes.insert(id, node);
        if let Some(old) = &previous {
            self.unlink_stale(old);
        }
        previous
    }

    /// Remove a node by id. Absent ids are ignored.
    pub fn delete(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.shift_remove(id)?;
        self.unlink(&node);
        Some(node)
    }

    /// Ids of stored nodes that declare `id` as a dependency.
    pub fn dependents(&self, id: &str) -> impl Iterator<Item = &NodeId> {
        self.dependents.get(id).into_iter().flatten()
    }

    /// Build a fresh tree view of the current contents.
    pub fn tree_view(&self) -> TreeView {
        TreeView::from_nodes(&self.nodes)
    }

    fn link(&mut self, node: &Node) {
        for dep in node.deps() {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .insert(node.id().clone());
        }
    }

    fn unlink(&mut self, node: &Node) {
        for dep in node.deps() {
            self.drop_edge(dep, node.id());
        }
    }

    /// Drop reverse edges of a replaced record that its successor no longer
    /// declares.
    fn unlink_stale(&mut self, old: &Node) {
        let Some(current) = self.nodes.get(old.id().as_str()) else {
            return;
        };
        let stale: Vec<NodeId> = old
            .deps()
            .iter()
            .filter(|dep| !current.depends_on(dep.as_str()))
            .cloned()
            .collect();
        for dep in stale {
            self.drop_edge(&dep, old.id());
        }
    }

    fn drop_edge(&mut self, dep: &NodeId, dependent: &NodeId) {
        if let Some(set) = self.dependents.get_mut(dep) {
            set.shift_remove(dependent);
            if set.is_empty() {
                self.dependents.remove(dep);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(iter: impl Iterator<Item = &'a NodeId>) -> Vec<&'a str> {
        iter.map(NodeId::as_str).collect()
    }

    #[test]
    fn put_get_delete() {
        let mut store = NodeStore::new();
        assert!(store.put(Node::new("bob")).is_none());
        assert!(store.contains("bob"));
        assert_eq!(store.len(), 1);

        let removed = store.delete("bob").unwrap();
        assert_eq!(removed.id().as_str(), "bob");
        assert!(store.is_empty());
    }

    #[test]
    fn delete_absent_is_noop() {
        let mut store = NodeStore::new();
        store.put(Node::new("bob"));
        assert!(store.delete("alice").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_overwrites_in_place() {
        let mut store = NodeStore::new();
        store.put(Node::new("a"));
        store.put(Node::new("b"));
        let old = store.put(Node::new("a").with_field("mark", "new")).unwrap();

        assert!(old.field("mark").is_none());
        let order: Vec<&str> = store.iter().map(|n| n.id().as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(store.get("a").unwrap().field("mark").unwrap(), "new");
    }

    #[test]
    fn dependents_follow_puts_and_deletes() {
        let mut store = NodeStore::new();
        store.put(Node::new("a"));
        store.put(Node::new("b"));
        store.put(Node::new("c").with_deps(["a"]));
        store.put(Node::new("d").with_deps(["a", "b"]));
        assert_eq!(ids(store.dependents("a")), vec!["c", "d"]);

        // c switches from a to b
        store.put(Node::new("c").with_deps(["b"]));
        assert_eq!(ids(store.dependents("a")), vec!["d"]);
        assert_eq!(ids(store.dependents("b")), vec!["d", "c"]);

        store.delete("d");
        assert_eq!(store.dependents("a").count(), 0);
        assert_eq!(ids(store.dependents("b")), vec!["c"]);
    }

    #[test]
    fn overwrite_keeping_a_dependency_keeps_its_edge() {
        let mut store = NodeStore::new();
        store.put(Node::new("a"));
        store.put(Node::new("b").with_deps(["a"]));
        store.put(Node::new("b").with_deps(["a"]).with_field("v", 2));
        assert_eq!(ids(store.dependents("a")), vec!["b"]);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut store = NodeStore::new();
        store.put(Node::new("a"));
        let mut copy = store.snapshot();
        copy.clear();
        assert!(store.contains("a"));

        store.delete("a");
        assert!(copy.is_empty());
    }
}
