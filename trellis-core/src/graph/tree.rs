//! Tree View
//!
//! A read-only projection of the store that starts at the roots (nodes with
//! no dependencies) and links each node to the nodes that depend on it.
//!
//! The view owns clones of the nodes in an id-indexed arena. Tree nodes are
//! cursors into that arena, so `children` and `parents` are id lookups
//! rather than owning pointers, and nothing reachable from the view can
//! change the store it was built from.

use indexmap::{IndexMap, IndexSet};

use super::node::{Node, NodeId};

#[derive(Debug, Clone)]
struct TreeEntry {
    node: Node,
    /// Distinct declared dependencies, in declaration order.
    parents: Vec<NodeId>,
    /// Stored nodes declaring this node as a dependency, in store order.
    children: Vec<NodeId>,
}

/// Snapshot of the graph arranged from roots to dependents.
#[derive(Debug, Clone, Default)]
pub struct TreeView {
    roots: Vec<NodeId>,
    entries: IndexMap<NodeId, TreeEntry>,
}

impl TreeView {
    /// Build a view over a flattened node map.
    ///
    /// Dependencies that do not resolve inside `nodes` are left out of the
    /// links.
    pub fn from_nodes(nodes: &IndexMap<NodeId, Node>) -> Self {
        let mut entries: IndexMap<NodeId, TreeEntry> = nodes
            .iter()
            .map(|(id, node)| {
                let parents: IndexSet<NodeId> = node
                    .deps()
                    .iter()
                    .filter(|dep| nodes.contains_key(*dep))
                    .cloned()
                    .collect();
                let entry = TreeEntry {
                    node: node.clone(),
                    parents: parents.into_iter().collect(),
                    children: Vec::new(),
                };
                (id.clone(), entry)
            })
            .collect();

        let links: Vec<(NodeId, NodeId)> = entries
            .iter()
            .flat_map(|(id, entry)| {
                entry
                    .parents
                    .iter()
                    .map(move |parent| (parent.clone(), id.clone()))
            })
            .collect();
        for (parent, child) in links {
            if let Some(parent_entry) = entries.get_mut(&parent) {
                parent_entry.children.push(child);
            }
        }

        let roots = nodes
            .values()
            .filter(|node| node.is_root())
            .map(|node| node.id().clone())
            .collect();

        Self { roots, entries }
    }

    /// Iterate over the root nodes in store order.
    pub fn roots(&self) -> impl Iterator<Item = TreeNode<'_>> + '_ {
        self.roots.iter().filter_map(move |id| self.get(id.as_str()))
    }

    /// Get a root by id. Non-root nodes are not returned.
    pub fn root(&self, id: &str) -> Option<TreeNode<'_>> {
        self.get(id).filter(TreeNode::is_root)
    }

    /// Get any node by id, wherever it sits in the tree.
    pub fn get(&self, id: &str) -> Option<TreeNode<'_>> {
        self.entries
            .get(id)
            .map(|entry| TreeNode { view: self, entry })
    }

    /// Number of nodes in the view.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of the root nodes.
    pub fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }
}

/// A position in a [`TreeView`].
#[derive(Debug, Clone, Copy)]
pub struct TreeNode<'a> {
    view: &'a TreeView,
    entry: &'a TreeEntry,
}

impl<'a> TreeNode<'a> {
    pub fn id(&self) -> &'a NodeId {
        self.entry.node.id()
    }

    /// The node record this position holds.
    pub fn node(&self) -> &'a Node {
        &self.entry.node
    }

    /// Nodes that declare this node as a dependency.
    pub fn children(&self) -> impl Iterator<Item = TreeNode<'a>> + 'a {
        let view = self.view;
        self.entry
            .children
            .iter()
            .filter_map(move |id| view.get(id.as_str()))
    }

    /// Nodes this node declares as dependencies.
    pub fn parents(&self) -> impl Iterator<Item = TreeNode<'a>> + 'a {
        let view = self.view;
        self.entry
            .parents
            .iter()
            .filter_map(move |id| view.get(id.as_str()))
    }

    pub fn child(&self, id: &str) -> Option<TreeNode<'a>> {
        self.entry
            .children
            .iter()
            .find(|child| child.as_str() == id)
            .and_then(|child| self.view.get(child.as_str()))
    }

    pub fn parent(&self, id: &str) -> Option<TreeNode<'a>> {
        self.entry
            .parents
            .iter()
            .find(|parent| parent.as_str() == id)
            .and_then(|parent| self.view.get(parent.as_str()))
    }

    pub fn child_ids(&self) -> &'a [NodeId] {
        &self.entry.children
    }

    pub fn parent_ids(&self) -> &'a [NodeId] {
        &self.entry.parents
    }

    pub fn is_root(&self) -> bool {
        self.entry.node.is_root()
    }

    /// A leaf has no dependents.
    pub fn is_leaf(&self) -> bool {
        self.entry.children.is_empty()
    }
}
