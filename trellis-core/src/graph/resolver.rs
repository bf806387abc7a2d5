//! Dependency Resolver
//!
//! The resolver decides whether a batch of candidate nodes can be committed
//! next to the nodes already stored, and in which order.
//!
//! # Algorithm
//!
//! A depth-first walk over the union of candidates and stored nodes:
//!
//! 1. Every candidate is started in input order, unless an earlier walk
//!    already reached it.
//! 2. Entering a node marks it in progress and checks that each declared
//!    dependency resolves, first among the candidates and then among the
//!    stored nodes.
//! 3. Dependencies are walked in declaration order. Reaching a node that is
//!    still in progress means the batch would close a cycle.
//! 4. Once all dependencies are done the node is done, and if it is a
//!    candidate it is appended to the output.
//!
//! Stored nodes take part in the walk but never appear in the output. The
//! store is acyclic, so any cycle found runs through at least one candidate.
//!
//! The walk keeps an explicit stack instead of recursing, so long dependency
//! chains cannot exhaust the call stack.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use super::node::{Node, NodeId};
use crate::error::{GraphError, Result};

/// Traversal state of a node that has been entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// A node on the walk stack together with the index of the next dependency
/// to visit.
struct Frame<'a> {
    node: &'a Node,
    next: usize,
}

/// Resolves candidate batches against a fixed set of stored nodes.
pub struct Resolver<'a> {
    existing: &'a IndexMap<NodeId, Node>,
    candidates: &'a IndexMap<NodeId, Node>,
}

impl<'a> Resolver<'a> {
    pub fn new(existing: &'a IndexMap<NodeId, Node>, candidates: &'a IndexMap<NodeId, Node>) -> Self {
        Self {
            existing,
            candidates,
        }
    }

    /// Order the candidates so that every node comes after its dependencies.
    ///
    /// Returns the candidate ids only. Fails with
    /// [`GraphError::MissingDependency`] or [`GraphError::CyclicalDependency`]
    /// without touching anything.
    pub fn resolve(&self) -> Result<Vec<NodeId>> {
        let mut marks: HashMap<&'a str, Mark> =
            HashMap::with_capacity(self.candidates.len());
        let mut order = Vec::with_capacity(self.candidates.len());
        let mut stack: SmallVec<[Frame<'a>; 16]> = SmallVec::new();

        for start in self.candidates.values() {
            if marks.contains_key(start.id().as_str()) {
                continue;
            }
            self.enter(start, &mut marks, &mut stack)?;

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                match node.deps().get(frame.next) {
                    Some(dep_id) => {
                        frame.next += 1;
                        match marks.get(dep_id.as_str()) {
                            Some(Mark::Done) => {}
                            Some(Mark::InProgress) => {
                                return Err(GraphError::CyclicalDependency { id: dep_id.clone() });
                            }
                            None => {
                                let dep = self.lookup(dep_id).ok_or_else(|| self.missing(node))?;
                                self.enter(dep, &mut marks, &mut stack)?;
                            }
                        }
                    }
                    None => {
                        stack.pop();
                        marks.insert(node.id().as_str(), Mark::Done);
                        if self.candidates.contains_key(node.id()) {
                            tracing::trace!(node = %node.id(), position = order.len(), "resolved");
                            order.push(node.id().clone());
                        }
                    }
                }
            }
        }

        Ok(order)
    }

    fn enter(
        &self,
        node: &'a Node,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut SmallVec<[Frame<'a>; 16]>,
    ) -> Result<()> {
        if node.deps().iter().any(|dep| self.lookup(dep).is_none()) {
            return Err(self.missing(node));
        }
        marks.insert(node.id().as_str(), Mark::InProgress);
        stack.push(Frame { node, next: 0 });
        Ok(())
    }

    /// Candidates shadow stored nodes with the same id.
    fn lookup(&self, id: &NodeId) -> Option<&'a Node> {
        self.candidates.get(id).or_else(|| self.existing.get(id))
    }

    fn missing(&self, node: &Node) -> GraphError {
        let missing: IndexSet<NodeId> = node
            .deps()
            .iter()
            .filter(|dep| self.lookup(dep).is_none())
            .cloned()
            .collect();
        GraphError::MissingDependency {
            id: node.id().clone(),
            deps: node.deps().to_vec(),
            missing: missing.into_iter().collect(),
        }
    }
}

/// Convenience wrapper around [`Resolver::resolve`].
pub fn resolve_order(
    existing: &IndexMap<NodeId, Node>,
    candidates: &IndexMap<NodeId, Node>,
) -> Result<Vec<NodeId>> {
    Resolver::new(existing, candidates).resolve()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(nodes: Vec<Node>) -> IndexMap<NodeId, Node> {
        nodes.into_iter().map(|n| (n.id().clone(), n)).collect()
    }

    fn ids(order: &[NodeId]) -> Vec<&str> {
        order.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let candidates = map(vec![
            Node::new("c").with_deps(["b"]),
            Node::new("b").with_deps(["a"]),
            Node::new("a"),
        ]);
        let order = resolve_order(&IndexMap::new(), &candidates).unwrap();
        assert_eq!(ids(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn independent_candidates_keep_input_order() {
        let candidates = map(vec![Node::new("x"), Node::new("y"), Node::new("z")]);
        let order = resolve_order(&IndexMap::new(), &candidates).unwrap();
        assert_eq!(ids(&order), vec!["x", "y", "z"]);
    }

    #[test]
    fn existing_nodes_are_walked_but_not_emitted() {
        let existing = map(vec![Node::new("bob")]);
        let candidates = map(vec![Node::new("boris").with_deps(["bob"])]);
        let order = resolve_order(&existing, &candidates).unwrap();
        assert_eq!(ids(&order), vec!["boris"]);
    }

    #[test]
    fn diamond_emits_each_node_once() {
        let candidates = map(vec![
            Node::new("d").with_deps(["b", "c"]),
            Node::new("b").with_deps(["a"]),
            Node::new("c").with_deps(["a"]),
            Node::new("a"),
        ]);
        let order = resolve_order(&IndexMap::new(), &candidates).unwrap();
        assert_eq!(ids(&order), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn repeated_dependency_is_redundant() {
        let candidates = map(vec![Node::new("b").with_deps(["a", "a"]), Node::new("a")]);
        let order = resolve_order(&IndexMap::new(), &candidates).unwrap();
        assert_eq!(ids(&order), vec!["a", "b"]);
    }

    #[test]
    fn missing_dependency_reports_full_and_absent_lists() {
        let existing = map(vec![Node::new("alice")]);
        let candidates = map(vec![Node::new("boris").with_deps(["alice", "bob", "bob"])]);
        let err = resolve_order(&existing, &candidates).unwrap_err();
        assert_eq!(
            err,
            GraphError::MissingDependency {
                id: "boris".into(),
                deps: vec!["alice".into(), "bob".into(), "bob".into()],
                missing: vec!["bob".into()],
            }
        );
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let candidates = map(vec![Node::new("a").with_deps(["b"]), Node::new("b").with_deps(["a"])]);
        let err = resolve_order(&IndexMap::new(), &candidates).unwrap_err();
        assert_eq!(err, GraphError::CyclicalDependency { id: "a".into() });
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let candidates = map(vec![Node::new("a").with_deps(["a"])]);
        let err = resolve_order(&IndexMap::new(), &candidates).unwrap_err();
        assert_eq!(err, GraphError::CyclicalDependency { id: "a".into() });
    }

    #[test]
    fn cycle_through_stored_node_is_rejected() {
        // Stored b depends on a; the candidate a now wants b.
        let existing = map(vec![Node::new("a"), Node::new("b").with_deps(["a"])]);
        let candidates = map(vec![Node::new("a").with_deps(["b"])]);
        let err = resolve_order(&existing, &candidates).unwrap_err();
        assert!(matches!(err, GraphError::CyclicalDependency { .. }));
    }

    #[test]
    fn long_chains_do_not_recurse() {
        let nodes: Vec<Node> = (0..20_000)
            .map(|i| {
                let node = Node::new(format!("n{i}"));
                if i == 0 {
                    node
                } else {
                    node.with_deps([format!("n{}", i - 1)])
                }
            })
            .rev()
            .collect();
        let candidates = map(nodes);
        let order = resolve_order(&IndexMap::new(), &candidates).unwrap();
        assert_eq!(order.len(), 20_000);
        assert_eq!(order[0].as_str(), "n0");
        assert_eq!(order[19_999].as_str(), "n19999");
    }
}
