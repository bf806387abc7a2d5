//! Dependency Graph
//!
//! This module implements the node graph and the transactional operations
//! that change it.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are caller-supplied records identified by a string id
//! - Each node declares the ids it depends on; an edge runs from the
//!   dependency to the dependent
//!
//! Two invariants hold between any two calls: every declared dependency is
//! stored, and no node can reach itself by following dependencies.
//!
//! # Design Decisions
//!
//! 1. Links between nodes are ids into a single owned table, never
//!    references, so there are no ownership cycles to manage.
//!
//! 2. The store keeps a reverse (dependents) index next to the forward
//!    edges every node declares, so cascade removal does not scan.
//!
//! 3. Validation never writes. Each mutation is checked in full against the
//!    current contents and only then committed, so a failed call changes
//!    nothing.

mod engine;
mod node;
mod resolver;
mod store;
mod tree;

pub use engine::Graph;
pub use node::{Node, NodeId};
pub use resolver::{resolve_order, Resolver};
pub use store::NodeStore;
pub use tree::{TreeNode, TreeView};
