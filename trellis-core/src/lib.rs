//! Trellis Core
//!
//! This crate maintains an in-memory directed acyclic graph of nodes that
//! declare their dependencies by id, and changes it transactionally.
//! It implements:
//!
//! - Dependency resolution with missing-dependency and cycle detection
//! - All-or-nothing add, remove and replace operations
//! - Cascade removal of dependents ("pruning")
//! - Change events delivered to callbacks or channels
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Node model, resolver, store, tree view and the mutation engine
//! - `events`: Change events and the bus that fans them out
//! - `config`: Per-graph policies
//! - `sync`: Thread-safe handle around a graph
//! - `error`: Validation errors
//!
//! # Example
//!
//! ```rust
//! use trellis_core::events::{GraphEvent, RemovalType};
//! use trellis_core::graph::{Graph, Node};
//!
//! let mut graph = Graph::new();
//! let mut events = graph.channel();
//!
//! graph.add_node([Node::new("bob")])?;
//! graph.add_node([Node::new("boris").with_deps(["bob"])])?;
//!
//! // Removing bob takes boris with it.
//! graph.remove_node(["bob"]);
//! assert!(graph.is_empty());
//!
//! let mut removals = Vec::new();
//! while let Ok(event) = events.try_recv() {
//!     if let GraphEvent::NodeRemoved { node, removal } = event {
//!         removals.push((node.id().to_string(), removal));
//!     }
//! }
//! assert_eq!(
//!     removals,
//!     vec![
//!         ("boris".to_string(), RemovalType::Prune),
//!         ("bob".to_string(), RemovalType::Direct),
//!     ]
//! );
//! # Ok::<(), trellis_core::error::GraphError>(())
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod sync;

pub mod prelude {
    pub use crate::config::{DuplicateDeps, GraphOptions, UnknownReplacement};
    pub use crate::error::GraphError;
    pub use crate::events::{EventBus, GraphEvent, ListenerId, RemovalType};
    pub use crate::graph::{Graph, Node, NodeId, TreeNode, TreeView};
    pub use crate::sync::SharedGraph;
}
