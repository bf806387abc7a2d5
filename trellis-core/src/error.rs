//! Error types for trellis-core.

use thiserror::Error;

use crate::graph::NodeId;

/// Result type for trellis-core operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while validating a mutation.
///
/// Every variant is produced before anything is committed, so a graph that
/// returned one of these is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A node declares dependencies that are neither stored nor part of the
    /// same batch.
    #[error("node {id} depends on missing node(s) {} (declared: {})", join(.missing), join(.deps))]
    MissingDependency {
        id: NodeId,
        /// Every dependency the node declares.
        deps: Vec<NodeId>,
        /// The declared dependencies that could not be found.
        missing: Vec<NodeId>,
    },

    /// A node was reached again while its own dependencies were still being
    /// walked.
    #[error("cyclical dependency detected at node {id}")]
    CyclicalDependency { id: NodeId },

    /// A replacement targets an id that is not stored.
    #[error("cannot replace unknown node {id}")]
    UnknownNode { id: NodeId },
}

impl GraphError {
    /// The id of the node the error is about.
    pub fn node_id(&self) -> &NodeId {
        match self {
            GraphError::MissingDependency { id, .. }
            | GraphError::CyclicalDependency { id }
            | GraphError::UnknownNode { id } => id,
        }
    }
}

fn join(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
