//! Mutation Engine
//!
//! [`Graph`] ties the store, the resolver and the event bus together. Every
//! mutation follows the same two phases:
//!
//! 1. Validate the request against the current contents without touching
//!    them. Failures are returned here and nothing else happens.
//! 2. Commit the validated plan to the store and report each change to the
//!    event bus in a fixed order.
//!
//! Mutations take `&mut self`, so no other call can observe the graph
//! between the two phases.

use indexmap::IndexMap;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use super::node::{Node, NodeId};
use super::resolver::resolve_order;
use super::store::NodeStore;
use super::tree::TreeView;
use crate::config::{DuplicateDeps, GraphOptions, UnknownReplacement};
use crate::error::{GraphError, Result};
use crate::events::{EventBus, GraphEvent, ListenerId, RemovalType};

/// A dependency-ordered set of nodes that is kept acyclic and free of
/// dangling dependencies.
///
/// # Example
///
/// ```rust
/// use trellis_core::graph::{Graph, Node};
///
/// let mut graph = Graph::new();
/// graph
///     .add_node([Node::new("bob")])?
///     .add_node([Node::new("boris").with_deps(["bob"])])?;
///
/// graph.remove_node(["bob"]);
/// assert!(graph.is_empty());
/// # Ok::<(), trellis_core::error::GraphError>(())
/// ```
///
/// Events come only from committed mutations; the bus is not handed out:
///
/// ```compile_fail
/// use trellis_core::graph::Graph;
///
/// let mut graph = Graph::new();
/// let _bus = graph.events();
/// ```
#[derive(Debug, Default)]
pub struct Graph {
    store: NodeStore,
    events: EventBus,
    options: GraphOptions,
}

impl Graph {
    /// Create an empty graph with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given options.
    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// The flattened id → node map.
    pub fn node_list(&self) -> &IndexMap<NodeId, Node> {
        self.store.as_map()
    }

    /// The tree view, rebuilt from the current contents.
    pub fn nodes(&self) -> TreeView {
        self.store.tree_view()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.store.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Copy of the flattened map that shares nothing with the graph.
    pub fn snapshot(&self) -> IndexMap<NodeId, Node> {
        self.store.snapshot()
    }

    /// Ids of stored nodes that declare `id` as a dependency.
    pub fn dependents(&self, id: &str) -> Vec<NodeId> {
        self.store.dependents(id).cloned().collect()
    }

    /// Register a listener invoked for every committed change.
    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&GraphEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Open a channel receiving every committed change.
    pub fn channel(&mut self) -> UnboundedReceiver<GraphEvent> {
        self.events.channel()
    }

    /// Add a batch of nodes.
    ///
    /// Dependencies may point at stored nodes or at other nodes in the batch.
    /// Nodes are stored in dependency order and a `node-added` event is
    /// emitted for each right after it is stored. An empty batch does
    /// nothing.
    ///
    /// Within a batch, a later node with the same id as an earlier one
    /// supersedes it. Adding under a stored id overwrites the stored node.
    pub fn add_node<I>(&mut self, nodes: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut candidates = self.batch(nodes);
        if candidates.is_empty() {
            return Ok(self);
        }

        let order = resolve_order(self.store.as_map(), &candidates)
            .map_err(|err| rejected("add", err))?;

        for id in &order {
            if let Some(node) = candidates.swap_remove(id) {
                self.store.put(node.clone());
                self.events.emit(GraphEvent::NodeAdded { node });
            }
        }

        debug!(added = order.len(), total = self.store.len(), "nodes added");
        Ok(self)
    }

    /// Remove nodes by id, together with everything that depends on them.
    ///
    /// For each requested id that is stored, its dependents are removed
    /// first, depth-first, each reported as `node-removed` with
    /// [`RemovalType::Prune`]. The requested node follows with
    /// [`RemovalType::Direct`]. Ids that are not stored are ignored.
    pub fn remove_node<I, T>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut removed = 0usize;
        for id in ids {
            let id = id.as_ref();
            if !self.store.contains(id) {
                tracing::trace!(node = id, "remove of absent node ignored");
                continue;
            }
            removed += self.prune(id);
        }

        if removed > 0 {
            debug!(removed, total = self.store.len(), "nodes removed");
        }
        self
    }

    /// Replace stored nodes with new records under the same ids.
    ///
    /// The whole graph as it would look afterwards is validated, so a
    /// replacement cannot leave a dangling dependency or close a cycle
    /// anywhere. On success the store changes in one step and three waves
    /// of events follow, each in input order: `node-removed` (direct) for
    /// every old node, `node-added` for every new node, then
    /// `node-replaced` for every pair.
    ///
    /// Ids that are not stored are handled according to
    /// [`GraphOptions::unknown_replacement`].
    pub fn replace_node<I>(&mut self, nodes: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Node>,
    {
        let replacements = self.batch(nodes);
        if replacements.is_empty() {
            return Ok(self);
        }

        if self.options.unknown_replacement == UnknownReplacement::Reject {
            if let Some(id) = replacements.keys().find(|id| !self.store.contains(id.as_str())) {
                return Err(rejected("replace", GraphError::UnknownNode { id: id.clone() }));
            }
        }

        let mut end_state = self.store.snapshot();
        for (id, node) in &replacements {
            end_state.insert(id.clone(), node.clone());
        }
        resolve_order(&IndexMap::new(), &end_state).map_err(|err| rejected("replace", err))?;

        let pairs: Vec<(Option<Node>, Node)> = replacements
            .into_values()
            .map(|node| (self.store.put(node.clone()), node))
            .collect();

        for old in pairs.iter().filter_map(|(old, _)| old.as_ref()) {
            self.events.emit(GraphEvent::NodeRemoved {
                node: old.clone(),
                removal: RemovalType::Direct,
            });
        }
        for (_, new) in &pairs {
            self.events.emit(GraphEvent::NodeAdded { node: new.clone() });
        }
        let mut replaced = 0usize;
        for (old, new) in pairs {
            if let Some(old) = old {
                replaced += 1;
                self.events.emit(GraphEvent::NodeReplaced { old, new });
            }
        }

        debug!(replaced, total = self.store.len(), "nodes replaced");
        Ok(self)
    }

    /// Collect a batch keyed by id, applying the duplicate dependency policy.
    fn batch<I>(&self, nodes: I) -> IndexMap<NodeId, Node>
    where
        I: IntoIterator<Item = Node>,
    {
        let dedup = self.options.duplicate_deps == DuplicateDeps::Dedup;
        nodes
            .into_iter()
            .map(|node| if dedup { node.dedup_deps() } else { node })
            .map(|node| (node.id().clone(), node))
            .collect()
    }

    /// Remove `root` after removing everything that depends on it.
    ///
    /// Walks dependents depth-first with an explicit stack. Each frame holds
    /// the dependents of its node as they were when the frame was pushed;
    /// entries already removed through another path are skipped.
    fn prune(&mut self, root: &str) -> usize {
        struct Frame {
            id: NodeId,
            dependents: Vec<NodeId>,
            next: usize,
        }

        let mut removed = 0usize;
        let mut stack = vec![Frame {
            id: NodeId::from(root),
            dependents: self.dependents(root),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(dependent) = frame.dependents.get(frame.next).cloned() {
                frame.next += 1;
                if self.store.contains(dependent.as_str()) {
                    let dependents = self.dependents(dependent.as_str());
                    stack.push(Frame {
                        id: dependent,
                        dependents,
                        next: 0,
                    });
                }
                continue;
            }

            let id = frame.id.clone();
            stack.pop();
            let removal = if stack.is_empty() {
                RemovalType::Direct
            } else {
                RemovalType::Prune
            };
            if let Some(node) = self.store.delete(id.as_str()) {
                removed += 1;
                self.events.emit(GraphEvent::NodeRemoved { node, removal });
            }
        }

        removed
    }
}

fn rejected(operation: &'static str, err: GraphError) -> GraphError {
    debug!(operation, node = %err.node_id(), error = %err, "mutation rejected");
    err
}
