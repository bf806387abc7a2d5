//! Shared Graph
//!
//! [`Graph`] is built for single-threaded use. [`SharedGraph`] is a cloneable
//! handle for sharing one graph between threads: mutations hold the write
//! lock for the whole validate, commit and notify sequence, and reads hold
//! the read lock just long enough to copy what they return.
//!
//! Listeners run while the write lock is held. A listener must not call back
//! into the same `SharedGraph`; consumers that need to do so should use
//! [`SharedGraph::channel`] instead.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::GraphOptions;
use crate::error::Result;
use crate::events::{GraphEvent, ListenerId};
use crate::graph::{Graph, Node, NodeId, TreeView};

/// Thread-safe handle to a [`Graph`].
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<Graph>>,
}

impl SharedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self::from_graph(Graph::with_options(options))
    }

    /// Wrap an existing graph, keeping its contents and listeners.
    pub fn from_graph(graph: Graph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// See [`Graph::add_node`].
    pub fn add_node<I>(&self, nodes: I) -> Result<&Self>
    where
        I: IntoIterator<Item = Node>,
    {
        self.inner.write().add_node(nodes)?;
        Ok(self)
    }

    /// See [`Graph::remove_node`].
    pub fn remove_node<I, T>(&self, ids: I) -> &Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.inner.write().remove_node(ids);
        self
    }

    /// See [`Graph::replace_node`].
    pub fn replace_node<I>(&self, nodes: I) -> Result<&Self>
    where
        I: IntoIterator<Item = Node>,
    {
        self.inner.write().replace_node(nodes)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<Node> {
        self.inner.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copy of the flattened map.
    pub fn snapshot(&self) -> IndexMap<NodeId, Node> {
        self.inner.read().snapshot()
    }

    /// The tree view of the current contents.
    pub fn tree_view(&self) -> TreeView {
        self.inner.read().nodes()
    }

    /// Run `f` against a consistent view of the graph.
    pub fn read<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn subscribe<F>(&self, callback: F) -> ListenerId
    where
        F: FnMut(&GraphEvent) + Send + Sync + 'static,
    {
        self.inner.write().subscribe(callback)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.write().unsubscribe(id)
    }

    pub fn channel(&self) -> UnboundedReceiver<GraphEvent> {
        self.inner.write().channel()
    }
}
