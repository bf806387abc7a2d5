//! Change Events
//!
//! Every committed mutation is reported as a sequence of [`GraphEvent`]s.
//! The graph is the only producer; consumers attach to its [`EventBus`] in
//! one of two ways:
//!
//! - a callback listener, invoked synchronously and in emission order before
//!   the mutating call returns;
//! - a channel, which receives a clone of every event and can be drained
//!   from another thread or task.
//!
//! Events are only emitted while committing. A mutation that fails
//! validation emits nothing.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::graph::Node;

/// Why a node left the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalType {
    /// The node was named in a removal request, or superseded by a
    /// replacement.
    Direct,

    /// The node depended on a removed node and was removed with it.
    Prune,
}

/// A change committed to a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GraphEvent {
    NodeAdded {
        node: Node,
    },
    NodeRemoved {
        node: Node,
        #[serde(rename = "removalType")]
        removal: RemovalType,
    },
    NodeReplaced {
        #[serde(rename = "oldNode")]
        old: Node,
        #[serde(rename = "newNode")]
        new: Node,
    },
}

impl GraphEvent {
    /// The node the event is about. For replacements this is the new node.
    pub fn node(&self) -> &Node {
        match self {
            GraphEvent::NodeAdded { node } | GraphEvent::NodeRemoved { node, .. } => node,
            GraphEvent::NodeReplaced { new, .. } => new,
        }
    }

    /// Short name of the event kind, as used in the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            GraphEvent::NodeAdded { .. } => "node-added",
            GraphEvent::NodeRemoved { .. } => "node-removed",
            GraphEvent::NodeReplaced { .. } => "node-replaced",
        }
    }
}

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

struct Listener {
    id: ListenerId,
    callback: Box<dyn FnMut(&GraphEvent) + Send + Sync>,
}

/// Fan-out point for graph events.
///
/// Only the graph that owns a bus can emit on it. Outside the crate a bus
/// can be subscribed to but not fed:
///
/// ```compile_fail
/// use trellis_core::events::{EventBus, GraphEvent};
/// use trellis_core::graph::Node;
///
/// let mut bus = EventBus::new();
/// bus.emit(GraphEvent::NodeAdded { node: Node::new("ghost") });
/// ```
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    channels: Vec<UnboundedSender<GraphEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It runs for every event, in registration order
    /// relative to other listeners.
    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&GraphEvent) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        self.listeners.push(Listener {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Open a channel receiving every event emitted from now on.
    ///
    /// Dropping the receiver detaches it; the sender is discarded on the
    /// next emit.
    pub fn channel(&mut self) -> UnboundedReceiver<GraphEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.push(tx);
        rx
    }

    /// Number of attached listeners and open channels.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len() + self.channels.len()
    }

    /// Deliver an event to every listener, then every channel.
    pub(crate) fn emit(&mut self, event: GraphEvent) {
        tracing::trace!(kind = event.kind(), node = %event.node().id(), "emit");
        for listener in &mut self.listeners {
            (listener.callback)(&event);
        }
        self.channels.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("channels", &self.channels.len())
            .finish()
    }
}
