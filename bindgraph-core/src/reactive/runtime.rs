//! Binding Runtime
//!
//! The runtime is the central coordinator that connects properties through
//! the dependency graph.
//!
//! # How It Works
//!
//! 1. When a property is created, it registers with the runtime and gets a
//!    [`NodeId`].
//!
//! 2. When a binding reads a property, the runtime records the edge between
//!    the property and the node currently evaluating.
//!
//! 3. When a property changes, the runtime:
//!    a. Copies the property's subscriber set
//!    b. Re-evaluates every subscriber in the copy, in read order
//!    c. Each subscriber re-runs its binding, re-registering what it reads,
//!       and propagates to its own subscribers
//!
//! Propagation is eager and synchronous. Nothing is deferred or batched.
//!
//! # Thread Safety
//!
//! The evaluation slot and the configuration are thread-local. The graph is
//! a single process-wide arena behind a mutex, so edge updates from different
//! threads cannot race. Bindings, hooks, and accessor callbacks are never
//! invoked while that mutex is held.

use std::cell::RefCell;
use std::sync::{OnceLock, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::context::{EvaluationScope, EvaluationStack};
use crate::config::GraphConfig;
use crate::error::BindingError;
use crate::graph::{Graph, NodeEntry, NodeId, NodeKind};

/// A node the runtime can re-evaluate during propagation.
pub(crate) trait Evaluate: Send + Sync {
    /// Get the node ID of this evaluator.
    fn node_id(&self) -> NodeId;

    /// Re-run the node's binding, if any, then propagate to subscribers.
    fn evaluate(&self) -> Result<(), BindingError>;
}

/// Handle to a registered node.
///
/// Dropping this handle unregisters the node and removes all of its edges.
#[derive(Debug)]
pub(crate) struct NodeHandle {
    node_id: NodeId,
}

impl NodeHandle {
    pub(crate) fn id(&self) -> NodeId {
        self.node_id
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.node_id);
    }
}

/// The global binding runtime.
///
/// Edges are maintained by the nodes themselves as their bindings run.
/// Callers can configure the runtime and inspect the graph, but never edit
/// it:
///
/// ```compile_fail
/// use bindgraph_core::reactive::{Property, Runtime};
///
/// let derived = Property::with_binding(|| 1);
/// Runtime::clear_dependencies(derived.id());
/// ```
///
/// Only a [`PropertyWrapper`](super::PropertyWrapper) can be told to
/// propagate without changing:
///
/// ```compile_fail
/// use bindgraph_core::reactive::{Property, Runtime};
///
/// let plain = Property::new(1);
/// Runtime::notify(plain.id()).unwrap();
/// ```
pub struct Runtime;

static GRAPH: OnceLock<Mutex<Graph>> = OnceLock::new();

thread_local! {
    static CONFIG: RefCell<GraphConfig> = RefCell::new(GraphConfig::default());
}

fn graph() -> &'static Mutex<Graph> {
    GRAPH.get_or_init(|| Mutex::new(Graph::new()))
}

impl Runtime {
    /// Register a node with the runtime.
    ///
    /// Returns a handle that unregisters the node when dropped.
    pub(crate) fn register(kind: NodeKind, target: Weak<dyn Evaluate>) -> NodeHandle {
        let node_id = NodeId::new();
        graph().lock().insert(node_id, NodeEntry::new(kind, target));
        debug!(node = %node_id, ?kind, "registered node");
        NodeHandle { node_id }
    }

    /// Unregister a node, detaching it from both sides of every edge.
    fn unregister(node_id: NodeId) {
        let removed = graph().lock().remove(node_id);
        if let Some(entry) = removed {
            debug!(node = %node_id, kind = ?entry.kind(), "unregistered node");
        }
    }

    /// Record that the current evaluator read `node_id`.
    ///
    /// Called by every read. Does nothing outside a binding, and never
    /// records a node as depending on itself.
    pub(crate) fn accessed(node_id: NodeId) {
        let Some(current) = EvaluationScope::current() else {
            return;
        };
        if current == node_id {
            return;
        }

        if graph().lock().add_edge(node_id, current) {
            trace!(dependency = %node_id, subscriber = %current, "recorded dependency");
        }
    }

    /// Remove all edges from `node_id` to the nodes it depends on.
    ///
    /// Called before re-running a binding so stale dependencies are dropped.
    pub(crate) fn clear_dependencies(node_id: NodeId) {
        graph().lock().clear_dependencies(node_id);
    }

    /// Re-evaluate every subscriber of `node_id`.
    ///
    /// The subscriber set is copied first; re-evaluating one subscriber may
    /// add or remove edges anywhere in the graph. Stops at the first error.
    pub(crate) fn notify(node_id: NodeId) -> Result<(), BindingError> {
        let subscribers = graph().lock().subscribers(node_id);
        if subscribers.is_empty() {
            return Ok(());
        }

        trace!(node = %node_id, count = subscribers.len(), "propagating change");

        for (subscriber_id, target) in subscribers {
            // Dropped since the snapshot was taken.
            let Some(subscriber) = target.upgrade() else {
                trace!(node = %subscriber_id, "skipping dropped subscriber");
                continue;
            };
            debug_assert_eq!(subscriber.node_id(), subscriber_id);
            subscriber.evaluate()?;
        }

        Ok(())
    }

    /// Mark `node_id` as evaluating, refusing re-entry and honouring the
    /// configured depth limit.
    pub(crate) fn enter_evaluation(node_id: NodeId) -> Result<EvaluationStack, BindingError> {
        let limit = CONFIG.with(|config| config.borrow().max_evaluation_depth);
        EvaluationStack::enter(node_id, limit).inspect_err(|err| {
            warn!(node = %node_id, %err, "aborting propagation");
        })
    }

    /// Install a configuration for the current thread.
    pub fn configure(config: GraphConfig) {
        debug!(?config, "configuring runtime");
        CONFIG.with(|current| *current.borrow_mut() = config);
    }

    /// Get the configuration of the current thread.
    pub fn config() -> GraphConfig {
        CONFIG.with(|config| config.borrow().clone())
    }

    /// Get the node currently evaluating on this thread, if any.
    pub fn current_evaluator() -> Option<NodeId> {
        EvaluationScope::current()
    }

    /// Check if a binding is running on this thread.
    pub fn is_tracking() -> bool {
        EvaluationScope::is_active()
    }

    /// Check whether a node is still registered.
    pub fn contains(node_id: NodeId) -> bool {
        graph().lock().contains(node_id)
    }

    /// Number of nodes subscribed to `node_id`.
    pub fn subscriber_count(node_id: NodeId) -> usize {
        graph().lock().subscriber_count(node_id)
    }

    /// Number of nodes `node_id` read during its last evaluation.
    pub fn dependency_count(node_id: NodeId) -> usize {
        graph().lock().dependency_count(node_id)
    }

    /// Check whether `subscriber` depends on `dependency`.
    pub fn has_edge(dependency: NodeId, subscriber: NodeId) -> bool {
        graph().lock().has_edge(dependency, subscriber)
    }

    /// Number of live nodes across all threads.
    pub fn node_count() -> usize {
        graph().lock().node_count()
    }

    /// Verify that every edge is recorded on both of its endpoints.
    pub fn check_consistency() -> bool {
        graph().lock().check_consistency()
    }
}
