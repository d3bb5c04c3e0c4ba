//! Graph Nodes
//!
//! This module defines the per-node record that lives in the dependency graph.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

use indexmap::IndexSet;

use crate::reactive::Evaluate;

/// Unique identifier for a node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A literal-or-binding property that owns its value.
    Property,

    /// A property that also runs a side-effect hook after each change.
    Hook,

    /// A wrapper over externally owned state, accessed through callbacks.
    Wrapper,
}

/// A node in the dependency graph.
///
/// Edge sets are insertion ordered so propagation visits subscribers in the
/// order they first read this node.
pub(crate) struct NodeEntry {
    kind: NodeKind,

    /// Nodes that read this node during their last evaluation.
    subscribers: IndexSet<NodeId>,

    /// Nodes this node read during its last evaluation.
    dependencies: IndexSet<NodeId>,

    /// Dispatch handle used to re-evaluate the node. Non-owning: the graph
    /// never keeps a node alive.
    target: Weak<dyn Evaluate>,
}

impl NodeEntry {
    pub(crate) fn new(kind: NodeKind, target: Weak<dyn Evaluate>) -> Self {
        Self {
            kind,
            subscribers: IndexSet::new(),
            dependencies: IndexSet::new(),
            target,
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        self.kind
    }

    pub(crate) fn target(&self) -> &Weak<dyn Evaluate> {
        &self.target
    }

    pub(crate) fn subscribers(&self) -> &IndexSet<NodeId> {
        &self.subscribers
    }

    pub(crate) fn dependencies(&self) -> &IndexSet<NodeId> {
        &self.dependencies
    }

    /// Returns `true` if the subscriber was not already present.
    pub(crate) fn add_subscriber(&mut self, node_id: NodeId) -> bool {
        self.subscribers.insert(node_id)
    }

    pub(crate) fn remove_subscriber(&mut self, node_id: NodeId) {
        self.subscribers.shift_remove(&node_id);
    }

    pub(crate) fn add_dependency(&mut self, node_id: NodeId) -> bool {
        self.dependencies.insert(node_id)
    }

    pub(crate) fn remove_dependency(&mut self, node_id: NodeId) {
        self.dependencies.shift_remove(&node_id);
    }

    /// Take the dependency set, leaving it empty.
    pub(crate) fn take_dependencies(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.dependencies)
    }

    /// Take the subscriber set, leaving it empty.
    pub(crate) fn take_subscribers(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.subscribers)
    }
}

impl fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeEntry")
            .field("kind", &self.kind)
            .field("subscribers", &self.subscribers)
            .field("dependencies", &self.dependencies)
            .field("alive", &(self.target.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::BindingError;
    use std::sync::Arc;

    /// Evaluator that does nothing, for exercising the arena in isolation.
    pub(crate) struct Inert(pub(crate) NodeId);

    impl Evaluate for Inert {
        fn node_id(&self) -> NodeId {
            self.0
        }

        fn evaluate(&self) -> Result<(), BindingError> {
            Ok(())
        }
    }

    pub(crate) fn inert_entry(id: NodeId) -> (Arc<dyn Evaluate>, NodeEntry) {
        let target: Arc<dyn Evaluate> = Arc::new(Inert(id));
        let entry = NodeEntry::new(NodeKind::Property, Arc::downgrade(&target));
        (target, entry)
    }

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn edge_sets_are_sets() {
        let (_target, mut entry) = inert_entry(NodeId::new());
        let other = NodeId::new();

        assert!(entry.add_subscriber(other));
        assert!(!entry.add_subscriber(other));
        assert_eq!(entry.subscribers().len(), 1);

        assert!(entry.add_dependency(other));
        assert!(!entry.add_dependency(other));
        assert_eq!(entry.dependencies().len(), 1);
    }

    #[test]
    fn take_dependencies_empties_set() {
        let (_target, mut entry) = inert_entry(NodeId::new());
        let dep1 = NodeId::new();
        let dep2 = NodeId::new();

        entry.add_dependency(dep1);
        entry.add_dependency(dep2);

        let taken = entry.take_dependencies();
        assert_eq!(taken.into_iter().collect::<Vec<_>>(), vec![dep1, dep2]);
        assert!(entry.dependencies().is_empty());
    }

    #[test]
    fn target_does_not_keep_node_alive() {
        let (target, entry) = inert_entry(NodeId::new());
        assert!(entry.target().upgrade().is_some());

        drop(target);
        assert!(entry.target().upgrade().is_none());
    }
}
