//! Dependency Graph
//!
//! This module implements the arena that records which nodes read which.
//!
//! # Overview
//!
//! - Nodes are properties, hook properties, or wrappers over external state.
//! - Edges are dependencies: if B's binding read A during its last
//!   evaluation, then `B ∈ A.subscribers` and `A ∈ B.dependencies`.
//!
//! Both directions are updated together, under one lock, so the relation is
//! always mutually consistent. Nodes refer to each other only by [`NodeId`];
//! the arena holds a `Weak` dispatch handle per node, so tearing down a node
//! can never dangle or double-free.
//!
//! The graph is not acyclic by construction. Two bindings that read each
//! other form a cycle, which evaluation reports at run time when a node is
//! reached again before its own evaluation has finished.

mod node;

pub use node::{NodeId, NodeKind};
pub(crate) use node::NodeEntry;

use std::collections::HashMap;
use std::sync::Weak;

use smallvec::SmallVec;

use crate::reactive::Evaluate;

/// Subscriber snapshot taken before propagation.
pub(crate) type SubscriberSnapshot = SmallVec<[(NodeId, Weak<dyn Evaluate>); 8]>;

/// The node arena with bidirectional edge sets.
#[derive(Debug, Default)]
pub(crate) struct Graph {
    /// All nodes in the graph, indexed by ID.
    nodes: HashMap<NodeId, NodeEntry>,
}

impl Graph {
    /// Create a new empty graph.
    pub(crate) fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Add a node to the graph.
    pub(crate) fn insert(&mut self, node_id: NodeId, entry: NodeEntry) {
        self.nodes.insert(node_id, entry);
    }

    /// Remove a node from the graph.
    ///
    /// Detaches the node from every subscriber and dependency before the
    /// entry is released.
    pub(crate) fn remove(&mut self, node_id: NodeId) -> Option<NodeEntry> {
        let mut entry = self.nodes.remove(&node_id)?;

        for dep_id in entry.take_dependencies() {
            if let Some(dep) = self.nodes.get_mut(&dep_id) {
                dep.remove_subscriber(node_id);
            }
        }

        for sub_id in entry.take_subscribers() {
            if let Some(sub) = self.nodes.get_mut(&sub_id) {
                sub.remove_dependency(node_id);
            }
        }

        Some(entry)
    }

    /// Check whether a node is present.
    pub(crate) fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Add a dependency edge: `subscriber` read `dependency`.
    ///
    /// Returns `true` if a new edge was created. Self-loops and edges to
    /// nodes not in the graph are refused.
    pub(crate) fn add_edge(&mut self, dependency: NodeId, subscriber: NodeId) -> bool {
        if dependency == subscriber
            || !self.nodes.contains_key(&dependency)
            || !self.nodes.contains_key(&subscriber)
        {
            return false;
        }

        let mut created = false;
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            created |= dep_node.add_subscriber(subscriber);
        }
        if let Some(sub_node) = self.nodes.get_mut(&subscriber) {
            created |= sub_node.add_dependency(dependency);
        }
        created
    }

    /// Drop every edge from `node_id` to the nodes it depends on.
    ///
    /// Subscribers of `node_id` are untouched.
    pub(crate) fn clear_dependencies(&mut self, node_id: NodeId) {
        let deps = match self.nodes.get_mut(&node_id) {
            Some(node) => node.take_dependencies(),
            None => return,
        };

        for dep_id in deps {
            if let Some(dep) = self.nodes.get_mut(&dep_id) {
                dep.remove_subscriber(node_id);
            }
        }
    }

    /// Copy the current subscriber set of a node.
    pub(crate) fn subscribers(&self, node_id: NodeId) -> SubscriberSnapshot {
        let Some(node) = self.nodes.get(&node_id) else {
            return SmallVec::new();
        };

        node.subscribers()
            .iter()
            .filter_map(|id| {
                self.nodes
                    .get(id)
                    .map(|sub| (*id, Weak::clone(sub.target())))
            })
            .collect()
    }

    /// Number of nodes subscribed to `node_id`.
    pub(crate) fn subscriber_count(&self, node_id: NodeId) -> usize {
        self.nodes
            .get(&node_id)
            .map_or(0, |node| node.subscribers().len())
    }

    /// Number of nodes `node_id` read during its last evaluation.
    pub(crate) fn dependency_count(&self, node_id: NodeId) -> usize {
        self.nodes
            .get(&node_id)
            .map_or(0, |node| node.dependencies().len())
    }

    /// Check whether `subscriber` is recorded as depending on `dependency`.
    pub(crate) fn has_edge(&self, dependency: NodeId, subscriber: NodeId) -> bool {
        self.nodes
            .get(&dependency)
            .is_some_and(|node| node.subscribers().contains(&subscriber))
    }

    /// Get the total number of nodes in the graph.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Verify that every edge is recorded on both sides and points at a live
    /// entry.
    pub(crate) fn check_consistency(&self) -> bool {
        self.nodes.iter().all(|(id, node)| {
            let subs_ok = node.subscribers().iter().all(|sub_id| {
                self.nodes
                    .get(sub_id)
                    .is_some_and(|sub| sub.dependencies().contains(id))
            });
            let deps_ok = node.dependencies().iter().all(|dep_id| {
                self.nodes
                    .get(dep_id)
                    .is_some_and(|dep| dep.subscribers().contains(id))
            });
            subs_ok && deps_ok
        })
    }
}
