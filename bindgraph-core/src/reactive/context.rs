//! Evaluation Context
//!
//! The evaluation context records which node's binding is currently running.
//! This enables automatic dependency tracking: when a property is read, the
//! engine can register the running node as a subscriber.
//!
//! # Implementation
//!
//! A thread-local slot holds the node currently evaluating, or nothing.
//! Entering a scope saves the previous occupant and installs the new node;
//! dropping the guard restores the previous occupant. Restoration happens on
//! every exit path, including unwinding out of a panicking binding, so a
//! failed evaluation can never leave reads attributed to the wrong node.
//!
//! Reads never open a scope. Only a node's own `evaluate()` does, so reading
//! another computed property from inside a binding leaves the slot alone.

use std::cell::{Cell, RefCell};

use indexmap::IndexSet;

use crate::error::BindingError;
use crate::graph::NodeId;

thread_local! {
    /// The node whose binding is running on this thread.
    static CURRENT: Cell<Option<NodeId>> = const { Cell::new(None) };

    /// Nodes whose `evaluate()` is running on this thread, outermost first.
    static EVALUATING: RefCell<IndexSet<NodeId>> = RefCell::new(IndexSet::new());
}

/// Guard that installs a node as the current evaluator until dropped.
pub(crate) struct EvaluationScope {
    installed: Option<NodeId>,
    previous: Option<NodeId>,
}

impl EvaluationScope {
    /// Make `node_id` the current evaluator.
    ///
    /// While the guard is alive, any property that is read registers
    /// `node_id` as a subscriber.
    pub(crate) fn enter(node_id: NodeId) -> Self {
        Self::install(Some(node_id))
    }

    /// Clear the current evaluator until the guard is dropped.
    pub(crate) fn suspend() -> Self {
        Self::install(None)
    }

    fn install(node: Option<NodeId>) -> Self {
        let previous = CURRENT.with(|slot| slot.replace(node));
        Self {
            installed: node,
            previous,
        }
    }

    /// Get the node currently evaluating, if any.
    pub(crate) fn current() -> Option<NodeId> {
        CURRENT.with(Cell::get)
    }

    /// Check if a binding is running on this thread.
    pub(crate) fn is_active() -> bool {
        Self::current().is_some()
    }
}

impl Drop for EvaluationScope {
    fn drop(&mut self) {
        let popped = CURRENT.with(|slot| slot.replace(self.previous));

        // Guards must be dropped in reverse order of creation.
        debug_assert_eq!(
            popped, self.installed,
            "EvaluationScope mismatch: expected {:?}, got {:?}",
            self.installed, popped
        );
    }
}

/// Run `f` without attributing its reads to the current evaluator.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _scope = EvaluationScope::suspend();
    f()
}

/// Guard marking a node's `evaluate()` as in progress on this thread.
///
/// Evaluation nests: a node propagates to its subscribers before its own
/// `evaluate()` returns. A node that is entered again while still in
/// progress can only have been reached through a path back to itself, so
/// re-entry is reported as a cycle instead of recursing forever.
pub(crate) struct EvaluationStack {
    node_id: NodeId,
}

impl EvaluationStack {
    /// Push `node_id` onto this thread's evaluation stack.
    ///
    /// Fails with [`BindingError::CyclicBinding`] if the node is already on
    /// the stack, and with [`BindingError::DepthLimitExceeded`] if the stack
    /// already holds `limit` nodes. `None` means unbounded.
    pub(crate) fn enter(node_id: NodeId, limit: Option<usize>) -> Result<Self, BindingError> {
        EVALUATING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&node_id) {
                return Err(BindingError::CyclicBinding {
                    node: node_id,
                    depth: stack.len(),
                });
            }
            if let Some(limit) = limit {
                if stack.len() >= limit {
                    return Err(BindingError::DepthLimitExceeded {
                        node: node_id,
                        limit,
                    });
                }
            }
            stack.insert(node_id);
            Ok(Self { node_id })
        })
    }

    /// Number of evaluations in progress on this thread.
    pub(crate) fn depth() -> usize {
        EVALUATING.with(|stack| stack.borrow().len())
    }
}

impl Drop for EvaluationStack {
    fn drop(&mut self) {
        let popped = EVALUATING.with(|stack| stack.borrow_mut().pop());
        debug_assert_eq!(popped, Some(self.node_id));
    }
}
