//! Error types for the binding engine.
//!
//! The engine has no I/O, so every error here is a local programming error:
//! a binding graph that never settles, or a configuration that does not parse.

use crate::graph::NodeId;

/// Errors raised while evaluating or propagating bindings.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// A node was re-entered while its own evaluation was still running.
    ///
    /// Two or more bindings read each other, so every re-evaluation would
    /// trigger another one.
    #[error("cyclic binding detected at node {node} ({depth} evaluations in progress)")]
    CyclicBinding {
        /// The node that was re-entered.
        node: NodeId,
        /// Evaluations in progress on the thread when the cycle closed.
        depth: usize,
    },

    /// Evaluation nested deeper than the configured
    /// [`max_evaluation_depth`](crate::config::GraphConfig::max_evaluation_depth).
    #[error("evaluation of node {node} exceeded the depth limit of {limit}")]
    DepthLimitExceeded {
        /// The node whose evaluation tripped the limit.
        node: NodeId,
        /// The configured limit.
        limit: usize,
    },

    /// A [`GraphConfig`](crate::config::GraphConfig) could not be parsed.
    #[error("invalid graph configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
