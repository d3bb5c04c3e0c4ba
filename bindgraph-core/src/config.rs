//! Graph Configuration
//!
//! Tunables for the evaluation engine. Configuration is installed per thread
//! through [`Runtime::configure`](crate::reactive::Runtime::configure), the
//! same scope as the evaluation context it governs.

use serde::Deserialize;

use crate::error::BindingError;

/// Engine configuration.
///
/// # Example
///
/// ```rust
/// use bindgraph_core::config::GraphConfig;
///
/// let config = GraphConfig::from_json(r#"{ "max_evaluation_depth": 64 }"#).unwrap();
/// assert_eq!(config.max_evaluation_depth, Some(64));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Maximum nesting of `evaluate()` calls before propagation is aborted
    /// with [`BindingError::DepthLimitExceeded`].
    ///
    /// `None` (the default) leaves propagation bounded only by the stack.
    /// Cycles are reported as [`BindingError::CyclicBinding`] either way.
    pub max_evaluation_depth: Option<usize>,
}

impl GraphConfig {
    /// A configuration that caps evaluation nesting at `limit`.
    pub fn with_max_evaluation_depth(limit: usize) -> Self {
        Self {
            max_evaluation_depth: Some(limit),
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(input: &str) -> Result<Self, BindingError> {
        Ok(serde_json::from_str(input)?)
    }
}
