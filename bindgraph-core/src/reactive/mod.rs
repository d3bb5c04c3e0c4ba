//! Property Bindings
//!
//! This module implements the binding engine: properties whose value is
//! either a literal or a binding over other properties, with dependencies
//! discovered automatically.
//!
//! # Concepts
//!
//! ## Properties
//!
//! A [`Property`] owns a value. Assigning a literal replaces the value and
//! re-evaluates everything that read the property. Assigning a binding runs
//! it immediately; every property read while it runs becomes a dependency.
//!
//! ## Hook Properties
//!
//! A [`HookProperty`] is a property that also runs a side-effect callback
//! after each change it propagates.
//!
//! ## Property Wrappers
//!
//! A [`PropertyWrapper`] owns nothing. It reads and writes through callbacks,
//! so state owned by a host framework can take part in the graph. The host
//! reports out-of-band changes with [`PropertyWrapper::notify`].
//!
//! # Implementation Notes
//!
//! A thread-local slot names the node whose binding is running. Reads check
//! the slot and, if it is occupied, record an edge in the dependency graph.
//! Re-evaluation clears a node's edges before its binding runs, so a binding
//! that stops reading something stops being notified by it.
//!
//! Propagation is eager, synchronous, and unbatched. Bindings that read each
//! other never settle: a node reached again while its own evaluation is still
//! running aborts propagation with
//! [`BindingError::CyclicBinding`](crate::error::BindingError::CyclicBinding).
//! Nesting is otherwise unbounded unless a limit is configured through
//! [`Runtime::configure`].

mod bindable;
mod context;
mod hook;
mod property;
mod runtime;
mod wrapper;

pub use bindable::Bindable;
pub use context::untracked;
pub use hook::HookProperty;
pub use property::{Binding, Property};
pub(crate) use runtime::Evaluate;
pub use runtime::Runtime;
pub use wrapper::{Notifier, PropertyWrapper};
