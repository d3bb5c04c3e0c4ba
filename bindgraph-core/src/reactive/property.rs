//! Property Implementation
//!
//! A Property holds a value of type T that is either an explicit literal or
//! the result of a binding: a zero-argument computation over other
//! properties.
//!
//! # How Properties Work
//!
//! 1. Reading a property inside another node's binding records an edge, so
//!    the reader is re-evaluated whenever this property changes.
//!
//! 2. Assigning a literal stores it, discards any binding and the edges that
//!    binding recorded, then re-evaluates subscribers.
//!
//! 3. Assigning a binding runs it immediately. The value and the dependency
//!    set are established eagerly, not on first read.
//!
//! 4. Reads never recompute. They return whatever the last evaluation
//!    stored.
//!
//! # Memory Layout
//!
//! Each property consists of:
//! - A registered node handle (unregisters on drop)
//! - The value, behind a lock
//! - The binding, if any, behind a lock
//! - An optional hook (see [`HookProperty`](super::HookProperty))

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use super::context::{untracked, EvaluationScope};
use super::runtime::{Evaluate, NodeHandle, Runtime};
use super::Bindable;
use crate::error::BindingError;
use crate::graph::{NodeId, NodeKind};

/// A zero-argument computation producing a node's value.
pub type Binding<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A side effect run after a hook property propagates a change.
pub(crate) type Hook = Box<dyn Fn() + Send + Sync>;

/// The shared state behind every clone of a [`Property`].
pub(crate) struct PropertyNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    handle: NodeHandle,
    value: RwLock<T>,
    binding: RwLock<Option<Binding<T>>>,
    hook: Option<Hook>,
}

impl<T> PropertyNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn create(kind: NodeKind, value: T, hook: Option<Hook>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let target: Weak<dyn Evaluate> = weak.clone();
            Self {
                handle: Runtime::register(kind, target),
                value: RwLock::new(value),
                binding: RwLock::new(None),
                hook,
            }
        })
    }

    fn create_bound(kind: NodeKind, binding: Binding<T>, hook: Option<Hook>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let target: Weak<dyn Evaluate> = weak.clone();
            let handle = Runtime::register(kind, target);

            // Nothing can be subscribed yet, so there is nothing to notify.
            let value = {
                let _scope = EvaluationScope::enter(handle.id());
                binding()
            };

            Self {
                handle,
                value: RwLock::new(value),
                binding: RwLock::new(Some(binding)),
                hook,
            }
        })
    }

    fn id(&self) -> NodeId {
        self.handle.id()
    }

    fn propagate(&self) -> Result<(), BindingError> {
        Runtime::notify(self.id())?;
        if let Some(hook) = &self.hook {
            untracked(hook);
        }
        Ok(())
    }
}

impl<T> Evaluate for PropertyNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id()
    }

    fn evaluate(&self) -> Result<(), BindingError> {
        let id = self.id();
        let _depth = Runtime::enter_evaluation(id)?;

        let binding = self.binding.read().clone();
        if let Some(binding) = binding {
            trace!(node = %id, "evaluating binding");
            Runtime::clear_dependencies(id);

            let value = {
                let _scope = EvaluationScope::enter(id);
                binding()
            };

            let previous = std::mem::replace(&mut *self.value.write(), value);
            drop(previous);
        }

        self.propagate()
    }
}

/// A property holding a value of type T, assigned either a literal or a
/// binding.
///
/// Cloning a property yields another handle to the same node. The node is
/// removed from the graph when the last handle is dropped.
///
/// # Example
///
/// ```rust
/// use bindgraph_core::reactive::Property;
///
/// let width = Property::new(2);
/// let height = Property::new(75);
///
/// let area = {
///     let (width, height) = (width.clone(), height.clone());
///     Property::with_binding(move || width.get() * height.get())
/// };
/// assert_eq!(area.get(), 150);
///
/// width.set(10).unwrap();
/// assert_eq!(area.get(), 750);
/// ```
pub struct Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    node: Arc<PropertyNode<T>>,
}

impl<T> Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a property holding a literal value.
    pub fn new(value: T) -> Self {
        Self {
            node: PropertyNode::create(NodeKind::Property, value, None),
        }
    }

    /// Create a property computed by `binding`.
    ///
    /// The binding runs immediately to establish the value and the
    /// dependency set.
    pub fn with_binding<F>(binding: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            node: PropertyNode::create_bound(NodeKind::Property, Arc::new(binding), None),
        }
    }

    pub(crate) fn with_hook(value: T, hook: Hook) -> Self {
        Self {
            node: PropertyNode::create(NodeKind::Hook, value, Some(hook)),
        }
    }

    pub(crate) fn bound_with_hook(binding: Binding<T>, hook: Hook) -> Self {
        Self {
            node: PropertyNode::create_bound(NodeKind::Hook, binding, Some(hook)),
        }
    }

    /// Get the property's node ID.
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    /// Get the current value.
    ///
    /// If called within a binding, this also registers the binding's node as
    /// a subscriber. Never recomputes.
    pub fn get(&self) -> T {
        Runtime::accessed(self.id());
        self.get_untracked()
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.node.value.read().clone()
    }

    /// Assign a literal value.
    ///
    /// Discards any binding and the dependencies it recorded, then
    /// re-evaluates subscribers.
    pub fn set(&self, value: T) -> Result<(), BindingError> {
        let previous_binding = self.node.binding.write().take();
        let previous_value = std::mem::replace(&mut *self.node.value.write(), value);
        Runtime::clear_dependencies(self.id());
        drop((previous_binding, previous_value));

        self.node.propagate()
    }

    /// Assign a literal computed from the current value.
    ///
    /// Like [`set`](Self::set), this discards any binding.
    pub fn update<F>(&self, f: F) -> Result<(), BindingError>
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.get_untracked();
        self.set(f(&current))
    }

    /// Assign a binding and evaluate it immediately.
    pub fn bind<F>(&self, binding: F) -> Result<(), BindingError>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind_shared(Arc::new(binding))
    }

    /// Assign a binding that may be shared with other properties.
    pub fn bind_shared(&self, binding: Binding<T>) -> Result<(), BindingError> {
        let previous = self.node.binding.write().replace(binding);
        drop(previous);
        self.node.evaluate()
    }

    /// Re-run the binding, if any, then re-evaluate subscribers.
    ///
    /// A literal property only propagates.
    pub fn evaluate(&self) -> Result<(), BindingError> {
        self.node.evaluate()
    }

    /// Check whether the value comes from a binding.
    pub fn has_binding(&self) -> bool {
        self.node.binding.read().is_some()
    }

    /// Get the number of nodes that read this property during their last
    /// evaluation.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.id())
    }

    /// Get the number of nodes this property read during its last
    /// evaluation.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.id())
    }
}

impl<T> Bindable<T> for Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> T {
        Property::get(self)
    }

    fn assign_literal(&self, value: T) -> Result<(), BindingError> {
        self.set(value)
    }

    fn assign_binding(&self, binding: Binding<T>) -> Result<(), BindingError> {
        self.bind_shared(binding)
    }

    fn evaluate(&self) -> Result<(), BindingError> {
        Property::evaluate(self)
    }
}

impl<T> Clone for Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T> Debug for Property<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id())
            .field("value", &self.get_untracked())
            .field("has_binding", &self.has_binding())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
