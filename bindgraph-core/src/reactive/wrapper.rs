//! Property Wrapper
//!
//! A [`PropertyWrapper`] takes part in the graph like a property but owns no
//! value. A caller-supplied read callback and write callback stand in for
//! storage, which lets the graph drive state that lives elsewhere, such as a
//! field on an object owned by a host framework.
//!
//! Every read calls the read callback; nothing is cached. When the external
//! state changes through a path the graph does not see, the owner calls
//! [`PropertyWrapper::notify`] (or a [`Notifier`] obtained earlier) and the
//! wrapper's subscribers re-evaluate against the freshly read value.
//!
//! The callbacks are trusted: a write followed by a read is expected to
//! return the written value, eventually.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{trace, warn};

use super::context::EvaluationScope;
use super::property::Binding;
use super::runtime::{Evaluate, NodeHandle, Runtime};
use super::Bindable;
use crate::error::BindingError;
use crate::graph::{NodeId, NodeKind};

type WriteCallback<T> = Box<dyn Fn(T) + Send + Sync>;
type ReadCallback<T> = Box<dyn Fn() -> T + Send + Sync>;

struct WrapperNode<T>
where
    T: Send + Sync + 'static,
{
    handle: NodeHandle,
    write: WriteCallback<T>,
    read: ReadCallback<T>,
    binding: RwLock<Option<Binding<T>>>,
}

impl<T> WrapperNode<T>
where
    T: Send + Sync + 'static,
{
    fn id(&self) -> NodeId {
        self.handle.id()
    }
}

impl<T> Evaluate for WrapperNode<T>
where
    T: Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id()
    }

    fn evaluate(&self) -> Result<(), BindingError> {
        let id = self.id();
        let _depth = Runtime::enter_evaluation(id)?;

        let binding = self.binding.read().clone();
        if let Some(binding) = binding {
            trace!(node = %id, "evaluating wrapper binding");
            Runtime::clear_dependencies(id);

            let value = {
                let _scope = EvaluationScope::enter(id);
                binding()
            };
            (self.write)(value);
        }

        Runtime::notify(id)
    }
}

/// A graph node backed by read and write callbacks instead of owned storage.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
/// use bindgraph_core::reactive::{Property, PropertyWrapper};
///
/// let field = Arc::new(AtomicI64::new(3));
/// let wrapper = {
///     let (w, r) = (Arc::clone(&field), Arc::clone(&field));
///     PropertyWrapper::new(
///         move |v| w.store(v, Ordering::SeqCst),
///         move || r.load(Ordering::SeqCst),
///     )
/// };
/// let doubled = {
///     let wrapper = wrapper.clone();
///     Property::with_binding(move || wrapper.get() * 2)
/// };
///
/// // Changed behind the graph's back.
/// field.store(10, Ordering::SeqCst);
/// wrapper.notify().unwrap();
/// assert_eq!(doubled.get(), 20);
/// ```
pub struct PropertyWrapper<T>
where
    T: Send + Sync + 'static,
{
    node: Arc<WrapperNode<T>>,
}

impl<T> PropertyWrapper<T>
where
    T: Send + Sync + 'static,
{
    /// Wrap external state accessed through `write` and `read`.
    pub fn new<W, R>(write: W, read: R) -> Self
    where
        W: Fn(T) + Send + Sync + 'static,
        R: Fn() -> T + Send + Sync + 'static,
    {
        let node = Arc::new_cyclic(|weak: &Weak<WrapperNode<T>>| {
            let target: Weak<dyn Evaluate> = weak.clone();
            WrapperNode {
                handle: Runtime::register(NodeKind::Wrapper, target),
                write: Box::new(write),
                read: Box::new(read),
                binding: RwLock::new(None),
            }
        });
        Self { node }
    }

    /// Get the wrapper's node ID.
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    /// Read the external value through the read callback.
    ///
    /// If called within a binding, this also registers the binding's node as
    /// a subscriber.
    pub fn get(&self) -> T {
        Runtime::accessed(self.id());
        (self.node.read)()
    }

    /// Write a literal through the write callback, then re-evaluate
    /// subscribers.
    ///
    /// Any binding is discarded along with the dependencies it recorded.
    pub fn set(&self, value: T) -> Result<(), BindingError> {
        let previous = self.node.binding.write().take();
        Runtime::clear_dependencies(self.id());
        drop(previous);

        (self.node.write)(value);
        Runtime::notify(self.id())
    }

    /// Assign a binding whose results are written through the write
    /// callback, and evaluate it immediately.
    pub fn bind<F>(&self, binding: F) -> Result<(), BindingError>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind_shared(Arc::new(binding))
    }

    /// Assign a binding that may be shared with other nodes.
    pub fn bind_shared(&self, binding: Binding<T>) -> Result<(), BindingError> {
        let previous = self.node.binding.write().replace(binding);
        drop(previous);
        self.node.evaluate()
    }

    /// Re-run the binding, if any, then re-evaluate subscribers.
    pub fn evaluate(&self) -> Result<(), BindingError> {
        self.node.evaluate()
    }

    /// Re-evaluate subscribers without running this wrapper's binding.
    ///
    /// Call this when the external state changed outside the graph.
    pub fn notify(&self) -> Result<(), BindingError> {
        Runtime::notify(self.id())
    }

    /// Get a handle a host framework can hold to report external changes.
    ///
    /// The handle does not keep the wrapper alive.
    pub fn notifier(&self) -> Notifier {
        let target: Weak<dyn Evaluate> = Arc::downgrade(&self.node) as Weak<dyn Evaluate>;
        Notifier {
            node_id: self.id(),
            target,
        }
    }

    /// Check whether a binding drives the external value.
    pub fn has_binding(&self) -> bool {
        self.node.binding.read().is_some()
    }

    /// Get the number of nodes that read this wrapper during their last
    /// evaluation.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.id())
    }

    /// Get the number of nodes this wrapper's binding read.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.id())
    }
}

impl<T> Bindable<T> for PropertyWrapper<T>
where
    T: Send + Sync + 'static,
{
    fn get(&self) -> T {
        PropertyWrapper::get(self)
    }

    fn assign_literal(&self, value: T) -> Result<(), BindingError> {
        self.set(value)
    }

    fn assign_binding(&self, binding: Binding<T>) -> Result<(), BindingError> {
        self.bind_shared(binding)
    }

    fn evaluate(&self) -> Result<(), BindingError> {
        PropertyWrapper::evaluate(self)
    }
}

impl<T> Clone for PropertyWrapper<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T> fmt::Debug for PropertyWrapper<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyWrapper")
            .field("id", &self.id())
            .field("has_binding", &self.has_binding())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Non-owning handle that triggers propagation from a wrapper.
///
/// Intended to be connected to a host framework's own change signal.
#[derive(Clone)]
pub struct Notifier {
    node_id: NodeId,
    target: Weak<dyn Evaluate>,
}

impl Notifier {
    /// Get the ID of the wrapper this notifier reports for.
    pub fn id(&self) -> NodeId {
        self.node_id
    }

    /// Check whether the wrapper is still alive.
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Re-evaluate the wrapper's subscribers. A no-op once the wrapper has
    /// been dropped.
    pub fn notify(&self) -> Result<(), BindingError> {
        match self.target.upgrade() {
            Some(_node) => Runtime::notify(self.node_id),
            None => Ok(()),
        }
    }

    /// Convert into a plain callback for callers that cannot handle errors.
    ///
    /// Propagation failures are logged and otherwise dropped.
    pub fn into_callback(self) -> impl Fn() + Send + Sync + 'static {
        move || {
            if let Err(err) = self.notify() {
                warn!(node = %self.node_id, %err, "external change notification failed");
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("node_id", &self.node_id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
