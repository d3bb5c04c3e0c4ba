//! Hook Property
//!
//! A [`HookProperty`] behaves exactly like a [`Property`] but also runs a
//! side-effect callback every time it propagates a change: after a literal
//! is assigned, and after each successful re-evaluation of its binding.
//!
//! The hook runs after every subscriber has been re-evaluated, so it observes
//! a settled graph downstream of this node. It runs untracked: reads inside
//! the hook never become dependencies of anything. Construction does not
//! fire the hook.

use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use super::property::{Binding, Property};
use super::Bindable;
use crate::error::BindingError;

/// A property that invokes a hook after each change it propagates.
///
/// Dereferences to [`Property`] for reads, assignment, and diagnostics.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use bindgraph_core::reactive::HookProperty;
///
/// let changes = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&changes);
/// let title = HookProperty::new(
///     move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     },
///     String::from("untitled"),
/// );
///
/// title.set("report".into()).unwrap();
/// assert_eq!(changes.load(Ordering::SeqCst), 1);
/// ```
pub struct HookProperty<T>
where
    T: Clone + Send + Sync + 'static,
{
    property: Property<T>,
}

impl<T> HookProperty<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a hook property holding a literal value.
    pub fn new<H>(hook: H, value: T) -> Self
    where
        H: Fn() + Send + Sync + 'static,
    {
        Self {
            property: Property::with_hook(value, Box::new(hook)),
        }
    }

    /// Create a hook property computed by `binding`.
    pub fn with_binding<H, F>(hook: H, binding: F) -> Self
    where
        H: Fn() + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            property: Property::bound_with_hook(Arc::new(binding), Box::new(hook)),
        }
    }

    /// Get the underlying property handle.
    pub fn as_property(&self) -> &Property<T> {
        &self.property
    }
}

impl<T> Deref for HookProperty<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Target = Property<T>;

    fn deref(&self) -> &Self::Target {
        &self.property
    }
}

impl<T> Bindable<T> for HookProperty<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> T {
        self.property.get()
    }

    fn assign_literal(&self, value: T) -> Result<(), BindingError> {
        self.property.set(value)
    }

    fn assign_binding(&self, binding: Binding<T>) -> Result<(), BindingError> {
        self.property.bind_shared(binding)
    }

    fn evaluate(&self) -> Result<(), BindingError> {
        self.property.evaluate()
    }
}

impl<T> Clone for HookProperty<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
        }
    }
}

impl<T> Debug for HookProperty<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HookProperty").field(&self.property).finish()
    }
}
