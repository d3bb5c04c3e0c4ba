//! The capability shared by every node variant.

use super::property::Binding;
use crate::error::BindingError;

/// Read and assign a node's value, whatever backs it.
///
/// Implemented by [`Property`](super::Property),
/// [`HookProperty`](super::HookProperty), and
/// [`PropertyWrapper`](super::PropertyWrapper). The trait is object safe, so
/// a host can keep heterogeneous nodes as `&dyn Bindable<T>`.
pub trait Bindable<T> {
    /// Current value. Registers a dependency when called inside a binding.
    fn get(&self) -> T;

    /// Replace the value with a literal, dropping any binding.
    fn assign_literal(&self, value: T) -> Result<(), BindingError>;

    /// Replace the binding and evaluate it immediately.
    fn assign_binding(&self, binding: Binding<T>) -> Result<(), BindingError>;

    /// Re-run the binding, if any, and propagate.
    fn evaluate(&self) -> Result<(), BindingError>;
}
