//! Bindgraph Core
//!
//! This crate provides the engine behind bindgraph property bindings.
//! It implements:
//!
//! - Properties holding either a literal value or a binding
//! - Automatic dependency discovery while bindings run
//! - Eager, synchronous propagation of changes to dependents
//! - Hook properties and wrappers over externally owned state
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Node arena with bidirectional subscriber/dependency sets
//! - `reactive`: Evaluation context, runtime, and the property types
//! - `config`: Engine tunables
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use bindgraph_core::reactive::Property;
//!
//! let width = Property::new(150);
//! let height = Property::new(75);
//!
//! let area = {
//!     let (width, height) = (width.clone(), height.clone());
//!     Property::with_binding(move || width.get() * height.get())
//! };
//!
//! // `area` re-evaluates as soon as `width` changes
//! width.set(2).unwrap();
//! assert_eq!(area.get(), 150);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::GraphConfig;
pub use error::BindingError;
