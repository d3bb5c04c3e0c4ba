//! Integration Tests for the Binding Engine
//!
//! These tests verify that properties, hook properties, and wrappers work
//! together through the public API.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use bindgraph_core::reactive::{HookProperty, Property, PropertyWrapper, Runtime};
use bindgraph_core::{BindingError, GraphConfig};

fn calculate_area(width: i32, height: i32) -> i32 {
    (width * height) / 2
}

/// A rectangle whose area and colour are bound to its other properties.
#[derive(Clone)]
struct Rectangle {
    parent: Property<Option<Rectangle>>,
    width: Property<i32>,
    height: Property<i32>,
    area: Property<i32>,
    color: Property<String>,
}

impl Rectangle {
    fn new() -> Self {
        let parent: Property<Option<Rectangle>> = Property::new(None);
        let width = Property::new(150);
        let height = Property::new(75);

        let area = {
            let (width, height) = (width.clone(), height.clone());
            Property::with_binding(move || calculate_area(width.get(), height.get()))
        };

        let color = {
            let (parent, area) = (parent.clone(), area.clone());
            Property::with_binding(move || match parent.get() {
                Some(parent) if area.get() > parent.area.get() => String::from("blue"),
                _ => String::from("red"),
            })
        };

        Self {
            parent,
            width,
            height,
            area,
            color,
        }
    }
}

/// Width times height, re-evaluated when width changes.
#[test]
fn area_follows_width() {
    let width = Property::new(2);
    let height = Property::new(75);
    let area = {
        let (width, height) = (width.clone(), height.clone());
        Property::with_binding(move || width.get() * height.get())
    };

    assert_eq!(area.get(), 150);

    width.set(10).unwrap();
    assert_eq!(area.get(), 750);
}

/// Colour tracks the parent's area through a property that holds another
/// rectangle, with no manual re-wiring.
#[test]
fn child_color_follows_parent_area() {
    let parent = Rectangle::new();
    let child = Rectangle::new();
    assert_eq!(child.color.get(), "red");

    // Equal areas: not larger than the parent.
    child.parent.set(Some(parent.clone())).unwrap();
    assert_eq!(child.color.get(), "red");
    assert!(Runtime::has_edge(parent.area.id(), child.color.id()));

    // The parent shrinks below the child, and the child's colour follows.
    parent.width.set(2).unwrap();
    assert_eq!(parent.area.get(), 75);
    assert_eq!(child.area.get(), 5625);
    assert_eq!(child.color.get(), "blue");

    // Detaching the parent drops the edge to its area.
    child.parent.set(None).unwrap();
    assert_eq!(child.color.get(), "red");
    assert!(!Runtime::has_edge(parent.area.id(), child.color.id()));

    parent.width.set(1000).unwrap();
    assert_eq!(child.color.get(), "red");
    assert_eq!(child.height.get(), 75);
}

/// A wrapper over a foreign integer field, changed out of band.
#[test]
fn wrapper_notify_recomputes_subscriber() {
    let field = Arc::new(AtomicI32::new(1));
    let wrapper = {
        let (w, r) = (Arc::clone(&field), Arc::clone(&field));
        PropertyWrapper::new(
            move |v| w.store(v, Ordering::SeqCst),
            move || r.load(Ordering::SeqCst),
        )
    };
    let label = {
        let wrapper = wrapper.clone();
        Property::with_binding(move || format!("value = {}", wrapper.get()))
    };
    assert_eq!(label.get(), "value = 1");

    field.store(42, Ordering::SeqCst);
    assert_eq!(label.get(), "value = 1");

    wrapper.notify().unwrap();
    assert_eq!(label.get(), "value = 42");
}

/// A host framework reports changes through a notifier callback.
#[test]
fn notifier_as_host_signal() {
    let field = Arc::new(AtomicI32::new(0));
    let wrapper = {
        let (w, r) = (Arc::clone(&field), Arc::clone(&field));
        PropertyWrapper::new(
            move |v| w.store(v, Ordering::SeqCst),
            move || r.load(Ordering::SeqCst),
        )
    };
    let squared = {
        let wrapper = wrapper.clone();
        Property::with_binding(move || wrapper.get() * wrapper.get())
    };

    // What a host toolkit would connect to its "changed" signal.
    let on_changed: Box<dyn Fn()> = Box::new(wrapper.notifier().into_callback());

    field.store(7, Ordering::SeqCst);
    on_changed();
    assert_eq!(squared.get(), 49);
}

/// A bound wrapper sits in the middle of a chain.
#[test]
fn wrapper_between_properties() {
    let field = Arc::new(AtomicI32::new(0));
    let margin = Property::new(10);
    let geometry = {
        let (w, r) = (Arc::clone(&field), Arc::clone(&field));
        PropertyWrapper::new(
            move |v| w.store(v, Ordering::SeqCst),
            move || r.load(Ordering::SeqCst),
        )
    };
    {
        let margin = margin.clone();
        geometry.bind(move || margin.get() * 2).unwrap();
    }
    let inner = {
        let geometry = geometry.clone();
        Property::with_binding(move || geometry.get() - 5)
    };
    assert_eq!(inner.get(), 15);

    margin.set(20).unwrap();
    assert_eq!(field.load(Ordering::SeqCst), 40);
    assert_eq!(inner.get(), 35);
}

/// The hook observes subscribers already updated.
#[test]
fn hook_sees_settled_subscribers() {
    let observed = Arc::new(AtomicI32::new(-1));
    let doubled_slot: Arc<parking_lot::Mutex<Option<Property<i32>>>> =
        Arc::new(parking_lot::Mutex::new(None));

    let count = {
        let (observed, slot) = (Arc::clone(&observed), Arc::clone(&doubled_slot));
        HookProperty::new(
            move || {
                if let Some(doubled) = slot.lock().as_ref() {
                    observed.store(doubled.get_untracked(), Ordering::SeqCst);
                }
            },
            1,
        )
    };
    let doubled = {
        let count = count.as_property().clone();
        Property::with_binding(move || count.get() * 2)
    };
    *doubled_slot.lock() = Some(doubled.clone());

    count.set(21).unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 42);

    // Release the hook's handle so both nodes can be dropped.
    doubled_slot.lock().take();
}

/// Diamond: one change, each node re-evaluated once per notification path.
#[test]
fn diamond_reevaluates_each_direct_subscriber_once() {
    let source = Property::new(1);
    let left_runs = Arc::new(AtomicUsize::new(0));
    let right_runs = Arc::new(AtomicUsize::new(0));

    let left = {
        let (source, runs) = (source.clone(), Arc::clone(&left_runs));
        Property::with_binding(move || {
            runs.fetch_add(1, Ordering::SeqCst);
            source.get() + 1
        })
    };
    let right = {
        let (source, runs) = (source.clone(), Arc::clone(&right_runs));
        Property::with_binding(move || {
            runs.fetch_add(1, Ordering::SeqCst);
            source.get() * 2
        })
    };
    let sum = {
        let (left, right) = (left.clone(), right.clone());
        Property::with_binding(move || left.get() + right.get())
    };

    source.set(10).unwrap();

    assert_eq!(left_runs.load(Ordering::SeqCst), 2);
    assert_eq!(right_runs.load(Ordering::SeqCst), 2);
    assert_eq!(sum.get(), 31);
}

/// Dropping nodes in the middle of a graph leaves no dangling edges.
#[test]
fn teardown_leaves_graph_consistent() {
    let a = Property::new(1);
    let b = {
        let a = a.clone();
        Property::with_binding(move || a.get() + 1)
    };
    let c = {
        let (a, b) = (a.clone(), b.clone());
        Property::with_binding(move || a.get() + b.get())
    };
    let b_id = b.id();
    let c_id = c.id();

    drop(c);
    assert!(!Runtime::contains(c_id));
    assert_eq!(b.subscriber_count(), 0);
    assert_eq!(a.subscriber_count(), 1);

    drop(b);
    assert!(!Runtime::contains(b_id));
    assert_eq!(a.subscriber_count(), 0);

    a.set(5).unwrap();
    assert!(Runtime::check_consistency());
}

/// A true cycle fails fast instead of exhausting the stack.
#[test]
fn cycle_reports_error() {
    let ping = Property::new(0);
    let pong = {
        let ping = ping.clone();
        Property::with_binding(move || ping.get() + 1)
    };

    let result = {
        let pong = pong.clone();
        ping.bind(move || pong.get() + 1)
    };
    match result {
        Err(BindingError::CyclicBinding { node, depth }) => {
            assert_eq!(node, ping.id());
            assert_eq!(depth, 2);
        }
        other => panic!("expected cyclic binding error, got {other:?}"),
    }
    assert!(Runtime::current_evaluator().is_none());

    ping.set(0).unwrap();
    assert_eq!(pong.get(), 1);
}

/// A long acyclic chain propagates end to end under the default config.
#[test]
fn long_chain_propagates_to_the_tail() {
    // Propagation recurses once per link.
    let worker = std::thread::Builder::new()
        .stack_size(32 * 1024 * 1024)
        .spawn(|| {
            assert_eq!(Runtime::config(), GraphConfig::default());

            let head = Property::new(0);
            let mut chain = vec![head.clone()];
            for _ in 0..300 {
                let prev = chain[chain.len() - 1].clone();
                chain.push(Property::with_binding(move || prev.get() + 1));
            }

            head.set(1).unwrap();
            assert_eq!(chain[256].get(), 257);
            assert_eq!(chain[257].get(), 258);
            assert_eq!(chain[300].get(), 301);
        })
        .unwrap();
    worker.join().unwrap();
}

/// An explicit depth limit loaded from JSON caps propagation.
#[test]
fn configured_depth_limit_stops_propagation() {
    Runtime::configure(GraphConfig::from_json(r#"{ "max_evaluation_depth": 40 }"#).unwrap());

    let head = Property::new(0);
    let mut chain = vec![head.clone()];
    for _ in 0..50 {
        let prev = chain[chain.len() - 1].clone();
        chain.push(Property::with_binding(move || prev.get() + 1));
    }

    match head.set(100) {
        Err(BindingError::DepthLimitExceeded { limit, .. }) => assert_eq!(limit, 40),
        other => panic!("expected depth limit error, got {other:?}"),
    }
    assert_eq!(chain[40].get(), 140);
    assert_eq!(chain[41].get(), 41);

    Runtime::configure(GraphConfig::default());
}
