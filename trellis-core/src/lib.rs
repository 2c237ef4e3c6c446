//! Trellis Core
//!
//! This crate provides the reactive dependency-tracking engine for the
//! Trellis data-binding framework. It implements:
//!
//! - A reactive store: property reads register the running observer, writes
//!   notify exactly the observers that depend on the written key
//! - Implicit, run-time dependency discovery with per-run re-derivation and
//!   pruning of stale subscriptions
//! - The binding boundary consumed by an external binder
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: The store, observers, subscriber sets, and tracking scope
//! - `value`: The dynamically typed value model and its change-detection
//!   semantics
//! - `binding`: Descriptor types at the binder boundary
//! - `error`: Store error types
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::{Binding, Observer, Store};
//!
//! // A store over plain initial data. Only top-level keys are reactive.
//! let store = Store::new(serde_json::json!({ "count": 1 }))?;
//!
//! // An observer bound to `count`. It reads the key once at construction
//! // (registering the dependency) and re-runs on every change.
//! let observer = Observer::new(&store, Binding::new("counter-label", "count"), |binding, value| {
//!     println!("{} is now {}", binding.target(), value);
//! });
//!
//! store.write("count", 2.0)?;   // observer fires once: "counter-label is now 2"
//! store.write("count", 2.0)?;   // unchanged value, observer does not fire
//! ```

pub mod binding;
pub mod error;
pub mod reactive;
pub mod value;

pub use binding::{Binding, Bindings};
pub use error::StoreError;
pub use reactive::{Observer, Store, Subscriber, SubscriberId, SubscriberSet, TrackingScope};
pub use value::Value;
