//! Reactive Engine
//!
//! This module implements the dependency-tracking core: the store, the
//! tracking scope, subscriber sets, and observers.
//!
//! # Concepts
//!
//! ## Store
//!
//! The [`Store`] owns every reactive property. Reads performed while an
//! observer is running register that observer as a dependent of the read
//! key; writes that change a value synchronously notify the key's
//! dependents.
//!
//! ## Observers
//!
//! An [`Observer`] is a computation that reads reactive properties and
//! re-runs when any of them changes. Its dependency membership is derived
//! from what it actually read on its most recent run, so dependencies can
//! change over an observer's lifetime.
//!
//! ## Tracking
//!
//! Dependency discovery is implicit. A [`TrackingScope`] marks the observer
//! currently executing on this thread; the store consults it on every read.
//! Scopes are a stack with guard-based release, so nested observer
//! construction and unwinding both restore the enclosing scope correctly.
//!
//! # Propagation Model
//!
//! Notification is synchronous, immediate, and single-level: a write
//! returns only after every registered observer has been updated, and no
//! batching, deduplication across writes, or derived-value caching exists
//! at this layer. Re-entrant writes from update callbacks are legal and
//! bounded by the store's same-value short-circuit.

mod context;
mod observer;
mod store;
mod subscriber;

pub use context::TrackingScope;
pub use observer::Observer;
pub use store::Store;
pub use subscriber::{Subscriber, SubscriberId, SubscriberSet};
