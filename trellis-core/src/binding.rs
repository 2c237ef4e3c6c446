//! Binding Boundary
//!
//! The engine's only consumer is an external binder that walks a document
//! tree and decides which binding points depend on which reactive keys. The
//! types here are that boundary: a [`Binding`] names a binding point and its
//! key, and [`Bindings`] is the collection a binder holds so it can tear
//! everything down at once.
//!
//! The engine never interprets a binding's target; it is carried through to
//! the update callback and is meaningful only to the binder.

use std::sync::Arc;

use crate::reactive::{Observer, Store};
use crate::value::Value;

/// A binding descriptor: an opaque target plus the reactive key it reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    target: Arc<str>,
    key: Arc<str>,
}

impl Binding {
    pub fn new(target: impl Into<Arc<str>>, key: impl Into<Arc<str>>) -> Self {
        Self {
            target: target.into(),
            key: key.into(),
        }
    }

    /// The binding point this descriptor feeds. Opaque to the engine.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The reactive key this binding depends on.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// The set of observers a binder created for one document.
///
/// Dropping a `Bindings` drops its observers, which retires them lazily
/// (they are pruned at the next notification); [`Bindings::dispose`] retires
/// them eagerly instead.
#[derive(Debug, Default)]
pub struct Bindings {
    observers: Vec<Observer>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an observer for `binding` and keep it in this collection.
    ///
    /// The returned handle shares the stored observer.
    pub fn bind<F>(&mut self, store: &Store, binding: Binding, on_update: F) -> Observer
    where
        F: Fn(&Binding, &Value) + Send + Sync + 'static,
    {
        let observer = Observer::new(store, binding, on_update);
        self.observers.push(observer.clone());
        observer
    }

    /// Keep an externally constructed observer.
    pub fn push(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn observers(&self) -> &[Observer] {
        &self.observers
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Dispose every observer and drop the collection.
    pub fn dispose(self) {
        for observer in &self.observers {
            observer.dispose();
        }
    }
}
