//! Observer Implementation
//!
//! An Observer is a unit of computation bound to a reactive store. It reads
//! one or more properties, caches the last value it produced, and re-runs
//! when any property it read changes, pushing the fresh value into a
//! binder-supplied callback.
//!
//! # How Observers Work
//!
//! 1. Construction runs the observer's getter once, synchronously, inside a
//!    [`TrackingScope`]. Every store read during that run registers the
//!    observer into the read key's subscriber set. The initial value is
//!    cached; the update callback is not invoked for this first run.
//!
//! 2. When a tracked key changes, the store calls [`Subscriber::update`].
//!    The observer re-runs the getter in a fresh scope, caches the new
//!    value, and then calls the update callback with it.
//!
//! 3. Dependency membership is re-derived on every run. The keys read this
//!    run are diffed against the previous run's set, and subscriptions on
//!    keys no longer read are removed. A getter that branches between keys
//!    therefore stops receiving notifications for the branch not taken.
//!
//! # Lifetime
//!
//! Subscriber sets hold weak references, so dropping every handle to an
//! observer silently retires it: the next notification pass skips and prunes
//! it. [`Observer::dispose`] retires it eagerly instead, unsubscribing from
//! every tracked key and turning further updates into no-ops.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::binding::Binding;
use crate::value::Value;

use super::context::TrackingScope;
use super::store::Store;
use super::subscriber::{Subscriber, SubscriberId};

type Getter = dyn Fn(&Store) -> Option<Value> + Send + Sync;
type UpdateFn = dyn Fn(&Binding, &Value) + Send + Sync;

struct ObserverInner {
    id: SubscriberId,

    /// Opaque descriptor of what this observer feeds. The engine passes it
    /// through to the update callback and otherwise only uses its key.
    binding: Binding,

    store: Store,

    /// Reads the observed value from the store. Runs inside a tracking
    /// scope, so every key it touches becomes a dependency.
    getter: Box<Getter>,

    /// Binder-supplied hook that pushes a fresh value into presentation.
    on_update: Box<UpdateFn>,

    /// Last value produced by the getter. `None` when the getter came up
    /// empty (e.g. the bound key does not exist).
    value: RwLock<Option<Value>>,

    /// Keys subscribed to as of the most recent run.
    tracked: RwLock<HashSet<String>>,

    disposed: AtomicBool,

    /// Handle registered into subscriber sets during tracked reads.
    weak_self: Weak<ObserverInner>,
}

impl ObserverInner {
    fn run(&self, push: bool) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let handle = self.weak_self.clone() as Weak<dyn Subscriber>;
        let (value, reads) = {
            let _scope = TrackingScope::enter(self.id, handle);
            let value = (self.getter)(&self.store);
            (value, TrackingScope::reads())
        };

        self.retrack(reads);
        *self.value.write() = value.clone();

        if push {
            if let Some(value) = &value {
                trace!(observer = ?self.id, key = %self.binding.key(), "pushing update");
                (self.on_update)(&self.binding, value);
            }
        }
    }

    /// Replace the tracked-key set with this run's reads, unsubscribing
    /// from keys the getter no longer touched.
    fn retrack(&self, reads: Vec<String>) {
        let fresh: HashSet<String> = reads.into_iter().collect();
        let mut tracked = self.tracked.write();

        for stale in tracked.difference(&fresh) {
            trace!(observer = ?self.id, key = %stale, "pruning stale subscription");
            self.store.unsubscribe(stale, self.id);
        }

        *tracked = fresh;
    }
}

impl Subscriber for ObserverInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn update(&self) {
        self.run(true);
    }
}

/// A computation that re-runs when the reactive properties it read change.
///
/// Cloning shares the underlying observer.
///
/// # Example
///
/// ```rust,ignore
/// let store = Store::new(serde_json::json!({ "count": 1 }))?;
///
/// let observer = Observer::new(&store, Binding::new("header", "count"), |binding, value| {
///     println!("{} -> {}", binding.target(), value);
/// });
///
/// store.write("count", 2.0)?;   // prints "header -> 2"
/// ```
pub struct Observer {
    inner: Arc<ObserverInner>,
}

impl Observer {
    /// Create an observer tracking the single key named by `binding`.
    ///
    /// Runs once, synchronously, to register the dependency and cache the
    /// initial value. The callback is not invoked for this first run.
    pub fn new<F>(store: &Store, binding: Binding, on_update: F) -> Self
    where
        F: Fn(&Binding, &Value) + Send + Sync + 'static,
    {
        let key = binding.key().to_owned();
        Self::with_getter(store, binding, move |store| store.read(&key), on_update)
    }

    /// Create an observer whose value comes from an arbitrary getter.
    ///
    /// The getter may read any number of keys; whatever it reads this run
    /// is the observer's dependency set until the next run. This is the
    /// general form behind [`Observer::new`].
    pub fn with_getter<G, F>(store: &Store, binding: Binding, getter: G, on_update: F) -> Self
    where
        G: Fn(&Store) -> Option<Value> + Send + Sync + 'static,
        F: Fn(&Binding, &Value) + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|weak_self| ObserverInner {
            id: SubscriberId::new(),
            binding,
            store: store.clone(),
            getter: Box::new(getter),
            on_update: Box::new(on_update),
            value: RwLock::new(None),
            tracked: RwLock::new(HashSet::new()),
            disposed: AtomicBool::new(false),
            weak_self: weak_self.clone(),
        });

        // Eager first run: establish dependencies and the initial value.
        inner.run(false);

        Self { inner }
    }

    /// The observer's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// The binding descriptor this observer was created with.
    pub fn binding(&self) -> &Binding {
        &self.inner.binding
    }

    /// The cached value from the most recent run.
    pub fn value(&self) -> Option<Value> {
        self.inner.value.read().clone()
    }

    /// Re-run the getter and push the result into the update callback.
    ///
    /// This is what the store invokes on a relevant write; it is public so
    /// a binder can force a refresh.
    pub fn update(&self) {
        self.inner.run(true);
    }

    /// Number of keys the observer is currently subscribed to.
    pub fn tracked_count(&self) -> usize {
        self.inner.tracked.read().len()
    }

    /// Retire the observer: unsubscribe from every tracked key and ignore
    /// all further updates. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let tracked = std::mem::take(&mut *self.inner.tracked.write());
        for key in &tracked {
            self.inner.store.unsubscribe(key, self.inner.id);
        }
        debug!(observer = ?self.inner.id, "observer disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl Clone for Observer {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.inner.id)
            .field("binding", &self.inner.binding)
            .field("tracked", &self.tracked_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
