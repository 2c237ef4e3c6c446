//! Reactive Store
//!
//! The store owns every reactive property: an ordered map from key to the
//! current value and the key's subscriber set. It mediates all access:
//!
//! 1. A read performed while a [`TrackingScope`] is active registers the
//!    running observer into the key's subscriber set.
//!
//! 2. A write that actually changes the value synchronously notifies that
//!    key's subscribers before returning. A write of the same value
//!    (SameValueZero, so `NaN` counts as unchanged) is a no-op.
//!
//! # Shape
//!
//! The key set is fixed at construction: keys are never added or removed,
//! and each key keeps the same subscriber set for the store's lifetime.
//! That makes the outer map immutable: only the per-key value cell and
//! subscriber set have interior mutability, and neither lock is ever held
//! while a subscriber callback runs.
//!
//! Reactivity is shallow. A nested map stored under a key is an opaque
//! value; replacing it notifies, mutating inside it is invisible.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::StoreError;
use crate::value::Value;

use super::context::TrackingScope;
use super::subscriber::{SubscriberId, SubscriberSet};

/// One reactive property: its current value and its subscribers.
struct Entry {
    value: RwLock<Value>,
    subscribers: SubscriberSet,
}

struct StoreInner {
    /// Key order follows the initial data; iteration is deterministic.
    entries: IndexMap<String, Entry>,
}

/// The owner of all reactive properties.
///
/// Cloning a `Store` is cheap and yields a handle to the same properties,
/// the way observers and binders share it.
///
/// # Example
///
/// ```rust,ignore
/// let store = Store::new(serde_json::json!({ "count": 1 }))?;
///
/// let value = store.read("count");        // Some(Value::Number(1.0))
/// store.write("count", 2.0)?;             // notifies subscribers of `count`
/// store.write("count", 2.0)?;             // unchanged, notifies nobody
/// ```
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Build a store from initial data.
    ///
    /// Accepts anything convertible to [`Value`]; the top level must be a
    /// plain map, otherwise construction fails with
    /// [`StoreError::InvalidInput`]. Each top-level key becomes a reactive
    /// property backed by its own subscriber set. Nested maps are stored as
    /// opaque values and are not instrumented.
    pub fn new(initial: impl Into<Value>) -> Result<Self, StoreError> {
        let initial = initial.into();
        let fields = match initial {
            Value::Map(fields) => fields,
            other => {
                return Err(StoreError::InvalidInput {
                    found: other.type_name(),
                })
            }
        };

        let entries = fields
            .iter()
            .map(|(key, value)| {
                let entry = Entry {
                    value: RwLock::new(value.clone()),
                    subscribers: SubscriberSet::new(),
                };
                (key.clone(), entry)
            })
            .collect();

        debug!(keys = fields.len(), "store constructed");
        Ok(Self {
            inner: Arc::new(StoreInner { entries }),
        })
    }

    /// Read a property's current value.
    ///
    /// Returns `None` for keys that were never registered; the store does
    /// not fabricate reactivity for unknown keys. If a tracking scope is
    /// active on this thread, the read also registers the running observer
    /// into the key's subscriber set and records the read in the scope.
    pub fn read(&self, key: &str) -> Option<Value> {
        let entry = self.inner.entries.get(key)?;

        if let Some((subscriber_id, handle)) = TrackingScope::active_subscriber() {
            trace!(key, subscriber = ?subscriber_id, "tracked read");
            entry.subscribers.add(subscriber_id, handle);
            TrackingScope::record_read(key);
        }

        Some(entry.value.read().clone())
    }

    /// Write a property's value.
    ///
    /// If the new value is the same as the current one under
    /// [`Value::same_value`], nothing happens and nobody is notified.
    /// Otherwise the value is stored and the key's subscribers are invoked
    /// synchronously, in registration order, before `write` returns.
    ///
    /// The value lock is released before notification, so subscriber
    /// callbacks may freely read and write the store, including this key,
    /// where recursion is bounded by the same-value check.
    pub fn write(&self, key: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        let entry = self
            .inner
            .entries
            .get(key)
            .ok_or_else(|| StoreError::UnknownKey(key.to_owned()))?;

        let value = value.into();
        {
            let mut current = entry.value.write();
            if current.same_value(&value) {
                trace!(key, "write left value unchanged, skipping notification");
                return Ok(());
            }
            *current = value;
        }

        debug!(key, "value changed, notifying subscribers");
        entry.subscribers.notify();
        Ok(())
    }

    /// Whether `key` is a reactive property of this store.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// The store's keys, in construction order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.entries.keys().map(String::as_str)
    }

    /// Number of reactive properties.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Number of subscribers currently registered on `key`.
    ///
    /// Zero for unknown keys. Counts registrations, including ones whose
    /// observer has been dropped but not yet pruned.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .entries
            .get(key)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }

    /// Drop a subscriber's registration on `key`.
    ///
    /// Used by observers when pruning stale dependencies and on disposal.
    pub(crate) fn unsubscribe(&self, key: &str, subscriber_id: SubscriberId) {
        if let Some(entry) = self.inner.entries.get(key) {
            entry.subscribers.remove(subscriber_id);
        }
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("keys", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(json: serde_json::Value) -> Store {
        Store::new(json).expect("test data is a map")
    }

    #[test]
    fn rejects_non_map_initial_data() {
        let err = Store::new(Value::from(42.0)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidInput { found: "number" }
        ));

        let err = Store::new(Value::Null).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput { found: "null" }));
    }

    #[test]
    fn read_returns_initial_values_in_order() {
        let store = store(json!({ "a": 1, "b": "two", "c": null }));

        assert_eq!(store.read("a"), Some(Value::from(1.0)));
        assert_eq!(store.read("b"), Some(Value::from("two")));
        assert_eq!(store.read("c"), Some(Value::Null));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn read_of_unknown_key_is_absent_not_error() {
        let store = store(json!({ "a": 1 }));
        assert_eq!(store.read("missing"), None);
    }

    #[test]
    fn write_to_unknown_key_fails() {
        let store = store(json!({ "a": 1 }));
        let err = store.write("missing", 2.0).unwrap_err();
        assert!(matches!(err, StoreError::UnknownKey(key) if key == "missing"));
        // Key set is fixed: the failed write did not create the key.
        assert!(!store.contains("missing"));
    }

    #[test]
    fn write_updates_value() {
        let store = store(json!({ "count": 1 }));
        store.write("count", 2.0).unwrap();
        assert_eq!(store.read("count"), Some(Value::from(2.0)));
    }

    #[test]
    fn untracked_read_registers_nothing() {
        let store = store(json!({ "count": 1 }));
        store.read("count");
        assert_eq!(store.subscriber_count("count"), 0);
    }

    #[test]
    fn nested_map_is_not_reactive() {
        let store = store(json!({ "outer": { "inner": 1 } }));

        assert!(store.contains("outer"));
        assert!(!store.contains("inner"));
        assert_eq!(store.read("inner"), None);
    }

    #[test]
    fn clone_shares_state() {
        let store1 = store(json!({ "count": 1 }));
        let store2 = store1.clone();

        store1.write("count", 5.0).unwrap();
        assert_eq!(store2.read("count"), Some(Value::from(5.0)));
    }

    mod proptests {
        use super::*;
        use crate::binding::Binding;
        use crate::reactive::Observer;
        use proptest::prelude::*;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        proptest! {
            // One notification per value-changing write, none for the rest.
            #[test]
            fn updates_match_value_changes(writes in proptest::collection::vec(-3i32..3, 0..40)) {
                let store = Store::new(serde_json::json!({ "n": 0 })).unwrap();
                let fired = Arc::new(AtomicUsize::new(0));
                let fired_clone = fired.clone();

                let observer = Observer::new(&store, Binding::new("t", "n"), move |_, _| {
                    fired_clone.fetch_add(1, Ordering::SeqCst);
                });

                let mut current = 0i32;
                let mut expected = 0usize;
                for w in writes {
                    store.write("n", f64::from(w)).unwrap();
                    if w != current {
                        expected += 1;
                        current = w;
                    }
                }

                prop_assert_eq!(fired.load(Ordering::SeqCst), expected);
                prop_assert_eq!(observer.value(), Some(Value::from(f64::from(current))));
            }

            // A same-value write never notifies, whatever the value.
            #[test]
            fn same_value_write_is_silent(n in proptest::num::f64::ANY) {
                let store = Store::new(serde_json::json!({ "x": 0 })).unwrap();
                store.write("x", n).unwrap();

                let fired = Arc::new(AtomicUsize::new(0));
                let fired_clone = fired.clone();
                let _observer = Observer::new(&store, Binding::new("t", "x"), move |_, _| {
                    fired_clone.fetch_add(1, Ordering::SeqCst);
                });

                store.write("x", n).unwrap();
                prop_assert_eq!(fired.load(Ordering::SeqCst), 0);
            }
        }
    }
}
