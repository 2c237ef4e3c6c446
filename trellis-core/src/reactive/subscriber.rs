//! Subscriber types for the reactive system.
//!
//! A Subscriber is any computation that depends on reactive values and wants
//! to be re-run when they change. Each reactive key in a store owns one
//! [`SubscriberSet`] holding weak references to the subscribers that read it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::trace;

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. The ID is what makes
/// membership in a [`SubscriberSet`] idempotent: re-registering the same
/// subscriber during a re-run is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that can be notified when a reactive value it read changes.
///
/// Implemented by [`Observer`](super::Observer); the trait seam exists so the
/// store and subscriber sets never name the concrete observer type.
pub trait Subscriber: Send + Sync {
    /// The subscriber's unique ID.
    fn subscriber_id(&self) -> SubscriberId;

    /// Re-run the computation. Called once per notification pass.
    fn update(&self);
}

#[derive(Clone)]
struct SubscriberEntry {
    id: SubscriberId,
    handle: Weak<dyn Subscriber>,
}

/// The set of subscribers registered on one reactive key.
///
/// Membership is idempotent by [`SubscriberId`] and iteration order is
/// registration order. Entries are weak: the set never owns a subscriber's
/// lifetime, and entries whose subscriber has been dropped are pruned during
/// [`notify`](SubscriberSet::notify).
pub struct SubscriberSet {
    subscribers: RwLock<SmallVec<[SubscriberEntry; 4]>>,
}

impl SubscriberSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(SmallVec::new()),
        }
    }

    /// Register a subscriber for future notification.
    ///
    /// Re-adding an already-registered ID is a no-op, so a subscriber that
    /// reads the same key several times in one run is still notified once.
    pub fn add(&self, id: SubscriberId, handle: Weak<dyn Subscriber>) {
        let mut subscribers = self.subscribers.write();
        if subscribers.iter().any(|entry| entry.id == id) {
            return;
        }
        subscribers.push(SubscriberEntry { id, handle });
    }

    /// Remove a subscriber's registration, if present.
    pub fn remove(&self, id: SubscriberId) {
        self.subscribers.write().retain(|entry| entry.id != id);
    }

    /// Whether the given subscriber is registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().iter().any(|entry| entry.id == id)
    }

    /// Number of registrations, including ones whose subscriber may have
    /// been dropped since.
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Invoke `update` on every live subscriber, in registration order.
    ///
    /// The subscriber list is snapshotted and the lock released before any
    /// callback runs, so an update is free to read or write reactive keys,
    /// including the one being notified. Registrations made by a callback
    /// take effect from the next notification pass. Dead weak entries are
    /// dropped from the set while snapshotting.
    pub fn notify(&self) {
        let live: Vec<Arc<dyn Subscriber>> = {
            let mut subscribers = self.subscribers.write();
            let mut live = Vec::with_capacity(subscribers.len());
            subscribers.retain(|entry| match entry.handle.upgrade() {
                Some(subscriber) => {
                    live.push(subscriber);
                    true
                }
                None => false,
            });
            live
        };

        for subscriber in live {
            trace!(subscriber = ?subscriber.subscriber_id(), "notifying");
            subscriber.update();
        }
    }
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicI32;

    struct MockSubscriber {
        id: SubscriberId,
        tag: usize,
        calls: AtomicI32,
        order: Arc<Mutex<Vec<usize>>>,
    }

    impl MockSubscriber {
        fn new(tag: usize, order: Arc<Mutex<Vec<usize>>>) -> Arc<Self> {
            Arc::new(Self {
                id: SubscriberId::new(),
                tag,
                calls: AtomicI32::new(0),
                order,
            })
        }

        fn calls(&self) -> i32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Subscriber for MockSubscriber {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn update(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.order.lock().push(self.tag);
        }
    }

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn add_is_idempotent_by_id() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let sub = MockSubscriber::new(0, order);
        let set = SubscriberSet::new();

        set.add(sub.id, Arc::downgrade(&sub) as Weak<dyn Subscriber>);
        set.add(sub.id, Arc::downgrade(&sub) as Weak<dyn Subscriber>);
        set.add(sub.id, Arc::downgrade(&sub) as Weak<dyn Subscriber>);

        assert_eq!(set.len(), 1);

        set.notify();
        assert_eq!(sub.calls(), 1);
    }

    #[test]
    fn notify_runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let a = MockSubscriber::new(1, order.clone());
        let b = MockSubscriber::new(2, order.clone());
        let c = MockSubscriber::new(3, order.clone());

        let set = SubscriberSet::new();
        set.add(a.id, Arc::downgrade(&a) as Weak<dyn Subscriber>);
        set.add(b.id, Arc::downgrade(&b) as Weak<dyn Subscriber>);
        set.add(c.id, Arc::downgrade(&c) as Weak<dyn Subscriber>);

        set.notify();
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn remove_stops_notification() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let sub = MockSubscriber::new(0, order);
        let set = SubscriberSet::new();

        set.add(sub.id, Arc::downgrade(&sub) as Weak<dyn Subscriber>);
        set.notify();
        assert_eq!(sub.calls(), 1);

        set.remove(sub.id);
        assert!(!set.contains(sub.id));
        set.notify();
        assert_eq!(sub.calls(), 1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let kept = MockSubscriber::new(1, order.clone());
        let dropped = MockSubscriber::new(2, order.clone());

        let set = SubscriberSet::new();
        set.add(kept.id, Arc::downgrade(&kept) as Weak<dyn Subscriber>);
        set.add(dropped.id, Arc::downgrade(&dropped) as Weak<dyn Subscriber>);
        assert_eq!(set.len(), 2);

        drop(dropped);

        set.notify();
        assert_eq!(*order.lock(), vec![1]);
        // Dead entry removed during the pass.
        assert_eq!(set.len(), 1);
    }
}
