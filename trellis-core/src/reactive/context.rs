//! Tracking Scope
//!
//! The tracking scope records which observer is currently executing. This is
//! what makes dependency discovery implicit: when a store key is read while a
//! scope is active, the store registers the scope's observer into that key's
//! subscriber set.
//!
//! # Implementation
//!
//! The scope is a thread-local stack. Entering a scope pushes an entry;
//! the returned guard pops it on drop. Because the guard pops on every exit
//! path, including unwinding out of a panicking computation, the marker can
//! never be left dangling. The stack (rather than a single slot) means an
//! observer constructed while another observer is running shadows the outer
//! scope and then restores it, so nested construction cannot corrupt the
//! outer observer's tracking.
//!
//! Each entry also collects the keys read during the scope. Observers use
//! that read set to re-derive their dependency membership on every run.

use std::cell::RefCell;
use std::sync::Weak;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static SCOPE_STACK: RefCell<Vec<ScopeEntry>> = RefCell::new(Vec::new());
}

/// An entry in the tracking-scope stack.
struct ScopeEntry {
    /// The subscriber ID of the currently running observer.
    subscriber_id: SubscriberId,
    /// Handle the store registers into subscriber sets on tracked reads.
    handle: Weak<dyn Subscriber>,
    /// Keys read during this scope, in read order. May contain duplicates.
    reads: Vec<String>,
}

/// Guard marking an observer as the one currently executing on this thread.
///
/// The scope is exited when the guard is dropped.
pub struct TrackingScope {
    subscriber_id: SubscriberId,
}

impl TrackingScope {
    /// Enter a new tracking scope for the given subscriber.
    ///
    /// While the scope is active, store reads on this thread register the
    /// subscriber into the read key's subscriber set.
    pub fn enter(subscriber_id: SubscriberId, handle: Weak<dyn Subscriber>) -> Self {
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().push(ScopeEntry {
                subscriber_id,
                handle,
                reads: Vec::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Check if a tracking scope is active on this thread.
    pub fn is_active() -> bool {
        SCOPE_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The innermost scope's subscriber, if any.
    pub(crate) fn active_subscriber() -> Option<(SubscriberId, Weak<dyn Subscriber>)> {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| (entry.subscriber_id, entry.handle.clone()))
        })
    }

    /// Record a key read in the innermost scope.
    ///
    /// Called by the store on tracked reads.
    pub(crate) fn record_read(key: &str) {
        SCOPE_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                entry.reads.push(key.to_owned());
            }
        });
    }

    /// The keys read so far in the innermost scope.
    pub fn reads() -> Vec<String> {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.reads.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for TrackingScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Guards are stack-shaped by construction; a mismatch means one
            // escaped its scope.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "TrackingScope mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}
