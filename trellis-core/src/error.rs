//! Error types for the reactive store.

use thiserror::Error;

/// Errors surfaced by [`Store`](crate::reactive::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The initial data handed to `Store::new` was not a plain map.
    /// Only a top-level map can be instrumented; there is no way to attach
    /// subscriber sets to a bare scalar or list.
    #[error("initial store data must be a plain map of key-value pairs, got {found}")]
    InvalidInput {
        /// Variant name of the rejected value.
        found: &'static str,
    },

    /// A write targeted a key that was never registered at construction.
    /// The key set is fixed for the store's lifetime.
    #[error("unknown reactive key `{0}`")]
    UnknownKey(String),
}
