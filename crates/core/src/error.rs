//! Error taxonomy for the persistent-store seam.

use thiserror::Error;

/// Errors surfaced by the persistent store.
///
/// These pass through the snapshot engine verbatim: the engine never
/// retries a store read, and never converts a conflict into an error.
/// Whether a failed read fails the transaction or the whole block is the
/// execution layer's call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The storage backend failed (I/O, connection, timeout).
    #[error("store backend error: {reason}")]
    Backend {
        /// Backend-specific failure description.
        reason: String,
    },

    /// The store returned data that failed integrity checks.
    #[error("corrupted state for contract {contract_name}: {reason}")]
    Corrupted {
        /// Contract whose state is corrupted.
        contract_name: String,
        /// What failed to validate.
        reason: String,
    },
}
