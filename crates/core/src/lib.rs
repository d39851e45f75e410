//! Collaborator seams for the Tessera snapshot engine.
//!
//! Defines the traits the engine consumes ([`BlockchainStore`],
//! [`TxSimContext`]) and the error taxonomy that crosses those seams.
//! Conflicts never appear here: the engine reports them as retry signals,
//! not errors.

mod error;
mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::StoreError;
pub use traits::{BlockchainStore, ExecOrderTxType, TxSimContext};
