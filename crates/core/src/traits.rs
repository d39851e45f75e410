//! Core traits at the boundary of the snapshot engine.
//!
//! The engine has no wire protocol or CLI of its own; everything it needs
//! from the rest of the node arrives through these seams:
//!
//! - [`BlockchainStore`]: committed world state, the fallback of last
//!   resort for key lookups.
//! - [`TxSimContext`]: one transaction's completed execution, produced by
//!   the contract runtime and handed to the snapshot for optimistic apply.

use crate::StoreError;
use std::sync::Arc;
use tessera_types::{Transaction, TxResult, TxRwSet};

/// Read access to committed world state.
///
/// Implemented by the storage subsystem over whatever backend it uses.
/// The snapshot engine only ever reads; committed write sets land in the
/// store outside this engine.
pub trait BlockchainStore: Send + Sync {
    /// Read the committed value of a key, or `Ok(None)` if absent.
    ///
    /// Absence is not an error; only backend failures are.
    fn read_object(
        &self,
        contract_name: &str,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Execution-order class of a transaction.
///
/// Iterator transactions hold a stateful iterator over world state while
/// executing. Their semantics are defined by the contract runtime, so they
/// bypass conflict checking and are applied out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecOrderTxType {
    /// Ordinary transaction, subject to optimistic conflict checking.
    #[default]
    Normal,
    /// Transaction that used a stateful iterator during execution.
    Iterator,
}

/// One transaction's completed simulation, ready to apply to a snapshot.
///
/// Produced by the contract runtime per execution attempt. A worker that
/// loses the optimistic race discards this context, re-executes at the new
/// sequence, and presents a fresh one.
pub trait TxSimContext {
    /// The transaction that was executed.
    fn tx(&self) -> Arc<Transaction>;

    /// The apply sequence the transaction observed when it started
    /// executing (its start sequence).
    fn tx_exec_seq(&self) -> usize;

    /// The recorded read/write set.
    ///
    /// When the VM did not run successfully the context substitutes a
    /// poisoned set for the real one, so the failed transaction still
    /// serializes against its neighbors.
    fn rw_set(&self, vm_succeeded: bool) -> TxRwSet;

    /// The execution result.
    fn result(&self) -> TxResult;
}
