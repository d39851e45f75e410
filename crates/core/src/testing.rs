//! Test doubles for the collaborator seams.
//!
//! Enabled with the `test-utils` feature. Downstream crates use these to
//! exercise the snapshot engine without a real storage backend or contract
//! runtime.

use crate::{BlockchainStore, StoreError, TxSimContext};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tessera_types::{Transaction, TxResult, TxRwSet};

/// In-memory [`BlockchainStore`] backed by a HashMap.
///
/// Supports one-shot fault injection for exercising error pass-through.
#[derive(Default)]
pub struct MemStore {
    objects: Mutex<HashMap<(String, Vec<u8>), Vec<u8>>>,
    fail_reads: AtomicBool,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a committed value.
    pub fn put(&self, contract_name: &str, key: &[u8], value: &[u8]) {
        self.objects
            .lock()
            .expect("mem store lock poisoned")
            .insert((contract_name.to_string(), key.to_vec()), value.to_vec());
    }

    /// Make every subsequent read fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl BlockchainStore for MemStore {
    fn read_object(
        &self,
        contract_name: &str,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend {
                reason: "injected read failure".to_string(),
            });
        }
        Ok(self
            .objects
            .lock()
            .expect("mem store lock poisoned")
            .get(&(contract_name.to_string(), key.to_vec()))
            .cloned())
    }
}

/// Scripted [`TxSimContext`] carrying a fixed read/write set and result.
pub struct MockSimContext {
    tx: Arc<Transaction>,
    exec_seq: usize,
    rw_set: TxRwSet,
    result: TxResult,
}

impl MockSimContext {
    /// Create a context for one execution attempt.
    pub fn new(tx: Transaction, exec_seq: usize, rw_set: TxRwSet, result: TxResult) -> Self {
        Self {
            tx: Arc::new(tx),
            exec_seq,
            rw_set,
            result,
        }
    }

    /// Re-script the start sequence (models re-execution after a lost race).
    pub fn set_exec_seq(&mut self, exec_seq: usize) {
        self.exec_seq = exec_seq;
    }

    /// Replace the read/write set (a re-execution may observe new values).
    pub fn set_rw_set(&mut self, rw_set: TxRwSet) {
        self.rw_set = rw_set;
    }
}

impl TxSimContext for MockSimContext {
    fn tx(&self) -> Arc<Transaction> {
        Arc::clone(&self.tx)
    }

    fn tx_exec_seq(&self) -> usize {
        self.exec_seq
    }

    fn rw_set(&self, vm_succeeded: bool) -> TxRwSet {
        if vm_succeeded {
            self.rw_set.clone()
        } else {
            // A failed VM run still serializes: substitute a poisoned write
            // on a reserved key so the transaction conflicts like any other
            // writer.
            TxRwSet::new(self.tx.id.clone()).with_write(
                "__vm_failure__",
                self.tx.id.0.as_bytes().to_vec(),
                Vec::new(),
            )
        }
    }

    fn result(&self) -> TxResult {
        self.result.clone()
    }
}
