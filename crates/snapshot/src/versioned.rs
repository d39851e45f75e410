//! Versioned key tables.
//!
//! Bookkeeping for the last reader and last writer of every key touched
//! within one snapshot. Each entry carries the apply sequence that touched
//! it, which is what the optimistic conflict check compares a transaction's
//! start sequence against.

use std::collections::HashMap;
use tessera_types::TxRwSet;

/// Fully-qualified state key: a contract name plus the raw key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct StateKey {
    contract_name: String,
    key: Vec<u8>,
}

impl StateKey {
    /// Build a key from its parts.
    pub fn new(contract_name: &str, key: &[u8]) -> Self {
        Self {
            contract_name: contract_name.to_string(),
            key: key.to_vec(),
        }
    }
}

/// A value together with the apply sequence that recorded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeqValue {
    /// Apply sequence of the transaction that recorded this entry.
    pub seq: usize,
    /// The value as read or written.
    pub value: Vec<u8>,
}

/// Last-reader/last-writer tables for one snapshot, last-writer-wins.
///
/// Invariant: every recorded `seq` is a valid index into the snapshot's
/// transaction table at the time of recording (`seq < tx_table.len()`
/// after the owning transaction is appended).
#[derive(Debug, Default)]
pub(crate) struct VersionedTable {
    reads: HashMap<StateKey, SeqValue>,
    writes: HashMap<StateKey, SeqValue>,
}

impl VersionedTable {
    /// Create empty tables sized for an expected number of transactions.
    pub fn with_capacity(tx_count: usize) -> Self {
        Self {
            reads: HashMap::with_capacity(tx_count),
            writes: HashMap::with_capacity(tx_count),
        }
    }

    /// Fold one transaction's read/write set in at the given apply sequence.
    pub fn record(&mut self, rw_set: &TxRwSet, apply_seq: usize) {
        for read in &rw_set.reads {
            self.reads.insert(
                StateKey::new(&read.contract_name, &read.key),
                SeqValue {
                    seq: apply_seq,
                    value: read.value.clone(),
                },
            );
        }
        for write in &rw_set.writes {
            self.writes.insert(
                StateKey::new(&write.contract_name, &write.key),
                SeqValue {
                    seq: apply_seq,
                    value: write.value.clone(),
                },
            );
        }
    }

    /// Apply sequence of the last writer of a key, if any.
    pub fn write_seq(&self, key: &StateKey) -> Option<usize> {
        self.writes.get(key).map(|sv| sv.seq)
    }

    /// Latest value visible for a key: last write, else last read.
    pub fn get(&self, key: &StateKey) -> Option<&[u8]> {
        self.writes
            .get(key)
            .or_else(|| self.reads.get(key))
            .map(|sv| sv.value.as_slice())
    }
}
