//! Per-transaction read/write sets.
//!
//! The contract runtime records every state access a transaction makes.
//! The snapshot engine uses the resulting set twice: once for optimistic
//! conflict detection at apply time, and once (after sealing) to compress
//! inter-transaction conflicts into the block DAG.

use crate::TxId;
use serde::{Deserialize, Serialize};

/// A single key read by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRead {
    /// Contract the key belongs to.
    pub contract_name: String,

    /// Raw key bytes.
    pub key: Vec<u8>,

    /// Value observed at read time.
    pub value: Vec<u8>,
}

/// A single key written by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxWrite {
    /// Contract the key belongs to.
    pub contract_name: String,

    /// Raw key bytes.
    pub key: Vec<u8>,

    /// Value to be written.
    pub value: Vec<u8>,
}

/// The complete read/write set of one transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRwSet {
    /// Transaction this set belongs to.
    pub tx_id: TxId,

    /// Keys read, in access order.
    pub reads: Vec<TxRead>,

    /// Keys written, in access order.
    pub writes: Vec<TxWrite>,
}

impl TxRwSet {
    /// Create an empty read/write set for a transaction.
    pub fn new(tx_id: impl Into<TxId>) -> Self {
        Self {
            tx_id: tx_id.into(),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Record a read.
    pub fn with_read(
        mut self,
        contract_name: impl Into<String>,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.reads.push(TxRead {
            contract_name: contract_name.into(),
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Record a write.
    pub fn with_write(
        mut self,
        contract_name: impl Into<String>,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.writes.push(TxWrite {
            contract_name: contract_name.into(),
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Check whether the set touches no state at all.
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }
}
