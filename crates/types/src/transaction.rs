//! Transaction and execution result types.

use crate::TxId;
use serde::{Deserialize, Serialize};

/// A transaction submitted for inclusion in a block.
///
/// The payload is opaque to the snapshot engine; it is interpreted only by
/// the contract runtime. The engine cares about identity and the read/write
/// set the runtime reports after execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Client-assigned transaction identifier.
    pub id: TxId,

    /// Opaque invocation payload (contract, method, arguments).
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(id: impl Into<TxId>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }
}

/// Status code of a transaction execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatusCode {
    /// Contract ran to completion.
    Success,
    /// Contract failed; the poisoned read/write set still serializes the tx.
    ContractFail,
}

/// Result of executing a transaction in the contract runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// Execution status.
    pub code: TxStatusCode,

    /// Human-readable status message.
    pub message: String,

    /// Return bytes produced by the contract.
    pub result: Vec<u8>,
}

impl TxResult {
    /// Successful result with return bytes.
    pub fn success(result: impl Into<Vec<u8>>) -> Self {
        Self {
            code: TxStatusCode::Success,
            message: String::new(),
            result: result.into(),
        }
    }

    /// Failed result with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: TxStatusCode::ContractFail,
            message: message.into(),
            result: Vec::new(),
        }
    }
}
