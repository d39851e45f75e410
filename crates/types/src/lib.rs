//! Core types for the Tessera permissioned chain.
//!
//! Shared vocabulary between the snapshot engine and its collaborators:
//! hashes and fingerprints, identifiers, blocks, transactions, read/write
//! sets, and the per-block dependency DAG.

mod block;
mod dag;
mod fingerprint;
mod hash;
mod identifiers;
mod rwset;
mod transaction;

pub use block::{Block, BlockHeader};
pub use dag::{Dag, DagVertex};
pub use fingerprint::BlockFingerprint;
pub use hash::{Hash, HexError};
pub use identifiers::{BlockHeight, ChainId, Member, TxId};
pub use rwset::{TxRead, TxRwSet, TxWrite};
pub use transaction::{Transaction, TxResult, TxStatusCode};
