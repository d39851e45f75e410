//! Block and BlockHeader types.

use crate::{BlockHeight, ChainId, Dag, Hash, Member, Transaction};
use serde::{Deserialize, Serialize};

/// Block header containing the metadata the snapshot engine consumes.
///
/// The header identifies a candidate block before it has a final hash:
/// chain position (height, previous hash), proposer identity, timestamp,
/// and consensus-specific arguments. The snapshot registry keys blocks by
/// a fingerprint over these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Chain this block belongs to.
    pub chain_id: ChainId,

    /// Block height in the chain (genesis = 0).
    pub height: BlockHeight,

    /// Hash of the previous block.
    pub pre_block_hash: Hash,

    /// Member that proposed this block.
    pub proposer: Member,

    /// Unix timestamp (milliseconds) when the block was proposed.
    pub timestamp: i64,

    /// Consensus-specific payload (votes, round evidence).
    ///
    /// Competing forks of the same proposal may differ only here, which is
    /// why the pre-consensus fingerprint excludes this field.
    pub consensus_args: Vec<u8>,
}

impl BlockHeader {
    /// Check if this is the genesis block header.
    pub fn is_genesis(&self) -> bool {
        self.height == BlockHeight::GENESIS
    }
}

/// Complete candidate block.
///
/// The `dag` field starts empty on a fresh proposal; the snapshot engine
/// fills it in after sealing so validators can replay the block with the
/// proposer's parallelism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block header with chain position and proposer metadata.
    pub header: BlockHeader,

    /// Transactions included in this block.
    pub transactions: Vec<Transaction>,

    /// Dependency DAG over the transaction table, in apply order.
    pub dag: Dag,
}

impl Block {
    /// Create a block with an empty DAG (filled in after execution).
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
            dag: Dag::default(),
        }
    }

    /// Get block height.
    pub fn height(&self) -> BlockHeight {
        self.header.height
    }

    /// Get number of transactions in this block.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.header.is_genesis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(height: u64) -> BlockHeader {
        BlockHeader {
            chain_id: ChainId::from("chain1"),
            height: BlockHeight(height),
            pre_block_hash: Hash::from_bytes(b"parent"),
            proposer: Member::new("org1", b"node1".to_vec()),
            timestamp: 1_700_000_000_000,
            consensus_args: vec![],
        }
    }

    #[test]
    fn test_new_block_has_empty_dag() {
        let block = Block::new(header(5), vec![Transaction::new("tx1", b"pay".to_vec())]);
        assert_eq!(block.transaction_count(), 1);
        assert_eq!(block.dag.tx_count(), 0);
        assert!(!block.is_genesis());
    }

    #[test]
    fn test_genesis_detection() {
        let block = Block::new(header(0), vec![]);
        assert!(block.is_genesis());
    }
}
