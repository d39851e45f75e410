//! Block fingerprints.
//!
//! A candidate block has no final hash while it is being proposed and
//! executed, so the snapshot registry keys it by a fingerprint: a
//! deterministic digest over the header fields that identify the proposal.
//! Every node computes the same fingerprint for the same logical block,
//! which is what lets a commit notification find the snapshot that the
//! matching proposal created.
//!
//! Two variants exist. The full fingerprint covers every
//! consensus-relevant header field. The pre-consensus fingerprint omits
//! `consensus_args`, so forks that differ only in consensus-specific fields
//! (votes, round evidence) still resolve to the same snapshot.

use crate::{Block, BlockHeader, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain separator for the full fingerprint.
const FULL_DOMAIN: &[u8] = b"tessera/block-fingerprint/v1";

/// Domain separator for the pre-consensus fingerprint.
const PRE_CONSENSUS_DOMAIN: &[u8] = b"tessera/pre-consensus-fingerprint/v1";

/// Deterministic digest identifying a candidate block across all nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockFingerprint(Hash);

impl BlockFingerprint {
    /// Full fingerprint of a block.
    pub fn of_block(block: &Block) -> Self {
        Self::of_header(&block.header)
    }

    /// Full fingerprint over every consensus-relevant header field.
    pub fn of_header(header: &BlockHeader) -> Self {
        Self(Hash::from_parts(&[
            FULL_DOMAIN,
            header.chain_id.as_bytes(),
            &header.height.0.to_le_bytes(),
            &header.timestamp.to_le_bytes(),
            &header.proposer.identity_bytes(),
            header.pre_block_hash.as_bytes(),
            &header.consensus_args,
        ]))
    }

    /// Reduced fingerprint omitting consensus-specific header fields.
    pub fn pre_consensus(header: &BlockHeader) -> Self {
        Self(Hash::from_parts(&[
            PRE_CONSENSUS_DOMAIN,
            header.chain_id.as_bytes(),
            &header.height.0.to_le_bytes(),
            &header.timestamp.to_le_bytes(),
            &header.proposer.identity_bytes(),
            header.pre_block_hash.as_bytes(),
        ]))
    }

    /// The underlying digest.
    pub fn as_hash(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for BlockFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
