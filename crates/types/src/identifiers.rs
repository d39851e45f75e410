//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// Genesis block height.
    pub const GENESIS: Self = BlockHeight(0);

    /// Get the next block height.
    pub fn next(self) -> Self {
        BlockHeight(self.0 + 1)
    }

    /// Get the previous block height (returns None if at genesis).
    pub fn prev(self) -> Option<Self> {
        if self.0 > 0 {
            Some(BlockHeight(self.0 - 1))
        } else {
            None
        }
    }

    /// Distance to an older height, saturating at zero.
    pub fn distance_from(self, older: Self) -> u64 {
        self.0.saturating_sub(older.0)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// Chain identifier for a single ledger within a multi-chain host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl ChainId {
    /// Get the identifier as bytes (for digests).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        ChainId(s.to_string())
    }
}

/// Transaction identifier, assigned by the submitting client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        TxId(s.to_string())
    }
}

/// A member identity in the permissioned network.
///
/// Members are identified by their organization plus credential material
/// (typically certificate bytes). Used as block proposer identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Member {
    /// Organization the member belongs to.
    pub org_id: String,

    /// Credential bytes identifying the member within its organization.
    pub member_info: Vec<u8>,
}

impl Member {
    /// Create a new member identity.
    pub fn new(org_id: impl Into<String>, member_info: impl Into<Vec<u8>>) -> Self {
        Self {
            org_id: org_id.into(),
            member_info: member_info.into(),
        }
    }

    /// Canonical byte encoding fed into block fingerprints.
    ///
    /// Fields are length-prefixed so distinct identities never collide.
    pub fn identity_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(8 + self.org_id.len() + self.member_info.len());
        bytes.extend_from_slice(&(self.org_id.len() as u32).to_le_bytes());
        bytes.extend_from_slice(self.org_id.as_bytes());
        bytes.extend_from_slice(&(self.member_info.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.member_info);
        bytes
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org_id, hex::encode(&self.member_info))
    }
}
