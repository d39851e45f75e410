//! Blake3 digest newtype.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte blake3 digest.
///
/// Hashing is deterministic, which is what lets independent nodes derive
/// identical block fingerprints from the same header fields. Usable as a
/// HashMap key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The all-zero digest, used as a placeholder pre-block hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Digest a single byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Digest several slices as one message.
    ///
    /// Each part is framed with a little-endian u64 length prefix, so
    /// shifting bytes across part boundaries always changes the digest.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Parse a digest from its 64-character hex form.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        if hex.len() != 64 {
            return Err(HexError::InvalidLength {
                expected: 64,
                actual: hex.len(),
            });
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| HexError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check for the all-zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hex parse failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Wrong number of hex characters.
    #[error("invalid hex length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected character count.
        expected: usize,
        /// Actual character count.
        actual: usize,
    },

    /// Non-hex characters present.
    #[error("invalid hex string")]
    InvalidHex,
}
