use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::node::SchemaNode;

/// Domain tag prepended to every tree digest.
const TREE_DOMAIN: &str = "sd-tree-v1";

/// Content digest of a schema subtree.
///
/// The BLAKE3 hash of the subtree's min-string, domain-separated so a digest
/// can never be confused with a hash of unrelated bytes. Two trees have equal
/// digests iff their min-strings are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeDigest([u8; 32]);

impl TreeDigest {
    /// Digest of a subtree.
    pub fn of(node: &SchemaNode) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TREE_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(node.min_string().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Wrap a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns `true` if `node` hashes to this digest.
    pub fn matches(&self, node: &SchemaNode) -> bool {
        Self::of(node) == *self
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> TreeResult<Self> {
        let bytes = hex::decode(s).map_err(|e| TreeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TreeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for TreeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeDigest({})", self.short_hex())
    }
}

impl fmt::Display for TreeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
