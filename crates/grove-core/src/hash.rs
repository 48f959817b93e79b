//! Fixed-size digests and the tree hashing algorithm
//!
//! All tree nodes hash to 32 bytes via BLAKE3. Leaf and interior nodes are
//! domain-separated with single-byte prefixes so a leaf encoding can never
//! be reinterpreted as an interior node (second-preimage hardening).
//!
//! Digest equality for trust decisions goes through [`Digest32::ct_eq`],
//! which compares in constant time regardless of where the first
//! difference falls.

use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Domain prefix for leaf nodes
const LEAF_PREFIX: &[u8] = &[0x00];
/// Domain prefix for interior nodes
const INTERIOR_PREFIX: &[u8] = &[0x01];

/// 32-byte digest used for tree nodes, roots, and link identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest32(#[serde(with = "serde_bytes_array")] pub [u8; 32]);

impl Digest32 {
    /// All-zero digest, used as a placeholder before any value is known
    pub const ZERO: Digest32 = Digest32([0u8; 32]);

    /// Construct from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw byte access
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Constant-time equality
    ///
    /// Use this (not `==`) when the comparison decides whether untrusted
    /// data is accepted.
    pub fn ct_eq(&self, other: &Digest32) -> bool {
        self.0.ct_eq(&other.0).into()
    }

    /// Hex rendering for logs and diagnostics
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Digest32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Hash a leaf encoding into its tree node digest
pub fn hash_leaf(encoding: &[u8]) -> Digest32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(LEAF_PREFIX);
    hasher.update(encoding);
    Digest32(*hasher.finalize().as_bytes())
}

/// Hash a left/right pair of child digests into their parent digest
pub fn hash_interior(left: &Digest32, right: &Digest32) -> Digest32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(INTERIOR_PREFIX);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Digest32(*hasher.finalize().as_bytes())
}

/// Fixed-size serde helper so `Digest32` round-trips as exactly 32 bytes
mod serde_bytes_array {
    use serde::de::Error;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serde_bytes::serialize(bytes.as_slice(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let bytes: Vec<u8> = serde_bytes::deserialize(deserializer)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| D::Error::custom(format!("expected 32 bytes, got {}", v.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_interior_are_domain_separated() {
        let payload = [0x42u8; 64];
        let as_leaf = hash_leaf(&payload);
        let as_interior = hash_interior(
            &Digest32::from_bytes(payload[..32].try_into().unwrap()),
            &Digest32::from_bytes(payload[32..].try_into().unwrap()),
        );
        assert_ne!(as_leaf, as_interior);
    }

    #[test]
    fn interior_order_matters() {
        let a = hash_leaf(b"a");
        let b = hash_leaf(b"b");
        assert_ne!(hash_interior(&a, &b), hash_interior(&b, &a));
    }

    #[test]
    fn ct_eq_matches_eq() {
        let a = hash_leaf(b"x");
        let b = hash_leaf(b"x");
        let c = hash_leaf(b"y");
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&c));
    }
}
