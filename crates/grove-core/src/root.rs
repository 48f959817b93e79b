//! Signed main-tree roots
//!
//! A root is the server's periodic commitment to the whole main tree,
//! sealed with the tree builder's signing key. The signing payload is a
//! domain-prefixed deterministic encoding of the root fields so client and
//! builder agree on exactly what the signature covers.

use crate::errors::{GroveError, Result};
use crate::hash::Digest32;
use crate::identifiers::Seqno;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain prefix for main-root signing payloads
const ROOT_SIGNING_PREFIX: &[u8] = b"grove.merkle-root.v1";

/// A published, signed main-tree root
///
/// Immutable once verified. Sequence numbers observed by one client
/// session strictly increase; the root store enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRoot {
    /// Publication sequence number
    pub seqno: Seqno,
    /// Digest of the tree at this publication
    pub root_hash: Digest32,
    /// Ed25519 signature over [`SignedRoot::signing_bytes`]
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
    /// Advertised signer, checked against the trusted key
    #[serde(with = "serde_bytes")]
    pub signer: Vec<u8>,
    /// Publication time, milliseconds since the Unix epoch
    pub published_at: u64,
}

impl SignedRoot {
    /// The exact bytes the root signature covers
    pub fn signing_bytes(seqno: Seqno, root_hash: &Digest32, published_at: u64) -> Result<Vec<u8>> {
        let body = bincode::serialize(&(seqno, root_hash, published_at))
            .map_err(|e| GroveError::serialization(format!("root signing payload: {e}")))?;
        let mut bytes = Vec::with_capacity(ROOT_SIGNING_PREFIX.len() + body.len());
        bytes.extend_from_slice(ROOT_SIGNING_PREFIX);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Build and sign a root (tree-builder side)
    pub fn sign(
        seqno: Seqno,
        root_hash: Digest32,
        published_at: u64,
        key: &SigningKey,
    ) -> Result<Self> {
        let payload = Self::signing_bytes(seqno, &root_hash, published_at)?;
        let signature = key.sign(&payload);
        Ok(Self {
            seqno,
            root_hash,
            signature: signature.to_bytes().to_vec(),
            signer: key.verifying_key().to_bytes().to_vec(),
            published_at,
        })
    }

    /// Verify the signature against a trusted key
    ///
    /// Fails when the advertised signer is not the trusted key, when the
    /// signature bytes are malformed, or when the signature does not
    /// verify. Any of these is a trust failure the caller must not retry
    /// past.
    pub fn verify_signature(&self, trusted: &VerifyingKey) -> Result<()> {
        if self.signer != trusted.to_bytes() {
            return Err(GroveError::signature_verification(format!(
                "root {} advertises an untrusted signer",
                self.seqno
            )));
        }
        let sig_bytes: [u8; 64] = self.signature.as_slice().try_into().map_err(|_| {
            GroveError::signature_verification(format!(
                "root {} signature has invalid length {}",
                self.seqno,
                self.signature.len()
            ))
        })?;
        let signature = Signature::from_bytes(&sig_bytes);
        let payload = Self::signing_bytes(self.seqno, &self.root_hash, self.published_at)?;
        trusted.verify(&payload, &signature).map_err(|_| {
            GroveError::signature_verification(format!("root {} signature invalid", self.seqno))
        })
    }
}

impl fmt::Display for SignedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root seqno {} hash {}", self.seqno, self.root_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_leaf;
    use rand::rngs::OsRng;

    #[test]
    fn sign_then_verify_round_trip() {
        let key = SigningKey::generate(&mut OsRng);
        let root = SignedRoot::sign(Seqno(7), hash_leaf(b"tree"), 1_700_000_000_000, &key)
            .expect("signing succeeds");
        root.verify_signature(&key.verifying_key())
            .expect("signature verifies");
    }

    #[test]
    fn rejects_wrong_signer() {
        let key = SigningKey::generate(&mut OsRng);
        let other = SigningKey::generate(&mut OsRng);
        let root =
            SignedRoot::sign(Seqno(7), hash_leaf(b"tree"), 1, &key).expect("signing succeeds");
        assert!(root.verify_signature(&other.verifying_key()).is_err());
    }

    #[test]
    fn rejects_tampered_hash() {
        let key = SigningKey::generate(&mut OsRng);
        let mut root =
            SignedRoot::sign(Seqno(7), hash_leaf(b"tree"), 1, &key).expect("signing succeeds");
        root.root_hash = hash_leaf(b"other tree");
        assert!(root.verify_signature(&key.verifying_key()).is_err());
    }
}
