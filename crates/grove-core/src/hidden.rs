//! Hidden (blind) tree state
//!
//! The hidden tree publishes sensitive rotations with lower latency than
//! the main tree. Its committed root trails the links the service has
//! already attested; the gap between the two is the uncommitted count the
//! reconciler surfaces to callers.

use crate::errors::{GroveError, Result};
use crate::hash::Digest32;
use crate::identifiers::Seqno;
use crate::root::SignedRoot;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Domain prefix for hidden-root signing payloads
const HIDDEN_ROOT_SIGNING_PREFIX: &[u8] = b"grove.hidden-root.v1";

/// Last fully-published state of the hidden tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenRoot {
    /// Highest hidden-chain seqno folded into this root
    pub committed_seqno: Seqno,
    /// Digest of the hidden tree at the committed boundary
    pub hash: Digest32,
    /// Ed25519 signature over the committed seqno and hash
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

impl HiddenRoot {
    /// The exact bytes the hidden-root signature covers
    pub fn signing_bytes(committed_seqno: Seqno, hash: &Digest32) -> Result<Vec<u8>> {
        let body = bincode::serialize(&(committed_seqno, hash))
            .map_err(|e| GroveError::serialization(format!("hidden root payload: {e}")))?;
        let mut bytes = Vec::with_capacity(HIDDEN_ROOT_SIGNING_PREFIX.len() + body.len());
        bytes.extend_from_slice(HIDDEN_ROOT_SIGNING_PREFIX);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Build and sign a hidden root (tree-builder side)
    pub fn sign(committed_seqno: Seqno, hash: Digest32, key: &SigningKey) -> Result<Self> {
        let payload = Self::signing_bytes(committed_seqno, &hash)?;
        let signature = key.sign(&payload);
        Ok(Self {
            committed_seqno,
            hash,
            signature: signature.to_bytes().to_vec(),
        })
    }

    /// Verify the signature against a trusted key
    pub fn verify_signature(&self, trusted: &VerifyingKey) -> Result<()> {
        let sig_bytes: [u8; 64] = self.signature.as_slice().try_into().map_err(|_| {
            GroveError::signature_verification(format!(
                "hidden root {} signature has invalid length {}",
                self.committed_seqno,
                self.signature.len()
            ))
        })?;
        let signature = Signature::from_bytes(&sig_bytes);
        let payload = Self::signing_bytes(self.committed_seqno, &self.hash)?;
        trusted.verify(&payload, &signature).map_err(|_| {
            GroveError::signature_verification(format!(
                "hidden root {} signature invalid",
                self.committed_seqno
            ))
        })
    }
}

/// Classification of a hidden-tree lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiddenResponseType {
    /// Hidden record present; committed boundary verified
    Ok,
    /// Server temporarily cannot produce an expected hidden record.
    /// Retryable; never proof that the team did not rotate.
    Absent,
    /// Team never performed a hidden rotation
    None,
}

/// Outcome of reconciling the hidden tree against a team's hidden chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenLookupResult {
    /// How the response classifies
    pub response_type: HiddenResponseType,
    /// Hidden links attested by the service but not yet folded into the
    /// committed hidden root. Zero exactly when nothing is pending.
    pub uncommitted_seqno: u64,
    /// The main-tree root this lookup actually validated against
    pub last_merkle_root: SignedRoot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_leaf;
    use rand::rngs::OsRng;

    #[test]
    fn hidden_root_sign_verify_round_trip() {
        let key = SigningKey::generate(&mut OsRng);
        let root =
            HiddenRoot::sign(Seqno(2), hash_leaf(b"hidden"), &key).expect("signing succeeds");
        root.verify_signature(&key.verifying_key())
            .expect("signature verifies");
    }

    #[test]
    fn hidden_root_rejects_tampered_boundary() {
        let key = SigningKey::generate(&mut OsRng);
        let mut root =
            HiddenRoot::sign(Seqno(2), hash_leaf(b"hidden"), &key).expect("signing succeeds");
        root.committed_seqno = Seqno(3);
        assert!(root.verify_signature(&key.verifying_key()).is_err());
    }
}
