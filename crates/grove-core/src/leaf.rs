//! Team leaves and their canonical encoding
//!
//! A leaf is the server's published claim about one team: the latest
//! private-chain pointer and, for teams with a public subtree, the latest
//! public-chain pointer. The canonical encoding defined here is exactly
//! what the tree hashes, so the client and any honest tree builder must
//! agree on it byte for byte.

use crate::chain::ChainPointer;
use crate::errors::{GroveError, Result};
use crate::identifiers::TeamId;
use serde::{Deserialize, Serialize};

/// Domain prefix mixed into every leaf encoding
const LEAF_ENCODING_PREFIX: &[u8] = b"grove.team-leaf.v1";

/// Server-published state for one team at a given root
///
/// `public` is legitimately `None` for private-only teams; absence is a
/// normal state, never a verification failure. `private` is `None` only
/// when the tree has not yet published anything for the team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLeaf {
    /// Team this leaf describes
    pub team_id: TeamId,
    /// Latest private-chain pointer, if published
    pub private: Option<ChainPointer>,
    /// Latest public-chain pointer, if the team has a public chain
    pub public: Option<ChainPointer>,
}

impl TeamLeaf {
    /// Canonical bytes as hashed into the tree
    ///
    /// Deterministic bincode with a domain prefix. Both the verifier and
    /// the tree builder derive leaf digests from this encoding.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)
            .map_err(|e| GroveError::serialization(format!("leaf encoding: {e}")))?;
        let mut bytes = Vec::with_capacity(LEAF_ENCODING_PREFIX.len() + body.len());
        bytes.extend_from_slice(LEAF_ENCODING_PREFIX);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_leaf;
    use crate::identifiers::Seqno;

    fn sample_leaf() -> TeamLeaf {
        TeamLeaf {
            team_id: TeamId::new(),
            private: Some(ChainPointer {
                seqno: Seqno(1),
                link_id: hash_leaf(b"link-1"),
                sig_id: hash_leaf(b"sig-1"),
            }),
            public: None,
        }
    }

    #[test]
    fn canonical_bytes_are_stable() {
        let leaf = sample_leaf();
        assert_eq!(
            leaf.canonical_bytes().unwrap(),
            leaf.canonical_bytes().unwrap()
        );
    }

    #[test]
    fn canonical_bytes_differ_per_team() {
        let a = sample_leaf();
        let mut b = a.clone();
        b.team_id = TeamId::new();
        assert_ne!(a.canonical_bytes().unwrap(), b.canonical_bytes().unwrap());
    }
}
