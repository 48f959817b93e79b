//! Signature-chain pointers
//!
//! A chain pointer is the (sequence number, link id) pair naming the latest
//! link of a team's signature chain. The server publishes pointers inside
//! tree leaves; the caller reconstructs its own from raw signed statements
//! (outside this crate) and supplies it as the expected state for a lookup.

use crate::hash::Digest32;
use crate::identifiers::Seqno;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single chain link (digest of the link body)
pub type LinkId = Digest32;

/// Identifier of the signature that sealed a link
pub type SigId = Digest32;

/// Which tree a chain mutation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationType {
    /// Mutation lands in the main tree
    Visible,
    /// Mutation lands in the hidden (blind) tree first
    Hidden,
}

/// Latest-link pointer as recorded by the server in a tree leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPointer {
    /// Sequence number of the latest link
    pub seqno: Seqno,
    /// Identifier of the latest link
    pub link_id: LinkId,
    /// Signature that sealed the latest link
    pub sig_id: SigId,
}

impl ChainPointer {
    /// True when this pointer names the same link the caller expects
    ///
    /// Only seqno and link id participate; the sig id is informational and
    /// not part of the consistency check.
    pub fn matches(&self, expected: &ExpectedChainState) -> bool {
        self.seqno == expected.seqno && self.link_id.ct_eq(&expected.link_id)
    }
}

impl fmt::Display for ChainPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link {} @ seqno {}", self.link_id, self.seqno)
    }
}

/// Caller-supplied view of its locally reconstructed chain
///
/// Compared for equality against the verified leaf's private pointer;
/// never mutated by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedChainState {
    /// Latest sequence number the caller's chain reached
    pub seqno: Seqno,
    /// Latest link identifier the caller's chain produced
    pub link_id: LinkId,
}

/// Caller-supplied view of its hidden chain
///
/// `seqno` is the latest hidden link the caller has signed, or
/// [`Seqno::ZERO`] if the team never performed a hidden rotation. Used to
/// tell a legitimately absent hidden record (never rotated) apart from a
/// server that temporarily cannot produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpectedHiddenState {
    /// Latest hidden-chain sequence number known to the caller
    pub seqno: Seqno,
}

impl ExpectedHiddenState {
    /// Expectation for a team that never rotated hidden
    pub fn never_rotated() -> Self {
        Self { seqno: Seqno::ZERO }
    }

    /// True when the caller believes at least one hidden rotation happened
    pub fn has_rotated(&self) -> bool {
        self.seqno > Seqno::ZERO
    }
}
