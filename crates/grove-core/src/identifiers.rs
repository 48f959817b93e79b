//! Identifier types for teams and tree positions
//!
//! `TeamId` identifies a team across lookups; `Seqno` numbers both tree
//! roots and signature-chain links. Sequence numbers start at 1 for the
//! first link of a chain; 0 is reserved to mean "nothing yet".

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Team identifier
///
/// Uniquely identifies a team across the main and hidden trees. The server
/// echoes this back in each leaf; a leaf whose team id differs from the
/// request is treated as a corrupt proof by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub Uuid);

impl TeamId {
    /// Create a new random team ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Raw bytes, used in canonical encodings
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for TeamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

impl From<Uuid> for TeamId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Sequence number for roots and chain links
///
/// Monotonically increasing within its domain (root publications, a team's
/// chain, the hidden tree's committed boundary). `Seqno(0)` means "none
/// observed yet" and never identifies a real link or root.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Seqno(pub u64);

impl Seqno {
    /// The reserved "nothing yet" value
    pub const ZERO: Seqno = Seqno(0);

    /// Inner value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The following sequence number
    pub fn next(&self) -> Seqno {
        Seqno(self.0 + 1)
    }

    /// Gap between two sequence numbers, clamped at zero
    ///
    /// Used to count pending hidden links: server-attested links past the
    /// committed boundary. A committed boundary ahead of the latest link
    /// yields 0, never a negative or wrapped value.
    pub fn gap_since(&self, earlier: Seqno) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Seqno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Seqno {
    fn from(value: u64) -> Self {
        Seqno(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seqno_gap_clamps_at_zero() {
        assert_eq!(Seqno(5).gap_since(Seqno(3)), 2);
        assert_eq!(Seqno(3).gap_since(Seqno(3)), 0);
        assert_eq!(Seqno(2).gap_since(Seqno(7)), 0);
    }

    #[test]
    fn team_ids_are_distinct() {
        assert_ne!(TeamId::new(), TeamId::new());
    }
}
