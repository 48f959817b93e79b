//! Untrusted transport boundary
//!
//! The client talks to the server through this trait and nothing else.
//! Implementations return whatever the server sent; the client verifies.
//! Retries and backoff for transient failures belong to the transport (or
//! the caller), not to the verification core — except for the freshness
//! poller, which re-invokes these calls on its own schedule.

use async_trait::async_trait;
use grove_core::{HiddenRoot, InclusionProof, Result, Seqno, SignedRoot, TeamId, TeamLeaf};

/// Hidden-tree state as reported by the server for one team
///
/// `latest_link_seqno` is the newest hidden link the service has attested
/// for the team, committed or not. `None` means the server has no hidden
/// record at all for the team; the reconciler decides whether that is a
/// legitimate "never rotated" or a transient absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenStateResponse {
    /// Current signed hidden root
    pub root: HiddenRoot,
    /// Newest server-attested hidden link for the team, if any
    pub latest_link_seqno: Option<Seqno>,
}

/// Remote calls the verification core consumes
///
/// Every returned value is untrusted bytes until the client has verified
/// it. Implementations must honor cancellation by returning promptly when
/// their underlying I/O is aborted; the client additionally bounds each
/// call with its configured deadline.
#[async_trait]
pub trait MerkleTransport: Send + Sync {
    /// Fetch a signed root; `None` asks for the latest
    async fn fetch_root(&self, seqno: Option<Seqno>) -> Result<SignedRoot>;

    /// Fetch a team's leaf and inclusion proof at the given root
    async fn fetch_leaf_and_proof(
        &self,
        team_id: TeamId,
        root_seqno: Seqno,
    ) -> Result<(TeamLeaf, InclusionProof)>;

    /// Fetch the hidden tree's state for a team
    ///
    /// `hidden_root_seqno` pins a specific committed boundary; `None`
    /// asks for the current one.
    async fn fetch_hidden_state(
        &self,
        team_id: TeamId,
        hidden_root_seqno: Option<Seqno>,
    ) -> Result<HiddenStateResponse>;
}
