//! Hidden-tree reconciliation
//!
//! The hidden tree publishes sensitive rotations before the main tree
//! folds them in, so a team's newest hidden link may sit past the
//! committed boundary. Reconciliation decides which of three worlds a
//! response describes:
//!
//! - the team never rotated hidden ([`HiddenResponseType::None`]),
//! - the server has a record and everything up to the committed boundary
//!   is tree-proven, with any excess counted as uncommitted
//!   ([`HiddenResponseType::Ok`]),
//! - the server temporarily cannot produce a record the caller knows must
//!   exist ([`HiddenResponseType::Absent`]) — retryable, and never
//!   evidence that the rotation did not happen.

use crate::transport::HiddenStateResponse;
use grove_core::{
    ExpectedHiddenState, HiddenLookupResult, HiddenResponseType, Seqno, SignedRoot, TeamId,
};
use tracing::{debug, warn};

/// Classify a hidden-tree response for one team
///
/// `last_merkle_root` is the main-tree root the surrounding lookup
/// verified; it rides along in the result so the caller gets a causally
/// consistent (leaf, hidden state, root) snapshot.
///
/// The hidden root inside `response` must already have passed signature
/// and monotonicity checks; this function is pure classification.
pub fn reconcile_hidden(
    team_id: TeamId,
    response: &HiddenStateResponse,
    expected: &ExpectedHiddenState,
    last_merkle_root: SignedRoot,
) -> HiddenLookupResult {
    match response.latest_link_seqno {
        None => {
            if expected.has_rotated() {
                // Caller has signed hidden links the server cannot show.
                // Transient during publication; the caller bounds how long
                // it will tolerate this via the freshness poller.
                warn!(
                    team = %team_id,
                    expected = %expected.seqno,
                    "hidden record absent for team expected to have one"
                );
                HiddenLookupResult {
                    response_type: HiddenResponseType::Absent,
                    uncommitted_seqno: 0,
                    last_merkle_root,
                }
            } else {
                HiddenLookupResult {
                    response_type: HiddenResponseType::None,
                    uncommitted_seqno: 0,
                    last_merkle_root,
                }
            }
        }
        Some(latest) if latest == Seqno::ZERO => {
            // A record claiming "latest link 0" is the same as no record.
            HiddenLookupResult {
                response_type: if expected.has_rotated() {
                    HiddenResponseType::Absent
                } else {
                    HiddenResponseType::None
                },
                uncommitted_seqno: 0,
                last_merkle_root,
            }
        }
        Some(latest) => {
            let pending = latest.gap_since(response.root.committed_seqno);
            debug!(
                team = %team_id,
                latest = %latest,
                committed = %response.root.committed_seqno,
                pending,
                "hidden reconciliation"
            );
            HiddenLookupResult {
                response_type: HiddenResponseType::Ok,
                uncommitted_seqno: pending,
                last_merkle_root,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use grove_core::{hash_leaf, HiddenRoot};
    use rand::rngs::OsRng;

    fn fixture(committed: u64, latest: Option<u64>) -> (HiddenStateResponse, SignedRoot) {
        let key = SigningKey::generate(&mut OsRng);
        let root = HiddenRoot::sign(Seqno(committed), hash_leaf(b"hidden"), &key).unwrap();
        let merkle_root = SignedRoot::sign(Seqno(10), hash_leaf(b"main"), 1, &key).unwrap();
        (
            HiddenStateResponse {
                root,
                latest_link_seqno: latest.map(Seqno),
            },
            merkle_root,
        )
    }

    #[test]
    fn never_rotated_classifies_none() {
        let (resp, root) = fixture(0, None);
        let result = reconcile_hidden(
            TeamId::new(),
            &resp,
            &ExpectedHiddenState::never_rotated(),
            root,
        );
        assert_eq!(result.response_type, HiddenResponseType::None);
        assert_eq!(result.uncommitted_seqno, 0);
    }

    #[test]
    fn missing_expected_record_classifies_absent() {
        let (resp, root) = fixture(0, None);
        let result = reconcile_hidden(
            TeamId::new(),
            &resp,
            &ExpectedHiddenState { seqno: Seqno(1) },
            root,
        );
        assert_eq!(result.response_type, HiddenResponseType::Absent);
        assert_eq!(result.uncommitted_seqno, 0);
    }

    #[test]
    fn pending_rotation_counts_uncommitted() {
        let (resp, root) = fixture(0, Some(1));
        let result = reconcile_hidden(
            TeamId::new(),
            &resp,
            &ExpectedHiddenState { seqno: Seqno(1) },
            root,
        );
        assert_eq!(result.response_type, HiddenResponseType::Ok);
        assert_eq!(result.uncommitted_seqno, 1);
    }

    #[test]
    fn committed_rotation_resets_to_zero() {
        let (resp, root) = fixture(1, Some(1));
        let result = reconcile_hidden(
            TeamId::new(),
            &resp,
            &ExpectedHiddenState { seqno: Seqno(1) },
            root,
        );
        assert_eq!(result.response_type, HiddenResponseType::Ok);
        assert_eq!(result.uncommitted_seqno, 0);
    }

    #[test]
    fn boundary_ahead_of_latest_clamps_at_zero() {
        // A rebuild may fold links the caller has not observed yet.
        let (resp, root) = fixture(3, Some(2));
        let result = reconcile_hidden(
            TeamId::new(),
            &resp,
            &ExpectedHiddenState { seqno: Seqno(2) },
            root,
        );
        assert_eq!(result.response_type, HiddenResponseType::Ok);
        assert_eq!(result.uncommitted_seqno, 0);
    }
}
