//! In-memory tree builder and transport
//!
//! Maintains team chains and publishes both trees the way the production
//! architect does, just synchronously and on demand:
//!
//! - visible rotations republish the main tree immediately,
//! - hidden rotations are attested at once but stay uncommitted until an
//!   explicit [`InMemoryArchitect::rebuild_hidden`],
//! - the main tree only ever shows links that are visible or already
//!   folded through a hidden rebuild.
//!
//! Root history is retained so stale-root and pinned-seqno fetches can be
//! exercised. Every response goes through real tree construction and real
//! signatures; fault injection corrupts the output *after* honest
//! construction, the way a tampering server would.

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use grove_client::{HiddenStateResponse, MerkleTransport, VerifierContext};
use grove_core::{
    hash_interior, hash_leaf, ChainPointer, Digest32, ExpectedChainState, ExpectedHiddenState,
    GroveError, HiddenRoot, InclusionProof, ProofStep, Result, RotationType, Seqno, Side, SignedRoot,
    TeamId, TeamLeaf,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

/// Ways the architect can misbehave, opt-in per test
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultPlan {
    /// Flip a byte of every served inclusion proof
    pub corrupt_proofs: bool,
    /// Serve leaves under a team id different from the request
    pub misdirect_leaf: bool,
    /// Claim no hidden record exists regardless of actual state
    pub drop_hidden_record: bool,
    /// Serve the previous publication instead of the latest root
    pub serve_previous_root: bool,
}

#[derive(Debug, Clone)]
struct Link {
    pointer: ChainPointer,
    rotation: RotationType,
    /// 1-based position in the team's hidden chain, for hidden links
    hidden_index: u64,
}

#[derive(Debug, Default)]
struct TeamRecord {
    links: Vec<Link>,
    hidden_latest: u64,
    hidden_committed: u64,
}

impl TeamRecord {
    /// Tip of the chain as the main tree may publish it: the longest
    /// prefix containing only visible links and committed hidden links.
    fn publishable_tip(&self) -> Option<ChainPointer> {
        self.links
            .iter()
            .take_while(|link| match link.rotation {
                RotationType::Visible => true,
                RotationType::Hidden => link.hidden_index <= self.hidden_committed,
            })
            .last()
            .map(|link| link.pointer)
    }
}

/// One published main-tree generation
#[derive(Debug, Clone)]
struct Publication {
    root: SignedRoot,
    order: Vec<TeamId>,
    leaves: BTreeMap<TeamId, TeamLeaf>,
    levels: Vec<Vec<Digest32>>,
}

struct State {
    signing_key: SigningKey,
    teams: BTreeMap<TeamId, TeamRecord>,
    publications: Vec<Publication>,
    clock_ms: u64,
    faults: FaultPlan,
}

/// Deterministic in-memory architect
///
/// Wrap in an `Arc` to share one tree state between the client under
/// test and the test body, mirroring a single server observed by many
/// clients.
pub struct InMemoryArchitect {
    state: Mutex<State>,
}

impl InMemoryArchitect {
    /// Create an architect with a fresh signing key
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            state: Mutex::new(State {
                signing_key,
                teams: BTreeMap::new(),
                publications: Vec::new(),
                clock_ms: 1_700_000_000_000,
                faults: FaultPlan::default(),
            }),
        }
    }

    /// Verifier context trusting this architect's signing key
    pub fn verifier_context(&self) -> VerifierContext {
        VerifierContext::new(self.state.lock().signing_key.verifying_key())
    }

    /// Replace the fault plan
    pub fn inject(&self, faults: FaultPlan) {
        self.state.lock().faults = faults;
    }

    /// Register a team with an empty chain (tree shows no private state)
    pub fn register_team(&self) -> Result<TeamId> {
        let team_id = TeamId::new();
        let mut state = self.state.lock();
        state.teams.insert(team_id, TeamRecord::default());
        Self::publish_locked(&mut state)?;
        Ok(team_id)
    }

    /// Create a team with its first chain link published
    pub fn create_team(&self) -> Result<TeamId> {
        let team_id = self.register_team()?;
        self.rotate(team_id, RotationType::Visible)?;
        Ok(team_id)
    }

    /// Append a chain link for the team
    ///
    /// Visible rotations republish the main tree immediately. Hidden
    /// rotations are attested (the hidden latest-link seqno advances) but
    /// remain uncommitted until [`InMemoryArchitect::rebuild_hidden`].
    pub fn rotate(&self, team_id: TeamId, rotation: RotationType) -> Result<()> {
        let mut state = self.state.lock();
        let record = state
            .teams
            .get_mut(&team_id)
            .ok_or_else(|| GroveError::internal(format!("unknown team {team_id}")))?;

        let seqno = Seqno(record.links.len() as u64 + 1);
        let hidden_index = match rotation {
            RotationType::Visible => 0,
            RotationType::Hidden => {
                record.hidden_latest += 1;
                record.hidden_latest
            }
        };
        let label = format!("{team_id}:{seqno}:{rotation:?}");
        record.links.push(Link {
            pointer: ChainPointer {
                seqno,
                link_id: hash_leaf(format!("link:{label}").as_bytes()),
                sig_id: hash_leaf(format!("sig:{label}").as_bytes()),
            },
            rotation,
            hidden_index,
        });
        debug!(team = %team_id, %seqno, ?rotation, "link appended");

        if rotation == RotationType::Visible {
            Self::publish_locked(&mut state)?;
        }
        Ok(())
    }

    /// Fold every attested hidden link into the committed hidden tree and
    /// republish the main tree so leaves reflect the folded links
    pub fn rebuild_hidden(&self) -> Result<()> {
        let mut state = self.state.lock();
        for record in state.teams.values_mut() {
            record.hidden_committed = record.hidden_latest;
        }
        Self::publish_locked(&mut state)?;
        Ok(())
    }

    /// Republish the main tree from current publishable chain tips
    pub fn publish_main(&self) -> Result<SignedRoot> {
        let mut state = self.state.lock();
        Self::publish_locked(&mut state)
    }

    /// Chain state a caller's loader would reconstruct as tree-proven:
    /// the team's publishable tip
    pub fn published_chain_state(&self, team_id: TeamId) -> Result<ExpectedChainState> {
        let state = self.state.lock();
        let record = state
            .teams
            .get(&team_id)
            .ok_or_else(|| GroveError::internal(format!("unknown team {team_id}")))?;
        let tip = record.publishable_tip().ok_or_else(|| {
            GroveError::internal(format!("team {team_id} has no publishable links"))
        })?;
        Ok(ExpectedChainState {
            seqno: tip.seqno,
            link_id: tip.link_id,
        })
    }

    /// The caller's view of its hidden chain (latest signed hidden link)
    pub fn hidden_chain_state(&self, team_id: TeamId) -> Result<ExpectedHiddenState> {
        let state = self.state.lock();
        let record = state
            .teams
            .get(&team_id)
            .ok_or_else(|| GroveError::internal(format!("unknown team {team_id}")))?;
        Ok(ExpectedHiddenState {
            seqno: Seqno(record.hidden_latest),
        })
    }

    /// Committed hidden boundary for the team, as the architect knows it
    pub fn committed_hidden_seqno(&self, team_id: TeamId) -> Result<Seqno> {
        let state = self.state.lock();
        let record = state
            .teams
            .get(&team_id)
            .ok_or_else(|| GroveError::internal(format!("unknown team {team_id}")))?;
        Ok(Seqno(record.hidden_committed))
    }

    fn publish_locked(state: &mut State) -> Result<SignedRoot> {
        let mut order = Vec::with_capacity(state.teams.len());
        let mut leaves = BTreeMap::new();
        let mut digests = Vec::with_capacity(state.teams.len());
        for (team_id, record) in &state.teams {
            let leaf = TeamLeaf {
                team_id: *team_id,
                private: record.publishable_tip(),
                public: None,
            };
            digests.push(hash_leaf(&leaf.canonical_bytes()?));
            order.push(*team_id);
            leaves.insert(*team_id, leaf);
        }

        let levels = build_levels(digests);
        let root_hash = levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Digest32::ZERO);

        let seqno = Seqno(state.publications.len() as u64 + 1);
        state.clock_ms += 1_000;
        let root = SignedRoot::sign(seqno, root_hash, state.clock_ms, &state.signing_key)?;
        debug!(%seqno, teams = order.len(), "main tree published");

        state.publications.push(Publication {
            root: root.clone(),
            order,
            leaves,
            levels,
        });
        Ok(root)
    }
}

#[async_trait]
impl MerkleTransport for InMemoryArchitect {
    async fn fetch_root(&self, seqno: Option<Seqno>) -> Result<SignedRoot> {
        let state = self.state.lock();
        let publications = &state.publications;
        if publications.is_empty() {
            return Err(GroveError::transport("no root published yet"));
        }
        let publication = match seqno {
            Some(wanted) => publications
                .iter()
                .find(|p| p.root.seqno == wanted)
                .ok_or_else(|| GroveError::transport(format!("no root at seqno {wanted}")))?,
            None if state.faults.serve_previous_root && publications.len() > 1 => {
                &publications[publications.len() - 2]
            }
            None => &publications[publications.len() - 1],
        };
        Ok(publication.root.clone())
    }

    async fn fetch_leaf_and_proof(
        &self,
        team_id: TeamId,
        root_seqno: Seqno,
    ) -> Result<(TeamLeaf, InclusionProof)> {
        let state = self.state.lock();
        let publication = state
            .publications
            .iter()
            .find(|p| p.root.seqno == root_seqno)
            .ok_or_else(|| GroveError::transport(format!("no root at seqno {root_seqno}")))?;
        let index = publication
            .order
            .iter()
            .position(|id| *id == team_id)
            .ok_or_else(|| GroveError::transport(format!("no leaf for {team_id}")))?;
        let mut leaf = publication.leaves[&team_id].clone();
        let mut proof = prove(&publication.levels, index);

        if state.faults.misdirect_leaf {
            leaf.team_id = TeamId::new();
        }
        if state.faults.corrupt_proofs {
            corrupt(&mut proof);
        }
        Ok((leaf, proof))
    }

    async fn fetch_hidden_state(
        &self,
        team_id: TeamId,
        hidden_root_seqno: Option<Seqno>,
    ) -> Result<HiddenStateResponse> {
        let state = self.state.lock();
        let record = state
            .teams
            .get(&team_id)
            .ok_or_else(|| GroveError::transport(format!("no hidden record for {team_id}")))?;

        let committed = Seqno(record.hidden_committed);
        if let Some(wanted) = hidden_root_seqno {
            if wanted != committed {
                return Err(GroveError::transport(format!(
                    "hidden root at boundary {wanted} no longer available"
                )));
            }
        }

        // The hidden root commits to the team's folded hidden links.
        let mut hash = Digest32::ZERO;
        for link in &record.links {
            if link.rotation == RotationType::Hidden && link.hidden_index <= record.hidden_committed
            {
                hash = hash_interior(&hash, &link.pointer.link_id);
            }
        }
        let root = HiddenRoot::sign(committed, hash, &state.signing_key)?;

        let latest_link_seqno = if state.faults.drop_hidden_record || record.hidden_latest == 0 {
            None
        } else {
            Some(Seqno(record.hidden_latest))
        };
        Ok(HiddenStateResponse {
            root,
            latest_link_seqno,
        })
    }
}

/// Build tree levels bottom-up: pairwise interior hashing, odd node
/// promoted unchanged
fn build_levels(leaf_digests: Vec<Digest32>) -> Vec<Vec<Digest32>> {
    let mut levels = vec![leaf_digests];
    while levels
        .last()
        .map(|level| level.len() > 1)
        .unwrap_or(false)
    {
        let current = &levels[levels.len() - 1];
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        for pair in current.chunks(2) {
            match pair {
                [left, right] => next.push(hash_interior(left, right)),
                [odd] => next.push(*odd),
                _ => unreachable!("chunks(2) yields one or two items"),
            }
        }
        levels.push(next);
    }
    levels
}

/// Sibling path with orientation for the leaf at `index`
fn prove(levels: &[Vec<Digest32>], mut index: usize) -> InclusionProof {
    let mut steps = Vec::new();
    for level in &levels[..levels.len().saturating_sub(1)] {
        if index % 2 == 0 {
            if index + 1 < level.len() {
                steps.push(ProofStep {
                    sibling: level[index + 1],
                    side: Side::Right,
                });
            }
            // Odd node promoted unchanged: no step at this level.
        } else {
            steps.push(ProofStep {
                sibling: level[index - 1],
                side: Side::Left,
            });
        }
        index /= 2;
    }
    InclusionProof { steps }
}

/// Tamper with a proof the way a malicious server would
fn corrupt(proof: &mut InclusionProof) {
    match proof.steps.first_mut() {
        Some(step) => {
            let mut bytes = *step.sibling.as_bytes();
            bytes[0] ^= 0x01;
            step.sibling = Digest32::from_bytes(bytes);
        }
        None => {
            // Single-leaf tree: a corrupt server invents a path.
            proof.steps.push(ProofStep {
                sibling: Digest32::ZERO,
                side: Side::Right,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_signing_key;
    use grove_client::verify_inclusion;

    #[tokio::test]
    async fn proofs_verify_for_every_leaf_position() {
        let architect = InMemoryArchitect::new(generate_signing_key());
        // Odd team count exercises the promoted-node path.
        let teams: Vec<TeamId> = (0..5)
            .map(|_| architect.create_team().expect("create team"))
            .collect();

        let root = architect.fetch_root(None).await.expect("root");
        for team_id in teams {
            let (leaf, proof) = architect
                .fetch_leaf_and_proof(team_id, root.seqno)
                .await
                .expect("leaf and proof");
            let encoding = leaf.canonical_bytes().expect("encoding");
            assert!(
                verify_inclusion(&encoding, &proof, &root.root_hash),
                "proof for {team_id} must verify"
            );
        }
    }

    #[tokio::test]
    async fn root_seqno_advances_per_publication() {
        let architect = InMemoryArchitect::new(generate_signing_key());
        let team = architect.create_team().expect("create team");
        let first = architect.fetch_root(None).await.expect("root").seqno;
        architect
            .rotate(team, RotationType::Visible)
            .expect("rotate");
        let second = architect.fetch_root(None).await.expect("root").seqno;
        assert!(second > first);
    }
}
