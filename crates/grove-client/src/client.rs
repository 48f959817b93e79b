//! Lookup orchestration
//!
//! The merkle client ties the pieces together: fetch a root, install it
//! into the root store (signature + monotonicity checks), fetch the
//! team's leaf and proof at that root, verify inclusion, cross-check the
//! caller's reconstructed chain, and optionally reconcile the hidden
//! tree. Each successful lookup leaves the root store at least as fresh
//! as it found it; no other shared state is touched.

use crate::hidden::reconcile_hidden;
use crate::proof::verify_inclusion;
use crate::root_store::{RootStore, VerifierContext};
use crate::transport::MerkleTransport;
use grove_core::{
    ExpectedChainState, ExpectedHiddenState, GroveError, HiddenLookupResult, Result, SignedRoot,
    TeamId, TeamLeaf,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Client-side deadlines
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline applied to each individual transport call
    pub fetch_deadline: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            fetch_deadline: Duration::from_secs(10),
        }
    }
}

/// Verifying client for team lookups against the published trees
#[derive(Clone)]
pub struct MerkleClient {
    transport: Arc<dyn MerkleTransport>,
    store: Arc<RootStore>,
    config: ClientConfig,
}

impl MerkleClient {
    /// Create a client with default deadlines
    pub fn new(transport: Arc<dyn MerkleTransport>, ctx: VerifierContext) -> Self {
        Self::with_config(transport, ctx, ClientConfig::default())
    }

    /// Create a client with explicit deadlines
    pub fn with_config(
        transport: Arc<dyn MerkleTransport>,
        ctx: VerifierContext,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            store: Arc::new(RootStore::new(ctx)),
            config,
        }
    }

    /// Read access to the verified-root cache, for diagnostics
    pub fn root_store(&self) -> &Arc<RootStore> {
        &self.store
    }

    /// Bound a transport call with the configured deadline
    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.fetch_deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(GroveError::transport(format!(
                "{what} exceeded deadline of {:?}",
                self.config.fetch_deadline
            ))),
        }
    }

    /// Look up and verify a team's main-tree leaf
    ///
    /// On success the returned leaf is proven included under a signed,
    /// monotonically observed root, and its private chain pointer equals
    /// `expected`. All divergence surfaces as a typed error; nothing is
    /// silently reconciled.
    pub async fn lookup_team(
        &self,
        team_id: TeamId,
        expected: &ExpectedChainState,
    ) -> Result<TeamLeaf> {
        let (leaf, _root) = self.lookup_verified_leaf(team_id, expected).await?;
        Ok(leaf)
    }

    /// Look up a team and additionally reconcile the hidden tree
    ///
    /// Returns the verified leaf, the hidden classification, and the
    /// main-tree root this lookup actually validated against (not merely
    /// the latest cached value), so the caller holds a causally
    /// consistent snapshot.
    pub async fn lookup_team_with_hidden(
        &self,
        team_id: TeamId,
        expected: &ExpectedChainState,
        expected_hidden: &ExpectedHiddenState,
    ) -> Result<(TeamLeaf, HiddenLookupResult, SignedRoot)> {
        let (leaf, root) = self.lookup_verified_leaf(team_id, expected).await?;

        let hidden_state = self
            .bounded(
                "hidden state fetch",
                self.transport.fetch_hidden_state(team_id, None),
            )
            .await?;
        self.store.observe_hidden(team_id, hidden_state.root.clone())?;

        let result = reconcile_hidden(team_id, &hidden_state, expected_hidden, root.clone());
        info!(
            team = %team_id,
            response = ?result.response_type,
            uncommitted = result.uncommitted_seqno,
            "hidden lookup complete"
        );
        Ok((leaf, result, root))
    }

    /// Shared main-tree path: root, leaf, proof, identity, chain check
    async fn lookup_verified_leaf(
        &self,
        team_id: TeamId,
        expected: &ExpectedChainState,
    ) -> Result<(TeamLeaf, SignedRoot)> {
        let root = self
            .bounded("root fetch", self.transport.fetch_root(None))
            .await?;
        self.store.observe(root.clone())?;

        let (leaf, proof) = self
            .bounded(
                "leaf fetch",
                self.transport.fetch_leaf_and_proof(team_id, root.seqno),
            )
            .await?;

        if leaf.team_id != team_id {
            return Err(GroveError::corrupt_proof(format!(
                "requested {} but server returned leaf for {}",
                team_id, leaf.team_id
            )));
        }

        let encoding = leaf.canonical_bytes()?;
        if !verify_inclusion(&encoding, &proof, &root.root_hash) {
            return Err(GroveError::corrupt_proof(format!(
                "inclusion proof for {} does not recompute to root {}",
                team_id, root.seqno
            )));
        }

        let pointer = leaf.private.ok_or_else(|| {
            GroveError::not_yet_published(format!(
                "tree has no private chain for {team_id} yet; builder may not have published"
            ))
        })?;
        if !pointer.matches(expected) {
            return Err(GroveError::chain_mismatch(format!(
                "tree proves {pointer} but local chain expects link {} @ seqno {}",
                expected.link_id, expected.seqno
            )));
        }

        debug!(team = %team_id, root = %root.seqno, "leaf verified");
        Ok((leaf, root))
    }
}
