//! Verified-root cache
//!
//! The root store is the only mutable shared state in the client. It holds
//! the most recent *verified* main root plus, per team, the most recent
//! verified hidden root, and refuses to install anything that regresses a
//! previously observed sequence number, so concurrent lookups always agree
//! on a single monotonic history of roots within a process lifetime. The
//! main root is process-global; hidden committed boundaries advance
//! independently per team, so their monotonicity is keyed by team id.
//!
//! Installation is compare-and-install under a write lock: two concurrent
//! fetches can never regress each other, and readers are never blocked by
//! anything slower than a lock acquisition.

use ed25519_dalek::VerifyingKey;
use grove_core::{GroveError, HiddenRoot, Result, SignedRoot, TeamId};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Explicit session context for verification
///
/// Carries the trust anchors a verifying session needs, injected by the
/// caller rather than read from ambient global state. Today that is the
/// tree builder's root signing key.
#[derive(Debug, Clone)]
pub struct VerifierContext {
    /// Key the tree builder signs both trees' roots with
    pub root_signer: VerifyingKey,
}

impl VerifierContext {
    /// Create a context trusting the given root signer
    pub fn new(root_signer: VerifyingKey) -> Self {
        Self { root_signer }
    }
}

#[derive(Debug, Default)]
struct Slots {
    main: Option<SignedRoot>,
    hidden: HashMap<TeamId, HiddenRoot>,
}

/// Cache of the most recent verified roots (main and per-team hidden)
#[derive(Debug)]
pub struct RootStore {
    ctx: VerifierContext,
    slots: RwLock<Slots>,
}

impl RootStore {
    /// Create an empty store trusting the context's root signer
    pub fn new(ctx: VerifierContext) -> Self {
        Self {
            ctx,
            slots: RwLock::new(Slots::default()),
        }
    }

    /// The most recent verified main root, if any has been observed
    pub fn current_root(&self) -> Option<SignedRoot> {
        self.slots.read().main.clone()
    }

    /// The most recent verified hidden root for a team, if any has been
    /// observed
    pub fn current_hidden_root(&self, team_id: TeamId) -> Option<HiddenRoot> {
        self.slots.read().hidden.get(&team_id).cloned()
    }

    /// Verify and install a newly fetched main root
    ///
    /// The signature check runs before the lock is taken; an unverifiable
    /// signature is a trust failure and the root never touches the cache.
    /// A root older than the cached one is rejected as stale. Re-observing
    /// the cached root is a no-op; a *different* root at the cached seqno
    /// is server equivocation and is rejected.
    pub fn observe(&self, root: SignedRoot) -> Result<()> {
        root.verify_signature(&self.ctx.root_signer)?;

        let mut slots = self.slots.write();
        if let Some(current) = &slots.main {
            if root.seqno < current.seqno {
                warn!(
                    fetched = %root.seqno,
                    current = %current.seqno,
                    "rejecting regressed main root"
                );
                return Err(GroveError::stale_root(format!(
                    "fetched root seqno {} regresses current {}",
                    root.seqno, current.seqno
                )));
            }
            if root.seqno == current.seqno {
                if root.root_hash.ct_eq(&current.root_hash) {
                    return Ok(());
                }
                return Err(GroveError::stale_root(format!(
                    "conflicting root hashes at seqno {}",
                    root.seqno
                )));
            }
        }
        debug!(seqno = %root.seqno, hash = %root.root_hash, "installing main root");
        slots.main = Some(root);
        Ok(())
    }

    /// Verify and install a newly fetched hidden root for a team
    ///
    /// Same contract as [`RootStore::observe`], keyed on the team's
    /// committed boundary instead of a publication seqno. Boundaries for
    /// different teams advance independently; one team's rebuild must
    /// never invalidate another's lookup.
    pub fn observe_hidden(&self, team_id: TeamId, root: HiddenRoot) -> Result<()> {
        root.verify_signature(&self.ctx.root_signer)?;

        let mut slots = self.slots.write();
        if let Some(current) = slots.hidden.get(&team_id) {
            if root.committed_seqno < current.committed_seqno {
                warn!(
                    team = %team_id,
                    fetched = %root.committed_seqno,
                    current = %current.committed_seqno,
                    "rejecting regressed hidden root"
                );
                return Err(GroveError::stale_root(format!(
                    "fetched hidden root boundary {} for {} regresses current {}",
                    root.committed_seqno, team_id, current.committed_seqno
                )));
            }
            if root.committed_seqno == current.committed_seqno {
                if root.hash.ct_eq(&current.hash) {
                    return Ok(());
                }
                return Err(GroveError::stale_root(format!(
                    "conflicting hidden roots for {} at boundary {}",
                    team_id, root.committed_seqno
                )));
            }
        }
        debug!(team = %team_id, boundary = %root.committed_seqno, "installing hidden root");
        slots.hidden.insert(team_id, root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ed25519_dalek::SigningKey;
    use grove_core::{hash_leaf, Seqno};
    use rand::rngs::OsRng;

    fn store_and_key() -> (RootStore, SigningKey) {
        let key = SigningKey::generate(&mut OsRng);
        let store = RootStore::new(VerifierContext::new(key.verifying_key()));
        (store, key)
    }

    fn signed_root(key: &SigningKey, seqno: u64, label: &[u8]) -> SignedRoot {
        SignedRoot::sign(Seqno(seqno), hash_leaf(label), seqno * 1000, key)
            .expect("signing succeeds")
    }

    #[test]
    fn installs_advancing_roots() {
        let (store, key) = store_and_key();
        store.observe(signed_root(&key, 1, b"r1")).unwrap();
        store.observe(signed_root(&key, 3, b"r3")).unwrap();
        assert_eq!(store.current_root().unwrap().seqno, Seqno(3));
    }

    #[test]
    fn rejects_regression_and_keeps_current() {
        let (store, key) = store_and_key();
        store.observe(signed_root(&key, 5, b"r5")).unwrap();
        let err = store.observe(signed_root(&key, 4, b"r4")).unwrap_err();
        assert_matches!(err, GroveError::StaleRoot { .. });
        assert_eq!(store.current_root().unwrap().seqno, Seqno(5));
    }

    #[test]
    fn reobserving_same_root_is_noop() {
        let (store, key) = store_and_key();
        let root = signed_root(&key, 2, b"r2");
        store.observe(root.clone()).unwrap();
        store.observe(root).unwrap();
    }

    #[test]
    fn rejects_equivocation_at_same_seqno() {
        let (store, key) = store_and_key();
        store.observe(signed_root(&key, 2, b"r2")).unwrap();
        let err = store.observe(signed_root(&key, 2, b"other")).unwrap_err();
        assert_matches!(err, GroveError::StaleRoot { .. });
    }

    #[test]
    fn rejects_untrusted_signer_before_install() {
        let (store, _) = store_and_key();
        let rogue = SigningKey::generate(&mut OsRng);
        let err = store.observe(signed_root(&rogue, 1, b"r1")).unwrap_err();
        assert_matches!(err, GroveError::SignatureVerification { .. });
        assert!(store.current_root().is_none());
    }

    #[test]
    fn hidden_roots_are_monotonic_per_team() {
        let (store, key) = store_and_key();
        let team = TeamId::new();
        let h2 = HiddenRoot::sign(Seqno(2), hash_leaf(b"h2"), &key).unwrap();
        let h1 = HiddenRoot::sign(Seqno(1), hash_leaf(b"h1"), &key).unwrap();
        store.observe_hidden(team, h2).unwrap();
        let err = store.observe_hidden(team, h1).unwrap_err();
        assert_matches!(err, GroveError::StaleRoot { .. });
        assert_eq!(
            store.current_hidden_root(team).unwrap().committed_seqno,
            Seqno(2)
        );
    }

    #[test]
    fn hidden_boundaries_advance_independently_per_team() {
        let (store, key) = store_and_key();
        let rotated = TeamId::new();
        let quiet = TeamId::new();
        let high = HiddenRoot::sign(Seqno(5), hash_leaf(b"rotated"), &key).unwrap();
        let low = HiddenRoot::sign(Seqno(1), hash_leaf(b"quiet"), &key).unwrap();
        store.observe_hidden(rotated, high).unwrap();
        // A lower boundary for a different team is not a regression.
        store.observe_hidden(quiet, low).unwrap();
        assert_eq!(
            store.current_hidden_root(rotated).unwrap().committed_seqno,
            Seqno(5)
        );
        assert_eq!(
            store.current_hidden_root(quiet).unwrap().committed_seqno,
            Seqno(1)
        );
        assert!(store.current_hidden_root(TeamId::new()).is_none());
    }
}
