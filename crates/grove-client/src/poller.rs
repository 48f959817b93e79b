//! Freshness polling against the tree builder
//!
//! The tree builder publishes on its own batched schedule, so a caller
//! that just performed a rotation cannot assume the next lookup sees it.
//! The poller re-runs hidden lookups until the committed hidden boundary
//! reaches a required sequence number, bounded by an explicit deadline
//! and cancellable at any suspend point. Call sites never block
//! indefinitely on server-side batching.

use crate::client::MerkleClient;
use grove_core::{
    ExpectedChainState, ExpectedHiddenState, GroveError, Result, Seqno, SignedRoot, TeamId,
};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Bounds on the poller's retry loop
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Total time to wait for the awaited publication
    pub timeout: Duration,
    /// Suspend between attempts
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Caller-held handle that abandons an in-flight wait
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal every token derived from this handle
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Derive a token to pass into a wait
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Cancellation token observed by the poll loop
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Resolve once the paired handle cancels
    async fn cancelled(&mut self) {
        // A token derived after the handle already fired starts with the
        // cancelled value marked seen, so check it before awaiting changes.
        if *self.rx.borrow() {
            return;
        }
        // An Err means the handle was dropped without cancelling; treat
        // that as "never cancelled" and park forever.
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
        futures::future::pending::<()>().await;
    }
}

/// Create a linked cancel handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Deadline-bounded waiter for hidden-tree publication
pub struct FreshnessPoller {
    client: MerkleClient,
    config: PollerConfig,
}

impl FreshnessPoller {
    /// Create a poller over an existing client
    pub fn new(client: MerkleClient, config: PollerConfig) -> Self {
        Self { client, config }
    }

    /// Wait until the hidden tree's committed boundary reaches
    /// `min_committed_seqno`
    ///
    /// Re-runs a full hidden lookup each round, so every observation is
    /// verified the same way a direct lookup would be. `expectations` is
    /// re-evaluated per attempt: a rebuild moves the caller's tree-proven
    /// chain view, so the chain loader must be consulted fresh each
    /// round rather than once up front. Returns the main-tree root of
    /// the satisfying lookup. Lookup failures keep the loop alive,
    /// including chain mismatches: while a publication is in flight the
    /// loader's view and the tree legitimately race, and the next round
    /// re-checks against fresh expectations. Only signature failures
    /// abort, since no amount of waiting fixes an untrusted root.
    ///
    /// Fails with [`GroveError::PublicationTimeout`] when the deadline
    /// elapses or `cancel` fires first.
    pub async fn await_rebuild<F>(
        &self,
        team_id: TeamId,
        expectations: F,
        min_committed_seqno: Seqno,
        mut cancel: Option<CancelToken>,
    ) -> Result<SignedRoot>
    where
        F: Fn() -> (ExpectedChainState, ExpectedHiddenState),
    {
        let deadline = Instant::now() + self.config.timeout;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let (expected, expected_hidden) = expectations();
            match self
                .client
                .lookup_team_with_hidden(team_id, &expected, &expected_hidden)
                .await
            {
                Ok((_leaf, _result, root)) => {
                    let committed = self
                        .client
                        .root_store()
                        .current_hidden_root(team_id)
                        .map(|h| h.committed_seqno)
                        .unwrap_or(Seqno::ZERO);
                    if committed >= min_committed_seqno {
                        info!(
                            team = %team_id,
                            committed = %committed,
                            attempts,
                            "awaited hidden publication observed"
                        );
                        return Ok(root);
                    }
                    debug!(
                        team = %team_id,
                        committed = %committed,
                        awaiting = %min_committed_seqno,
                        "hidden boundary not yet reached"
                    );
                }
                Err(e @ GroveError::SignatureVerification { .. }) => return Err(e),
                Err(e) => {
                    debug!(team = %team_id, error = %e, "transient failure while polling");
                }
            }

            let now = Instant::now();
            if now + self.config.poll_interval >= deadline {
                return Err(GroveError::publication_timeout(format!(
                    "hidden boundary {min_committed_seqno} for {team_id} not published within \
                     {:?} ({attempts} attempts)",
                    self.config.timeout
                )));
            }

            let cancelled = async {
                match cancel.as_mut() {
                    Some(token) => token.cancelled().await,
                    None => futures::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = sleep(self.config.poll_interval) => {}
                _ = cancelled => {
                    return Err(GroveError::publication_timeout(format!(
                        "wait for hidden boundary {min_committed_seqno} on {team_id} cancelled"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_token_resolves_after_cancel() {
        let (handle, mut token) = cancel_pair();
        handle.cancel();
        // Must resolve promptly rather than hang.
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("cancelled() resolves");
    }

    #[tokio::test]
    async fn token_derived_after_cancel_resolves() {
        let (handle, _token) = cancel_pair();
        handle.cancel();
        let mut late = handle.token();
        tokio::time::timeout(Duration::from_secs(1), late.cancelled())
            .await
            .expect("late-derived token observes the cancellation");
    }

    #[tokio::test]
    async fn uncancelled_token_stays_pending() {
        let (_handle, mut token) = cancel_pair();
        let outcome = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(outcome.is_err());
    }
}
