//! Unified error system for Grove
//!
//! One error type for the whole verification stack, with a variant per
//! failure kind so callers can route on what went wrong. Verification
//! failures are values, not panics: everything a malicious or lagging
//! server can trigger comes back through this enum.

use serde::{Deserialize, Serialize};

/// Unified error type for all Grove operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum GroveError {
    /// A fetched root regresses the previously observed sequence number.
    /// Non-fatal; the caller may retry with a fresh fetch but must not
    /// trust the regressed root.
    #[error("Stale root: {message}")]
    StaleRoot {
        /// What regressed and by how much
        message: String,
    },

    /// Root signature invalid or signed by an untrusted key. Fatal for
    /// the implicated root; never retried automatically.
    #[error("Signature verification failed: {message}")]
    SignatureVerification {
        /// Which root failed and why
        message: String,
    },

    /// Inclusion proof fails to recompute to the claimed root, or the
    /// returned leaf does not match the request. Fatal for this lookup,
    /// safe to retry against a fresh root fetch.
    #[error("Corrupt proof: {message}")]
    CorruptProof {
        /// What failed to verify
        message: String,
    },

    /// Verified leaf's chain pointer disagrees with the caller's expected
    /// chain state. The local chain is stale or forked; surfaced, never
    /// silently reconciled.
    #[error("Chain mismatch: {message}")]
    ChainMismatch {
        /// Expected vs. proven pointer
        message: String,
    },

    /// Freshness poller exceeded its deadline (or was cancelled) before
    /// the tree builder published the awaited root generation.
    #[error("Publication timeout: {message}")]
    PublicationTimeout {
        /// What was awaited
        message: String,
    },

    /// The tree has not yet published a chain for this team. Retryable;
    /// distinct from a chain mismatch.
    #[error("Not yet published: {message}")]
    NotYetPublished {
        /// Which team is awaiting publication
        message: String,
    },

    /// Transport-level failure (connection, deadline, malformed frame).
    /// Transient; retry policy belongs to the caller or transport.
    #[error("Transport error: {message}")]
    Transport {
        /// Underlying transport failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// What failed to encode or decode
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the violated invariant
        message: String,
    },
}

impl GroveError {
    /// Create a stale-root error
    pub fn stale_root(message: impl Into<String>) -> Self {
        Self::StaleRoot {
            message: message.into(),
        }
    }

    /// Create a signature-verification error
    pub fn signature_verification(message: impl Into<String>) -> Self {
        Self::SignatureVerification {
            message: message.into(),
        }
    }

    /// Create a corrupt-proof error
    pub fn corrupt_proof(message: impl Into<String>) -> Self {
        Self::CorruptProof {
            message: message.into(),
        }
    }

    /// Create a chain-mismatch error
    pub fn chain_mismatch(message: impl Into<String>) -> Self {
        Self::ChainMismatch {
            message: message.into(),
        }
    }

    /// Create a publication-timeout error
    pub fn publication_timeout(message: impl Into<String>) -> Self {
        Self::PublicationTimeout {
            message: message.into(),
        }
    }

    /// Create a not-yet-published error
    pub fn not_yet_published(message: impl Into<String>) -> Self {
        Self::NotYetPublished {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller may retry the failed operation
    ///
    /// Signature failures and chain mismatches are trust or consistency
    /// faults that retrying cannot fix; everything else is worth another
    /// attempt against fresh server state.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::SignatureVerification { .. } | Self::ChainMismatch { .. }
        )
    }
}

/// Standard Result type for Grove operations
pub type Result<T> = std::result::Result<T, GroveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failures_are_not_retryable() {
        assert!(!GroveError::signature_verification("bad").is_retryable());
        assert!(!GroveError::chain_mismatch("fork").is_retryable());
        assert!(GroveError::stale_root("regressed").is_retryable());
        assert!(GroveError::corrupt_proof("bad path").is_retryable());
        assert!(GroveError::publication_timeout("slow").is_retryable());
    }
}
