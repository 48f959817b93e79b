//! Grove Client - Untrusting Tree Verification
//!
//! Everything between "server says X" and "we trust X": inclusion-proof
//! verification, signed-root caching with monotonicity, team lookups that
//! cross-check the caller's locally reconstructed chain, reconciliation of
//! the low-latency hidden tree against its committed boundary, and a
//! bounded poller for waiting out the tree builder's publication schedule.
//!
//! # Layering
//!
//! - [`proof`] — stateless hash-chain recomputation, no team knowledge
//! - [`root_store`] — verified-root cache, the only shared mutable state
//! - [`transport`] — the untrusted server boundary (async trait)
//! - [`client`] — lookup orchestration and the public API
//! - [`hidden`] — classification of hidden-tree responses
//! - [`poller`] — deadline-bounded waiting for root publication
//!
//! All server responses are treated as adversarial until verified; every
//! failure mode a server can trigger surfaces as a typed
//! [`grove_core::GroveError`], never a panic.

#![forbid(unsafe_code)]

/// Hash-chain proof verification
pub mod proof;

/// Verified-root cache with monotonicity enforcement
pub mod root_store;

/// Untrusted transport boundary
pub mod transport;

/// Lookup orchestration
pub mod client;

/// Hidden-tree reconciliation
pub mod hidden;

/// Freshness polling against the tree builder
pub mod poller;

pub use client::{ClientConfig, MerkleClient};
pub use hidden::reconcile_hidden;
pub use poller::{cancel_pair, CancelHandle, CancelToken, FreshnessPoller, PollerConfig};
pub use proof::verify_inclusion;
pub use root_store::{RootStore, VerifierContext};
pub use transport::{HiddenStateResponse, MerkleTransport};
