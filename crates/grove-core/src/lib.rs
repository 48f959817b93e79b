//! Grove Core - Verification Domain Types
//!
//! This crate provides the foundational types shared by the Grove tree
//! verification stack: identifiers, fixed-size digests, team chain pointers,
//! leaf and proof structures, signed root envelopes, and the unified error
//! type. It contains no network or verification logic; everything here is
//! plain data plus the canonical encodings that verification operates on.
//!
//! # Trust Model
//!
//! Every type in this crate that arrives over the wire (roots, leaves,
//! proofs, hidden-tree state) is untrusted until the client crate has
//! verified it. Types therefore carry no "verified" flag; trust is
//! established by *where* a value came from (e.g. a root handed out by the
//! root store has already passed signature and monotonicity checks).

#![forbid(unsafe_code)]

/// Team and sequence identifiers
pub mod identifiers;

/// Fixed-size digests and the tree hashing algorithm
pub mod hash;

/// Signature-chain pointers and rotation tagging
pub mod chain;

/// Team leaves and their canonical encoding
pub mod leaf;

/// Inclusion proofs (sibling path with orientation)
pub mod proof;

/// Signed main-tree roots
pub mod root;

/// Hidden (blind) tree state
pub mod hidden;

/// Unified error handling
pub mod errors;

pub use chain::{ChainPointer, ExpectedChainState, ExpectedHiddenState, RotationType};
pub use errors::{GroveError, Result};
pub use hash::{hash_interior, hash_leaf, Digest32};
pub use hidden::{HiddenLookupResult, HiddenResponseType, HiddenRoot};
pub use identifiers::{Seqno, TeamId};
pub use leaf::TeamLeaf;
pub use proof::{InclusionProof, ProofStep, Side};
pub use root::SignedRoot;
