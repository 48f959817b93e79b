//! Hash-chain proof verification
//!
//! Stateless recomputation of an inclusion proof: hash the leaf encoding,
//! fold in each sibling according to its orientation flag, compare the
//! final digest against the expected root. Knows nothing about teams.
//!
//! Proofs come from an untrusted server, so nothing here errors or
//! panics: any malformed or mismatching input is simply `false`. The
//! final comparison is constant-time.

use grove_core::{hash_interior, hash_leaf, Digest32, InclusionProof, Side};

/// Upper bound on accepted proof depth
///
/// A 64-level path already covers 2^64 leaves; anything deeper is not a
/// proof from a real tree and is rejected before hashing.
const MAX_PROOF_DEPTH: usize = 64;

/// Verify that a leaf encoding is included under the expected root
///
/// Returns `true` exactly when recomputing the hash chain from
/// `leaf_encoding` through `proof` yields `expected_root`. Malformed
/// proofs (excessive depth) and mismatches both return `false`; callers
/// decide what failure means for them.
pub fn verify_inclusion(
    leaf_encoding: &[u8],
    proof: &InclusionProof,
    expected_root: &Digest32,
) -> bool {
    if proof.depth() > MAX_PROOF_DEPTH {
        return false;
    }

    let mut current = hash_leaf(leaf_encoding);
    for step in &proof.steps {
        current = match step.side {
            Side::Left => hash_interior(&step.sibling, &current),
            Side::Right => hash_interior(&current, &step.sibling),
        };
    }

    current.ct_eq(expected_root)
}
