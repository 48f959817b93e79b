//! Property Tests: Proof Soundness
//!
//! `verify_inclusion` must hold exactly when recomputing the hash chain
//! from the leaf through the proof yields the expected root, and flipping
//! any single byte of the leaf, the proof, or the root must break it.

use grove_client::verify_inclusion;
use grove_core::{hash_interior, hash_leaf, Digest32, InclusionProof, ProofStep, Side};
use proptest::prelude::*;

/// Oracle: fold the path exactly as the tree defines parent hashing
fn recompute_root(leaf: &[u8], proof: &InclusionProof) -> Digest32 {
    let mut current = hash_leaf(leaf);
    for step in &proof.steps {
        current = match step.side {
            Side::Left => hash_interior(&step.sibling, &current),
            Side::Right => hash_interior(&current, &step.sibling),
        };
    }
    current
}

fn proof_strategy() -> impl Strategy<Value = InclusionProof> {
    proptest::collection::vec((any::<[u8; 32]>(), any::<bool>()), 0..16).prop_map(|raw| {
        InclusionProof {
            steps: raw
                .into_iter()
                .map(|(sibling, left)| ProofStep {
                    sibling: Digest32::from_bytes(sibling),
                    side: if left { Side::Left } else { Side::Right },
                })
                .collect(),
        }
    })
}

proptest! {
    #[test]
    fn honest_paths_always_verify(
        leaf in proptest::collection::vec(any::<u8>(), 0..256),
        proof in proof_strategy(),
    ) {
        let root = recompute_root(&leaf, &proof);
        prop_assert!(verify_inclusion(&leaf, &proof, &root));
    }

    #[test]
    fn corrupting_the_leaf_breaks_verification(
        leaf in proptest::collection::vec(any::<u8>(), 1..256),
        proof in proof_strategy(),
        byte_index in any::<prop::sample::Index>(),
    ) {
        let root = recompute_root(&leaf, &proof);
        let mut corrupted = leaf.clone();
        let index = byte_index.index(corrupted.len());
        corrupted[index] ^= 0x01;
        prop_assert!(!verify_inclusion(&corrupted, &proof, &root));
    }

    #[test]
    fn corrupting_a_sibling_breaks_verification(
        leaf in proptest::collection::vec(any::<u8>(), 0..256),
        proof in proof_strategy().prop_filter("needs at least one step", |p| !p.steps.is_empty()),
        step_index in any::<prop::sample::Index>(),
        byte_index in any::<prop::sample::Index>(),
    ) {
        let root = recompute_root(&leaf, &proof);
        let mut corrupted = proof.clone();
        let step = step_index.index(corrupted.steps.len());
        let mut bytes = *corrupted.steps[step].sibling.as_bytes();
        bytes[byte_index.index(bytes.len())] ^= 0x01;
        corrupted.steps[step].sibling = Digest32::from_bytes(bytes);
        prop_assert!(!verify_inclusion(&leaf, &corrupted, &root));
    }

    #[test]
    fn corrupting_the_root_breaks_verification(
        leaf in proptest::collection::vec(any::<u8>(), 0..256),
        proof in proof_strategy(),
        byte_index in any::<prop::sample::Index>(),
    ) {
        let root = recompute_root(&leaf, &proof);
        let mut bytes = *root.as_bytes();
        bytes[byte_index.index(bytes.len())] ^= 0x01;
        let corrupted = Digest32::from_bytes(bytes);
        prop_assert!(!verify_inclusion(&leaf, &proof, &corrupted));
    }

    #[test]
    fn flipping_one_orientation_breaks_verification(
        leaf in proptest::collection::vec(any::<u8>(), 0..256),
        proof in proof_strategy().prop_filter("needs at least one step", |p| !p.steps.is_empty()),
        step_index in any::<prop::sample::Index>(),
    ) {
        let root = recompute_root(&leaf, &proof);
        let mut flipped = proof.clone();
        let step = step_index.index(flipped.steps.len());
        flipped.steps[step].side = match flipped.steps[step].side {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        // Orientation only matters when sibling and current differ; with
        // random 32-byte siblings a collision is negligible.
        prop_assert!(!verify_inclusion(&leaf, &flipped, &root));
    }
}
