//! Inclusion proofs
//!
//! A proof is the ordered sibling path from a leaf to the root, each step
//! tagged with which side the sibling sits on. Proofs arrive from the
//! server and are consumed once per verification; nothing here checks
//! anything, verification lives in the client crate.

use crate::hash::Digest32;
use serde::{Deserialize, Serialize};

/// Which side of the current node a sibling digest sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Sibling is the left child; current node is the right
    Left,
    /// Sibling is the right child; current node is the left
    Right,
}

/// One step of a sibling path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling digest at this level
    pub sibling: Digest32,
    /// Orientation of the sibling relative to the path
    pub side: Side,
}

/// Sibling path from a leaf to a claimed root
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Steps ordered leaf-first
    pub steps: Vec<ProofStep>,
}

impl InclusionProof {
    /// Empty proof, valid only for a single-leaf tree
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Number of levels between the leaf and the root
    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}
