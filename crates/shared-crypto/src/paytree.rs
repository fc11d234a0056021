//! # PayTree Merkle Trees
//!
//! A PayTree commitment is the root of a binary Merkle tree with one leaf
//! per spendable index. The payment at index `i` reveals leaf `i` together
//! with its inclusion proof; the vendor folds the proof back to the root
//! in O(log N).
//!
//! Leaves are `H(i_be8 || secret || binding)` for `i = 1..=max_i`. The
//! fresh per-tree secret keeps leaves unguessable; `binding` is opaque
//! caller context (the client key fingerprint in practice) so identical
//! secrets under different contexts still commit to different roots.
//!
//! Leaf rows that are not a power of two are padded by duplicating the
//! last leaf. Internal nodes are `H(left || right)`.

use crate::errors::CryptoError;
use crate::hashing::{sha256_many, Digest};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Merkle inclusion proof: sibling hashes from leaf level to just below
/// the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// One sibling per level, leaf level first.
    pub siblings: Vec<Digest>,
}

/// Derive the leaf for index `i` (1-based).
pub fn derive_leaf(i: u64, secret: &[u8], binding: &[u8]) -> Digest {
    sha256_many(&[&i.to_be_bytes(), secret, binding])
}

/// Smallest power of two >= `n` (n > 0).
fn next_power_of_two(n: u64) -> u64 {
    n.next_power_of_two()
}

/// Number of proof levels for a tree over `max_i` leaves.
fn tree_depth(max_i: u64) -> u32 {
    next_power_of_two(max_i).trailing_zeros()
}

/// Verify an inclusion proof against a tree commitment.
///
/// Accepts iff `1 <= i <= max_i`, the proof has exactly one sibling per
/// level of the committed tree, and folding the siblings in the order
/// given by the binary representation of the leaf position reproduces the
/// root.
pub fn verify_proof(
    leaf: &Digest,
    i: u64,
    proof: &MerkleProof,
    root: &Digest,
    max_i: u64,
) -> bool {
    if i == 0 || i > max_i {
        return false;
    }
    if proof.siblings.len() != tree_depth(max_i) as usize {
        return false;
    }

    let mut current = *leaf;
    let mut position = i - 1;
    for sibling in &proof.siblings {
        current = if position % 2 == 0 {
            sha256_many(&[&current, sibling])
        } else {
            sha256_many(&[sibling, &current])
        };
        position /= 2;
    }
    current == *root
}

/// Client-side Merkle tree: all levels kept in memory for proof
/// extraction.
#[derive(Clone, Debug)]
pub struct Paytree {
    max_i: u64,
    /// `levels[0]` is the padded leaf row; the last level holds the root.
    levels: Vec<Vec<Digest>>,
}

impl Paytree {
    /// Build the tree over indices `1..=max_i` from an explicit secret.
    pub fn build(max_i: u64, secret: &[u8], binding: &[u8]) -> Result<Self, CryptoError> {
        if max_i == 0 {
            return Err(CryptoError::InvalidInput("max_i must be > 0".into()));
        }

        let mut leaves: Vec<Digest> = (1..=max_i).map(|i| derive_leaf(i, secret, binding)).collect();

        // Duplicate-last padding up to the next power of two.
        let padded = next_power_of_two(max_i) as usize;
        if let Some(&last) = leaves.last() {
            leaves.resize(padded, last);
        }

        let mut levels = vec![leaves];
        while levels
            .last()
            .map(|level| level.len() > 1)
            .unwrap_or(false)
        {
            let current = &levels[levels.len() - 1];
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| sha256_many(&[&pair[0], &pair[1]]))
                .collect();
            levels.push(next);
        }

        Ok(Self { max_i, levels })
    }

    /// Build the tree from a fresh random secret.
    pub fn generate(max_i: u64, binding: &[u8]) -> Result<Self, CryptoError> {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::build(max_i, &secret, binding)
    }

    /// The committed Merkle root.
    pub fn root(&self) -> Digest {
        self.levels[self.levels.len() - 1][0]
    }

    /// The leaf cap.
    pub fn max_i(&self) -> u64 {
        self.max_i
    }

    /// The leaf hash at index `i` (1-based).
    pub fn leaf(&self, i: u64) -> Result<Digest, CryptoError> {
        if i == 0 || i > self.max_i {
            return Err(CryptoError::InvalidInput(format!(
                "i={} out of range [1, {}]",
                i, self.max_i
            )));
        }
        Ok(self.levels[0][(i - 1) as usize])
    }

    /// The inclusion proof for index `i` (1-based).
    pub fn proof(&self, i: u64) -> Result<MerkleProof, CryptoError> {
        if i == 0 || i > self.max_i {
            return Err(CryptoError::InvalidInput(format!(
                "i={} out of range [1, {}]",
                i, self.max_i
            )));
        }

        let mut siblings = Vec::with_capacity(self.levels.len() - 1);
        let mut position = (i - 1) as usize;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_position = position ^ 1;
            siblings.push(level[sibling_position]);
            position /= 2;
        }
        Ok(MerkleProof { siblings })
    }
}
