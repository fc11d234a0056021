//! # PayWord Hash Chains
//!
//! A PayWord commitment is the tip of a hash chain. From a random seed
//! `s_0`, the chain is `s_i = H(s_{i-1})` for `i = 1..max_k`, the
//! commitment root is `s_max_k`, and the token spending `k` units is the
//! preimage at depth `k`: `token_k = s_{max_k - k}`.
//!
//! Verification hashes a token back up to the root: `H^k(token_k) == root`.
//! Consecutive tokens are one hash apart (`H(token_k) == token_{k-1}`),
//! which gives the vendor an O(1) step verifier once a token is on file.
//!
//! The client-side [`PaywordChain`] keeps a configurable number of midpoint
//! checkpoints ("pebbles") instead of the whole chain, trading a little
//! hashing per token for O(pebbles) memory.

use crate::errors::CryptoError;
use crate::hashing::{hash_n, sha256, Digest};
use rand::RngCore;
use std::collections::BTreeMap;

/// Verify a token against a chain commitment.
///
/// Accepts iff `1 <= k <= max_k` and hashing the token `k` times reaches
/// the root. Stateless; the step verifier below is only an optimization.
pub fn verify_token(token: &Digest, k: u64, root: &Digest, max_k: u64) -> bool {
    if k == 0 || k > max_k {
        return false;
    }
    hash_n(*token, k) == *root
}

/// Verify that `token` is the immediate successor of an already-accepted
/// token: `H(token) == previous`.
///
/// Only valid for `k == previous_k + 1`; anything else must go through
/// [`verify_token`].
pub fn verify_token_step(token: &Digest, previous: &Digest) -> bool {
    sha256(token) == *previous
}

/// Midpoint pebble indices for a chain of length `n`, preorder.
///
/// Splitting `[0, n]` recursively at the midpoint concentrates checkpoints
/// where token extraction walks the furthest. Order reflects the DFS, so
/// truncating at `count` keeps the most useful pebbles first.
fn midpoint_pebbles(n: u64, count: usize) -> Vec<u64> {
    let mut out = Vec::new();
    if count == 0 || n <= 1 {
        return out;
    }

    fn rec(lo: u64, hi: u64, count: usize, out: &mut Vec<u64>) {
        if out.len() >= count {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        if mid == lo || mid == hi {
            return;
        }
        out.push(mid);
        rec(lo, mid, count, out);
        rec(mid, hi, count, out);
    }

    rec(0, n, count, &mut out);
    out.truncate(count);
    out
}

/// Client-side hash chain with pebbled token extraction.
///
/// Holds the seed (index 0), up to `pebble_count` midpoint values and the
/// root. `token(k)` starts from the nearest stored index at or below
/// `max_k - k` and hashes forward.
#[derive(Clone, Debug)]
pub struct PaywordChain {
    max_k: u64,
    root: Digest,
    /// Chain values keyed by chain index; always contains index 0.
    pebbles: BTreeMap<u64, Digest>,
}

impl PaywordChain {
    /// Build a chain of length `max_k` from an explicit seed.
    pub fn build(seed: Digest, max_k: u64, pebble_count: usize) -> Result<Self, CryptoError> {
        if max_k == 0 {
            return Err(CryptoError::InvalidInput("max_k must be > 0".into()));
        }

        let wanted: BTreeMap<u64, ()> = midpoint_pebbles(max_k, pebble_count)
            .into_iter()
            .map(|i| (i, ()))
            .collect();

        let mut pebbles = BTreeMap::new();
        pebbles.insert(0, seed);

        let mut current = seed;
        for i in 1..=max_k {
            current = sha256(&current);
            if wanted.contains_key(&i) {
                pebbles.insert(i, current);
            }
        }

        Ok(Self {
            max_k,
            root: current,
            pebbles,
        })
    }

    /// Build a chain from a fresh random seed.
    pub fn generate(max_k: u64, pebble_count: usize) -> Result<Self, CryptoError> {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::build(seed, max_k, pebble_count)
    }

    /// The commitment root (`s_max_k`).
    pub fn root(&self) -> &Digest {
        &self.root
    }

    /// The chain length / step cap.
    pub fn max_k(&self) -> u64 {
        self.max_k
    }

    /// The token spending `k` units: `s_{max_k - k}`.
    ///
    /// `k = 0` returns the root itself (the unit element, never a valid
    /// payment).
    pub fn token(&self, k: u64) -> Result<Digest, CryptoError> {
        if k > self.max_k {
            return Err(CryptoError::InvalidInput(format!(
                "k={} out of range [0, {}]",
                k, self.max_k
            )));
        }
        let target = self.max_k - k;

        // Nearest stored checkpoint at or below the target; index 0 always
        // exists.
        let (start_idx, start) = match self.pebbles.range(..=target).next_back() {
            Some((i, v)) => (*i, *v),
            None => {
                return Err(CryptoError::InvalidInput(
                    "chain is missing its seed checkpoint".into(),
                ))
            }
        };

        Ok(hash_n(start, target - start_idx))
    }
}
