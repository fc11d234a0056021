//! # SHA-256 Hashing
//!
//! Every digest in the system is SHA-256: key fingerprints, PayWord chain
//! links, PayTree nodes and canonical payload digests.

use sha2::{Digest as _, Sha256};

/// SHA-256 output (256-bit).
pub type Digest = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash the concatenation of multiple inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Apply SHA-256 `n` times to a digest.
///
/// `hash_n(d, 0)` is `d` itself. This is the verification primitive for
/// PayWord chains: a token at depth `k` reaches the chain root after `k`
/// applications.
pub fn hash_n(data: Digest, n: u64) -> Digest {
    let mut out = data;
    for _ in 0..n {
        out = sha256(&out);
    }
    out
}
