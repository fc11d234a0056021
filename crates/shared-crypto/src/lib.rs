//! # NanoMoni Crypto Primitives
//!
//! Pure cryptographic building blocks for the three micropayment schemes.
//! No I/O, no shared state; every function here is deterministic given its
//! inputs.
//!
//! ## Modules
//!
//! - `hashing`: SHA-256 one-shot and iterated hashing
//! - `ecdsa`: secp256k1 ECDSA with DER signatures and DER SPKI keys
//! - `canonical`: canonical JSON bytes for everything that gets signed
//! - `payword`: hash-chain commitments and token verification
//! - `paytree`: Merkle-tree commitments and inclusion-proof verification
//!
//! ## Security Notes
//!
//! - Malformed signatures, keys, tokens and proofs are verification
//!   failures, never panics.
//! - Signing keys are zeroized on drop.

pub mod canonical;
pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod payword;
pub mod paytree;

pub use canonical::{canonical_digest, canonical_json_bytes, from_canonical_bytes};
pub use ecdsa::{verify_detached, EcdsaKeyPair, EcdsaPublicKey};
pub use errors::CryptoError;
pub use hashing::{hash_n, sha256, sha256_many, Digest};
pub use payword::{verify_token, verify_token_step, PaywordChain};
pub use paytree::{derive_leaf, verify_proof, MerkleProof, Paytree};
