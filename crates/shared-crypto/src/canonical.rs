//! # Canonical Serialization
//!
//! Every signed object has exactly one byte encoding: compact JSON with
//! lexicographically sorted keys and no whitespace. Signer and verifier
//! both derive the bytes from typed payloads, so a payload that parses
//! back equal re-serializes to identical bytes.
//!
//! Sorting comes from routing serialization through `serde_json::Value`,
//! whose object representation is a `BTreeMap`.

use crate::errors::CryptoError;
use crate::hashing::{sha256, Digest};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Render a payload to its canonical signing bytes.
pub fn canonical_json_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>, CryptoError> {
    let value = serde_json::to_value(payload).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| CryptoError::Serialization(e.to_string()))
}

/// SHA-256 digest of the canonical bytes.
pub fn canonical_digest<T: Serialize>(payload: &T) -> Result<Digest, CryptoError> {
    Ok(sha256(&canonical_json_bytes(payload)?))
}

/// Parse a payload back from canonical bytes.
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CryptoError> {
    serde_json::from_slice(bytes).map_err(|e| CryptoError::Serialization(e.to_string()))
}
