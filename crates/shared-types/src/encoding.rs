//! Base64 helpers for keys, signatures and tokens in transit.
//!
//! All binary material crosses the wire as standard base64 with padding
//! (RFC 4648). Decoding is strict: forgiving decoders have let malformed
//! auth material slip through validation layers before.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Errors for textual decodings of binary material.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Input was not valid standard base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Decoded bytes had an unexpected length.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },
}

/// Encode raw bytes as standard base64.
pub fn b64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard base64, rejecting invalid characters and bad padding.
pub fn b64_decode(data: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(STANDARD.decode(data)?)
}

/// Decode base64 into a fixed-size array (tokens, digests, roots).
pub fn b64_decode_array<const N: usize>(data: &str) -> Result<[u8; N], EncodingError> {
    let bytes = b64_decode(data)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| EncodingError::InvalidLength {
            expected: N,
            actual: len,
        })
}
