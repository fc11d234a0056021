//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Public key bytes were not a valid DER SubjectPublicKeyInfo.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Private key material could not be parsed.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Signature bytes were not valid DER ECDSA.
    #[error("invalid signature format")]
    InvalidSignatureFormat,

    /// Signature did not verify against the message and key.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Canonical serialization failed.
    #[error("canonical serialization failed: {0}")]
    Serialization(String),

    /// Invalid input for a cryptographic operation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
