//! # ECDSA Signatures (secp256k1)
//!
//! Detached ECDSA-SHA256 signatures over canonical payload bytes.
//!
//! ## Encodings
//!
//! - Public keys travel as DER SubjectPublicKeyInfo (base64 when textual)
//!   and are addressed by the SHA-256 fingerprint of those DER bytes.
//! - Signatures travel as DER (base64 when textual).
//! - Private keys load from PKCS#8 PEM.
//!
//! ## Security Notes
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Verification fails cleanly on any structural malformation; nothing in
//!   this module panics on attacker-controlled bytes
//! - Secret key material is zeroized on drop

use crate::errors::CryptoError;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use shared_types::KeyFingerprint;
use zeroize::Zeroize;

/// A secp256k1 public key carried alongside its DER SPKI encoding.
///
/// The DER bytes are kept verbatim so fingerprints and re-serialization
/// are byte-stable regardless of how the key was parsed.
#[derive(Clone, Debug)]
pub struct EcdsaPublicKey {
    der: Vec<u8>,
    key: VerifyingKey,
}

impl PartialEq for EcdsaPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for EcdsaPublicKey {}

impl EcdsaPublicKey {
    /// Parse from DER SubjectPublicKeyInfo bytes.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let key =
            VerifyingKey::from_public_key_der(der).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self {
            der: der.to_vec(),
            key,
        })
    }

    /// The DER SubjectPublicKeyInfo encoding.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 fingerprint of the DER encoding.
    pub fn fingerprint(&self) -> KeyFingerprint {
        KeyFingerprint::from_bytes(crate::hashing::sha256(&self.der))
    }

    /// Verify a DER-encoded ECDSA-SHA256 signature over `message`.
    ///
    /// Malformed signature bytes are a verification failure, not a panic.
    pub fn verify(&self, message: &[u8], signature_der: &[u8]) -> Result<(), CryptoError> {
        let signature =
            Signature::from_der(signature_der).map_err(|_| CryptoError::InvalidSignatureFormat)?;
        self.key
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    fn from_verifying_key(key: VerifyingKey) -> Result<Self, CryptoError> {
        let der = key
            .to_public_key_der()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self {
            der: der.as_bytes().to_vec(),
            key,
        })
    }
}

/// secp256k1 ECDSA keypair.
pub struct EcdsaKeyPair {
    signing_key: SigningKey,
    public_key: EcdsaPublicKey,
}

impl EcdsaKeyPair {
    /// Generate a random keypair.
    pub fn generate() -> Result<Self, CryptoError> {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self::from_signing_key(signing_key)
    }

    /// Load from a PKCS#8 PEM string.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_pkcs8_pem(pem).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_signing_key(signing_key)
    }

    /// Create from raw secret scalar bytes (32 bytes).
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, CryptoError> {
        let public_key = EcdsaPublicKey::from_verifying_key(*signing_key.verifying_key())?;
        Ok(Self {
            signing_key,
            public_key,
        })
    }

    /// The public half of the keypair.
    pub fn public_key(&self) -> &EcdsaPublicKey {
        &self.public_key
    }

    /// Sign a message with ECDSA-SHA256; returns the DER encoding.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_der().as_bytes().to_vec()
    }
}

impl Drop for EcdsaKeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

/// Verify a detached signature given only wire-format inputs.
///
/// Any malformation (bad SPKI, bad DER signature, wrong key) collapses to
/// `false`; callers that need to distinguish parse failures from
/// verification failures use [`EcdsaPublicKey`] directly.
pub fn verify_detached(public_key_der: &[u8], message: &[u8], signature_der: &[u8]) -> bool {
    match EcdsaPublicKey::from_der(public_key_der) {
        Ok(key) => key.verify(message, signature_der).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let keypair = EcdsaKeyPair::generate().unwrap();
        let message = b"cumulative owed amount update";

        let signature = keypair.sign(message);
        assert!(keypair.public_key().verify(message, &signature).is_ok());
    }

    #[test]
    fn wrong_message_fails() {
        let keypair = EcdsaKeyPair::generate().unwrap();
        let signature = keypair.sign(b"message one");

        assert!(keypair
            .public_key()
            .verify(b"message two", &signature)
            .is_err());
    }

    #[test]
    fn one_bit_flip_in_message_fails() {
        let keypair = EcdsaKeyPair::generate().unwrap();
        let message = b"exact bytes matter".to_vec();
        let signature = keypair.sign(&message);

        let mut flipped = message.clone();
        flipped[0] ^= 0x01;
        assert!(keypair.public_key().verify(&flipped, &signature).is_err());
    }

    #[test]
    fn one_bit_flip_in_signature_fails() {
        let keypair = EcdsaKeyPair::generate().unwrap();
        let message = b"exact bytes matter";
        let mut signature = keypair.sign(message);

        // Flip a bit in the middle of the DER body; either the structure or
        // the scalar check must reject it.
        let mid = signature.len() / 2;
        signature[mid] ^= 0x01;
        assert!(keypair.public_key().verify(message, &signature).is_err());
    }

    #[test]
    fn garbage_signature_is_rejected_not_panicking() {
        let keypair = EcdsaKeyPair::generate().unwrap();
        assert!(keypair.public_key().verify(b"m", &[0xFF; 71]).is_err());
        assert!(keypair.public_key().verify(b"m", &[]).is_err());
    }

    #[test]
    fn public_key_der_roundtrip() {
        let keypair = EcdsaKeyPair::generate().unwrap();
        let der = keypair.public_key().as_der().to_vec();
        let restored = EcdsaPublicKey::from_der(&der).unwrap();

        assert_eq!(restored.as_der(), der.as_slice());
        assert_eq!(restored.fingerprint(), keypair.public_key().fingerprint());
    }

    #[test]
    fn garbage_der_is_not_a_key() {
        assert!(EcdsaPublicKey::from_der(&[0x30, 0x03, 0x01, 0x02, 0x03]).is_err());
        assert!(EcdsaPublicKey::from_der(&[]).is_err());
    }

    #[test]
    fn detached_verify_never_panics() {
        let keypair = EcdsaKeyPair::generate().unwrap();
        let message = b"detached";
        let signature = keypair.sign(message);

        assert!(verify_detached(
            keypair.public_key().as_der(),
            message,
            &signature
        ));
        assert!(!verify_detached(b"not a key", message, &signature));
        assert!(!verify_detached(
            keypair.public_key().as_der(),
            message,
            b"not a signature"
        ));
    }

    #[test]
    fn deterministic_signatures() {
        let keypair = EcdsaKeyPair::from_secret_bytes([0xAB; 32]).unwrap();
        let message = b"deterministic test";

        assert_eq!(keypair.sign(message), keypair.sign(message));
    }

    #[test]
    fn fingerprints_differ_per_key() {
        let a = EcdsaKeyPair::generate().unwrap();
        let b = EcdsaKeyPair::generate().unwrap();
        assert_ne!(a.public_key().fingerprint(), b.public_key().fingerprint());
    }
}
