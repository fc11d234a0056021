//! # Issuer Certificates
//!
//! A certificate is the Issuer's detached ECDSA signature over the
//! canonical [`CertificateBody`]. The vendor trusts it iff the signature
//! verifies under the currently cached Issuer key and the current time
//! falls inside the validity window (with a small configured skew).

use crate::domain::errors::PaymentError;
use crate::domain::payloads::CertificateBody;
use serde::{Deserialize, Serialize};
use shared_crypto::{EcdsaKeyPair, EcdsaPublicKey};
use shared_types::{b64_decode, Timestamp};
use thiserror::Error;

/// Why a certificate was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CertificateError {
    /// The Issuer signature did not verify. The only variant worth a key
    /// refresh: the Issuer may have rotated since the key was cached.
    #[error("issuer signature does not verify")]
    BadSignature,

    /// `issued_at` lies in the future.
    #[error("certificate not valid until {issued_at} (now {now})")]
    NotYetValid { issued_at: Timestamp, now: Timestamp },

    /// `expires_at` has passed.
    #[error("certificate expired at {expires_at} (now {now})")]
    Expired { expires_at: Timestamp, now: Timestamp },

    /// The embedded client key is not valid DER SPKI.
    #[error("certificate carries a malformed client key")]
    MalformedClientKey,
}

/// An Issuer-signed certificate as the vendor consumes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub body: CertificateBody,
    /// DER ECDSA signature over the body's canonical bytes, base64.
    pub issuer_signature_b64: String,
}

impl Certificate {
    /// Sign a body. Issuer-side; the vendor only verifies, but tests and
    /// the Issuer service mint through the same path.
    pub fn issue(body: CertificateBody, issuer_keys: &EcdsaKeyPair) -> Result<Self, PaymentError> {
        let bytes = body.canonical_bytes()?;
        let signature = issuer_keys.sign(&bytes);
        Ok(Self {
            body,
            issuer_signature_b64: shared_types::b64_encode(&signature),
        })
    }

    /// Verify the Issuer signature and the validity window.
    pub fn verify(
        &self,
        issuer_key: &EcdsaPublicKey,
        now: Timestamp,
        clock_skew: u64,
    ) -> Result<(), CertificateError> {
        let bytes = self
            .body
            .canonical_bytes()
            .map_err(|_| CertificateError::BadSignature)?;
        let signature =
            b64_decode(&self.issuer_signature_b64).map_err(|_| CertificateError::BadSignature)?;
        if issuer_key.verify(&bytes, &signature).is_err() {
            return Err(CertificateError::BadSignature);
        }

        if now.saturating_add(clock_skew) < self.body.issued_at {
            return Err(CertificateError::NotYetValid {
                issued_at: self.body.issued_at,
                now,
            });
        }
        if now > self.body.expires_at.saturating_add(clock_skew) {
            return Err(CertificateError::Expired {
                expires_at: self.body.expires_at,
                now,
            });
        }
        Ok(())
    }

    /// The client key the certificate vouches for.
    pub fn client_public_key(&self) -> Result<EcdsaPublicKey, CertificateError> {
        let der = b64_decode(&self.body.client_public_key_der_b64)
            .map_err(|_| CertificateError::MalformedClientKey)?;
        EcdsaPublicKey::from_der(&der).map_err(|_| CertificateError::MalformedClientKey)
    }
}
