//! # Canonical Signed Payloads
//!
//! The four payload shapes that ever get signed, each with exactly one
//! byte encoding (compact JSON, sorted keys). Verifiers rebuild the bytes
//! from typed fields rather than trusting bytes off the wire, so what is
//! checked is always what the fields say.

use crate::domain::errors::PaymentError;
use nanomoni_channel_store::ModeCommitment;
use serde::{Deserialize, Serialize};
use shared_crypto::{canonical_json_bytes, CryptoError};
use shared_types::{b64_decode_array, Amount, ChannelId, PaymentMode, Timestamp};

fn canonical<T: Serialize>(payload: &T) -> Result<Vec<u8>, PaymentError> {
    canonical_json_bytes(payload).map_err(|e: CryptoError| PaymentError::MalformedRequest(e.to_string()))
}

/// Body of a channel-open request; signed by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChannelPayload {
    /// Client key, DER SubjectPublicKeyInfo, base64.
    pub client_public_key_der_b64: String,
    pub mode: PaymentMode,
    pub channel_amount: Amount,
    pub unit_value: Amount,
    /// Chain or Merkle root, base64. Absent in signature mode.
    pub commitment_root_b64: Option<String>,
    /// `max_k` / `max_i`. Absent in signature mode.
    pub commitment_max_index: Option<u64>,
}

impl OpenChannelPayload {
    /// The canonical bytes the client signed.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PaymentError> {
        canonical(self)
    }

    /// Decode the commitment fields into the store's representation,
    /// checking they agree with the declared mode.
    pub fn commitment(&self) -> Result<ModeCommitment, PaymentError> {
        match self.mode {
            PaymentMode::Signature => {
                if self.commitment_root_b64.is_some() || self.commitment_max_index.is_some() {
                    return Err(PaymentError::InvalidCommitment(
                        "signature mode carries no commitment".into(),
                    ));
                }
                Ok(ModeCommitment::Signature)
            }
            PaymentMode::Payword => {
                let (root, max_k) = self.root_and_cap()?;
                Ok(ModeCommitment::Payword { root, max_k })
            }
            PaymentMode::Paytree => {
                let (root, max_i) = self.root_and_cap()?;
                Ok(ModeCommitment::Paytree { root, max_i })
            }
        }
    }

    fn root_and_cap(&self) -> Result<([u8; 32], u64), PaymentError> {
        let root_b64 = self.commitment_root_b64.as_deref().ok_or_else(|| {
            PaymentError::InvalidCommitment("commitment root is required".into())
        })?;
        let cap = self.commitment_max_index.ok_or_else(|| {
            PaymentError::InvalidCommitment("commitment index cap is required".into())
        })?;
        let root = b64_decode_array::<32>(root_b64)
            .map_err(|e| PaymentError::InvalidCommitment(e.to_string()))?;
        Ok((root, cap))
    }
}

/// Cumulative owed-amount update; signed by the client per payment in
/// signature mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureUpdatePayload {
    pub channel_id: ChannelId,
    pub cumulative_owed_amount: Amount,
}

impl SignatureUpdatePayload {
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PaymentError> {
        canonical(self)
    }
}

/// Closing statement; signed by the client to close, co-signed by the
/// vendor for settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingStatementPayload {
    pub channel_id: ChannelId,
    pub final_cumulative_owed_amount: Amount,
    pub closed_at: Timestamp,
}

impl ClosingStatementPayload {
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PaymentError> {
        canonical(self)
    }
}

/// Certificate body; signed by the Issuer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    /// Client key, DER SubjectPublicKeyInfo, base64.
    pub client_public_key_der_b64: String,
    /// Balance the Issuer vouches for; caps the channel amount.
    pub initial_balance: Amount,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl CertificateBody {
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PaymentError> {
        canonical(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::from_canonical_bytes;
    use shared_types::b64_encode;

    #[test]
    fn canonical_bytes_roundtrip() {
        let payload = SignatureUpdatePayload {
            channel_id: ChannelId::generate(),
            cumulative_owed_amount: 40,
        };
        let bytes = payload.canonical_bytes().unwrap();
        let back: SignatureUpdatePayload = from_canonical_bytes(&bytes).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.canonical_bytes().unwrap(), bytes);
    }

    #[test]
    fn canonical_bytes_have_sorted_keys() {
        let payload = ClosingStatementPayload {
            channel_id: ChannelId::parse("00000000-0000-0000-0000-000000000000").unwrap(),
            final_cumulative_owed_amount: 40,
            closed_at: 7,
        };
        let text = String::from_utf8(payload.canonical_bytes().unwrap()).unwrap();
        assert_eq!(
            text,
            "{\"channel_id\":\"00000000-0000-0000-0000-000000000000\",\
             \"closed_at\":7,\"final_cumulative_owed_amount\":40}"
        );
    }

    fn open_payload(mode: PaymentMode) -> OpenChannelPayload {
        OpenChannelPayload {
            client_public_key_der_b64: b64_encode(b"key"),
            mode,
            channel_amount: 100,
            unit_value: 10,
            commitment_root_b64: Some(b64_encode(&[9u8; 32])),
            commitment_max_index: Some(10),
        }
    }

    #[test]
    fn payword_commitment_decodes() {
        let commitment = open_payload(PaymentMode::Payword).commitment().unwrap();
        assert_eq!(
            commitment,
            ModeCommitment::Payword {
                root: [9u8; 32],
                max_k: 10
            }
        );
    }

    #[test]
    fn signature_mode_must_not_carry_commitment_material() {
        let payload = open_payload(PaymentMode::Signature);
        assert!(matches!(
            payload.commitment(),
            Err(PaymentError::InvalidCommitment(_))
        ));
    }

    #[test]
    fn indexed_modes_require_root_and_cap() {
        let mut payload = open_payload(PaymentMode::Paytree);
        payload.commitment_root_b64 = None;
        assert!(matches!(
            payload.commitment(),
            Err(PaymentError::InvalidCommitment(_))
        ));

        let mut payload = open_payload(PaymentMode::Paytree);
        payload.commitment_max_index = None;
        assert!(matches!(
            payload.commitment(),
            Err(PaymentError::InvalidCommitment(_))
        ));
    }

    #[test]
    fn commitment_root_must_be_32_bytes() {
        let mut payload = open_payload(PaymentMode::Payword);
        payload.commitment_root_b64 = Some(b64_encode(&[1u8; 16]));
        assert!(matches!(
            payload.commitment(),
            Err(PaymentError::InvalidCommitment(_))
        ));
    }
}
