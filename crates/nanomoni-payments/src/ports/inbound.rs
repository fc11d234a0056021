//! # Inbound Port (Driving Port / API)
//!
//! The public API of the payment engine. The transport layer above it
//! authenticates the caller, decodes the body into one of the request
//! types below and relays the typed result; it adds nothing else.

use crate::domain::certificate::Certificate;
use crate::domain::errors::PaymentError;
use crate::domain::payloads::OpenChannelPayload;
use serde::{Deserialize, Serialize};
use shared_types::{Amount, ChannelId, Timestamp};

/// Channel-open request: the signed payload plus the Issuer certificate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenChannelRequest {
    pub payload: OpenChannelPayload,
    /// Client's DER signature over the payload's canonical bytes, base64.
    pub client_signature_b64: String,
    pub certificate: Certificate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChannelResponse {
    pub channel_id: ChannelId,
}

/// Signature-mode payment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignaturePaymentRequest {
    pub channel_id: ChannelId,
    pub cumulative_owed_amount: Amount,
    /// Client's DER signature over the canonical update payload, base64.
    pub signature_b64: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePaymentReceipt {
    pub channel_id: ChannelId,
    pub accepted_owed_amount: Amount,
    pub accepted_at: Timestamp,
}

/// PayWord payment: the counter and the revealed chain token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaywordPaymentRequest {
    pub channel_id: ChannelId,
    pub k: u64,
    /// Preimage at depth `k`, base64 (32 bytes).
    pub token_b64: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaywordPaymentReceipt {
    pub channel_id: ChannelId,
    pub accepted_k: u64,
    pub cumulative_owed_amount: Amount,
    pub accepted_at: Timestamp,
}

/// PayTree payment: the leaf index, the leaf and its inclusion proof.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaytreePaymentRequest {
    pub channel_id: ChannelId,
    pub i: u64,
    /// Leaf hash, base64 (32 bytes).
    pub leaf_b64: String,
    /// Sibling hashes leaf-to-root, base64 (32 bytes each).
    pub proof_b64: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaytreePaymentReceipt {
    pub channel_id: ChannelId,
    pub accepted_i: u64,
    pub cumulative_owed_amount: Amount,
    pub accepted_at: Timestamp,
}

/// Channel close: the client's signature over the closing statement for
/// the channel's current owed amount at `closed_at`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloseChannelRequest {
    pub channel_id: ChannelId,
    pub closed_at: Timestamp,
    pub client_signature_b64: String,
}

/// The frozen closing statement, co-signed by the vendor. Repeated closes
/// return this byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStatementResponse {
    pub channel_id: ChannelId,
    pub final_cumulative_owed_amount: Amount,
    pub closed_at: Timestamp,
    pub client_signature_b64: String,
    pub vendor_signature_b64: String,
}

/// Primary payment API.
///
/// Implementations must be thread-safe (`Send + Sync`); arbitrary
/// concurrent calls on the same channel are the normal case, not an edge
/// case.
pub trait PaymentApi: Send + Sync {
    /// Open a channel from a certificate-backed, client-signed request.
    fn open_channel(&self, request: OpenChannelRequest)
        -> Result<OpenChannelResponse, PaymentError>;

    /// Accept a cumulative signed owed-amount update.
    fn pay_signature(
        &self,
        request: SignaturePaymentRequest,
    ) -> Result<SignaturePaymentReceipt, PaymentError>;

    /// Accept a hash-chain token.
    fn pay_payword(
        &self,
        request: PaywordPaymentRequest,
    ) -> Result<PaywordPaymentReceipt, PaymentError>;

    /// Accept a Merkle leaf with inclusion proof.
    fn pay_paytree(
        &self,
        request: PaytreePaymentRequest,
    ) -> Result<PaytreePaymentReceipt, PaymentError>;

    /// Close the channel and emit the final statement. Idempotent.
    fn close_channel(
        &self,
        request: CloseChannelRequest,
    ) -> Result<FinalStatementResponse, PaymentError>;
}
