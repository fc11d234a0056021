//! # Payment Error Taxonomy
//!
//! Errors fall into three groups with different handling rules:
//!
//! - **Validation**: the client's fault. Reported deterministically,
//!   never retried.
//! - **State**: ordering and lifecycle rejections from the store's
//!   atomic guard. Reported, never retried; the losing side of a race
//!   lands here.
//! - **Transient**: backend hiccups. The service retries the store once
//!   with backoff before surfacing these.
//!
//! Fatal configuration problems (unreadable vendor key, missing config)
//! fail at service construction, not per request.

use nanomoni_channel_store::StoreError;
use shared_types::{Amount, PaymentMode};
use thiserror::Error;

/// Errors returned by the payment use-cases.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    // --- validation -------------------------------------------------------
    /// Request fields could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// A client signature did not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// A PayWord token did not verify against the chain commitment.
    #[error("invalid token")]
    InvalidToken,

    /// A PayTree proof did not verify against the Merkle commitment.
    #[error("invalid proof")]
    InvalidProof,

    /// The Issuer certificate was rejected.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The request targets a different mode than the channel is locked to.
    #[error("mode mismatch: expected {expected}, channel is {actual}")]
    ModeMismatch {
        expected: PaymentMode,
        actual: PaymentMode,
    },

    /// The mode commitment in an open request violates the channel rules.
    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),

    // --- state ------------------------------------------------------------
    /// The payment's index does not strictly increase the accepted one.
    #[error("non-monotonic index: candidate {candidate} does not exceed current {current}")]
    NonMonotonicIndex { current: u64, candidate: u64 },

    /// The payment would push the owed amount past the channel cap.
    #[error("owed amount {candidate_owed} exceeds channel amount {channel_amount}")]
    ExceedsChannelAmount {
        candidate_owed: Amount,
        channel_amount: Amount,
    },

    /// The payment's index exceeds the committed cap.
    #[error("index {candidate} exceeds commitment cap {cap}")]
    ExceedsIndexCap { candidate: u64, cap: u64 },

    /// The channel has been closed.
    #[error("channel is closed")]
    ChannelClosed,

    /// The client already has an open channel.
    #[error("channel already open")]
    ChannelAlreadyOpen,

    /// No channel with the given id.
    #[error("channel not found")]
    ChannelNotFound,

    // --- transient --------------------------------------------------------
    /// The channel store did not respond; already retried once.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The Issuer could not be reached for a public key (re)fetch.
    #[error("issuer unreachable: {0}")]
    IssuerUnreachable(String),
}

impl From<StoreError> for PaymentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ChannelNotFound => PaymentError::ChannelNotFound,
            StoreError::ChannelClosed | StoreError::AlreadyClosed => PaymentError::ChannelClosed,
            StoreError::ChannelAlreadyOpen => PaymentError::ChannelAlreadyOpen,
            StoreError::ModeMismatch { expected, actual } => {
                PaymentError::ModeMismatch { expected, actual }
            }
            StoreError::NonMonotonicIndex { current, candidate } => {
                PaymentError::NonMonotonicIndex { current, candidate }
            }
            StoreError::ExceedsChannelAmount {
                candidate_owed,
                channel_amount,
            } => PaymentError::ExceedsChannelAmount {
                candidate_owed,
                channel_amount,
            },
            StoreError::ExceedsIndexCap { candidate, cap } => {
                PaymentError::ExceedsIndexCap { candidate, cap }
            }
            StoreError::Unavailable(message) => PaymentError::StoreUnavailable(message),
        }
    }
}
