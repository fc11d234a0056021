//! Store error types.

use shared_types::{Amount, PaymentMode};
use thiserror::Error;

/// Errors surfaced by the channel state store.
///
/// The monotonicity and cap variants are the rejection reasons the guard
/// predicates produce inside the atomic update; the rest describe the
/// channel record itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record for the channel id.
    #[error("channel not found")]
    ChannelNotFound,

    /// The channel exists but has been closed.
    #[error("channel is closed")]
    ChannelClosed,

    /// The client already has an open channel, or the id collides.
    #[error("channel already open")]
    ChannelAlreadyOpen,

    /// `close` was called on an already-closed channel.
    #[error("channel already closed")]
    AlreadyClosed,

    /// The caller expected a different payment mode than the record holds.
    #[error("mode mismatch: expected {expected}, channel is {actual}")]
    ModeMismatch {
        expected: PaymentMode,
        actual: PaymentMode,
    },

    /// The candidate index does not strictly increase the current one.
    #[error("non-monotonic index: candidate {candidate} does not exceed current {current}")]
    NonMonotonicIndex { current: u64, candidate: u64 },

    /// The candidate owed amount exceeds the channel cap.
    #[error("owed amount {candidate_owed} exceeds channel amount {channel_amount}")]
    ExceedsChannelAmount {
        candidate_owed: Amount,
        channel_amount: Amount,
    },

    /// The candidate index exceeds the committed index cap.
    #[error("index {candidate} exceeds commitment cap {cap}")]
    ExceedsIndexCap { candidate: u64, cap: u64 },

    /// Transient backend failure; the caller may retry once.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
