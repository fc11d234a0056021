//! # Replay Validators
//!
//! Pure duplicate-detection for incoming payments. A client that lost a
//! response may retransmit the exact payment it already made; that retry
//! is answered with the stored state instead of a rejection. Reusing an
//! index with *different* auth material is a replay attempt and is
//! rejected like any other non-increasing index.

/// Outcome of comparing an incoming payment against the latest accepted
/// state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayCheck {
    /// The index advances; proceed with verification.
    Fresh,
    /// Byte-exact retransmission of the accepted payment.
    Duplicate,
    /// Same index, different material.
    Mismatch,
}

/// Compare an incoming payment `(index, material)` with the accepted
/// `(index, material)`.
///
/// `current_index == 0` is the unit state: nothing has been accepted yet,
/// so nothing can be a duplicate. Indexes below the current one are left
/// to the monotonicity guard.
pub fn check_replay(
    candidate_index: u64,
    candidate_material: &[u8],
    current_index: u64,
    current_material: &[u8],
) -> ReplayCheck {
    if current_index == 0 || candidate_index != current_index {
        return ReplayCheck::Fresh;
    }
    if candidate_material == current_material {
        ReplayCheck::Duplicate
    } else {
        ReplayCheck::Mismatch
    }
}
