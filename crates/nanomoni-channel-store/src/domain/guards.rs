//! # Payment Guards
//!
//! The fixed predicate DSL evaluated inside the store's atomic update.
//! A guard is data (comparisons against caps captured from the channel
//! record), not arbitrary code, so a scripted backend can run the same
//! logic server-side. The in-memory adapter runs [`PaymentGuard::evaluate`]
//! while holding the store lock, which is the whole point: the comparison
//! and the overwrite are one atomic unit.
//!
//! A missing previous payment is index **zero**, never "unset": the first
//! accepted payment must carry index 1 or higher in every mode.

use super::entities::{Channel, LatestState};
use super::errors::StoreError;
use shared_types::Amount;

/// Guard predicate for one payment mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentGuard {
    /// `candidate.owed > current.owed && candidate.owed <= channel_amount`,
    /// and the first payment clears at least one unit.
    Signature {
        channel_amount: Amount,
        unit_value: Amount,
    },
    /// `candidate.k > current.k && candidate.k <= max_k
    /// && candidate.k * unit_value <= channel_amount`.
    Payword {
        max_k: u64,
        unit_value: Amount,
        channel_amount: Amount,
    },
    /// `candidate.i > current.i && candidate.i <= max_i
    /// && candidate.i * unit_value <= channel_amount`.
    Paytree {
        max_i: u64,
        unit_value: Amount,
        channel_amount: Amount,
    },
}

impl PaymentGuard {
    /// Capture the guard for a channel's mode and caps.
    pub fn for_channel(channel: &Channel) -> Self {
        use super::entities::ModeCommitment;
        match &channel.commitment {
            ModeCommitment::Signature => PaymentGuard::Signature {
                channel_amount: channel.channel_amount,
                unit_value: channel.unit_value,
            },
            ModeCommitment::Payword { max_k, .. } => PaymentGuard::Payword {
                max_k: *max_k,
                unit_value: channel.unit_value,
                channel_amount: channel.channel_amount,
            },
            ModeCommitment::Paytree { max_i, .. } => PaymentGuard::Paytree {
                max_i: *max_i,
                unit_value: channel.unit_value,
                channel_amount: channel.channel_amount,
            },
        }
    }

    /// Decide whether `candidate` may replace `current`.
    ///
    /// Pure; the store adapter calls this inside its atomic section and
    /// must not re-interpret the result.
    pub fn evaluate(&self, current: &LatestState, candidate: &LatestState) -> Result<(), StoreError> {
        match (self, current, candidate) {
            (
                PaymentGuard::Signature {
                    channel_amount,
                    unit_value,
                },
                LatestState::Signature(cur),
                LatestState::Signature(cand),
            ) => {
                let current_owed = cur.cumulative_owed_amount;
                let candidate_owed = cand.cumulative_owed_amount;
                if candidate_owed <= current_owed {
                    return Err(StoreError::NonMonotonicIndex {
                        current: current_owed,
                        candidate: candidate_owed,
                    });
                }
                // First payment must clear at least one unit.
                if current_owed == 0 && candidate_owed < *unit_value {
                    return Err(StoreError::NonMonotonicIndex {
                        current: current_owed,
                        candidate: candidate_owed,
                    });
                }
                if candidate_owed > *channel_amount {
                    return Err(StoreError::ExceedsChannelAmount {
                        candidate_owed,
                        channel_amount: *channel_amount,
                    });
                }
                Ok(())
            }
            (
                PaymentGuard::Payword {
                    max_k,
                    unit_value,
                    channel_amount,
                },
                LatestState::Payword(cur),
                LatestState::Payword(cand),
            ) => check_indexed(cur.k, cand.k, *max_k, *unit_value, *channel_amount),
            (
                PaymentGuard::Paytree {
                    max_i,
                    unit_value,
                    channel_amount,
                },
                LatestState::Paytree(cur),
                LatestState::Paytree(cand),
            ) => check_indexed(cur.i, cand.i, *max_i, *unit_value, *channel_amount),
            _ => Err(StoreError::ModeMismatch {
                expected: current.mode(),
                actual: candidate.mode(),
            }),
        }
    }
}

/// Shared comparison chain for the two indexed modes: strictly increasing,
/// within the committed cap, within the channel amount.
fn check_indexed(
    current: u64,
    candidate: u64,
    cap: u64,
    unit_value: Amount,
    channel_amount: Amount,
) -> Result<(), StoreError> {
    if candidate <= current {
        return Err(StoreError::NonMonotonicIndex { current, candidate });
    }
    if candidate > cap {
        return Err(StoreError::ExceedsIndexCap { candidate, cap });
    }
    let candidate_owed = candidate
        .checked_mul(unit_value)
        .unwrap_or(Amount::MAX);
    if candidate_owed > channel_amount {
        return Err(StoreError::ExceedsChannelAmount {
            candidate_owed,
            channel_amount,
        });
    }
    Ok(())
}
