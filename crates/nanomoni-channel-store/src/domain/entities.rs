//! # Channel Entities
//!
//! The channel record, its immutable mode commitment and the per-mode
//! `latest_state`. All three modes share one read surface: a monotonic
//! index plus the cumulative owed amount it implies.

use serde::{Deserialize, Serialize};
use shared_crypto::paytree::MerkleProof;
use shared_crypto::Digest;
use shared_types::{Amount, ChannelId, KeyFingerprint, PaymentMode, Timestamp};
use thiserror::Error;

/// Violations of the channel construction rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelRuleViolation {
    /// `unit_value` must be at least 1.
    #[error("unit_value must be >= 1")]
    UnitValueZero,

    /// `channel_amount` must cover at least one unit.
    #[error("channel_amount {channel_amount} is below unit_value {unit_value}")]
    AmountBelowUnitValue {
        channel_amount: Amount,
        unit_value: Amount,
    },

    /// A PayWord/PayTree commitment needs at least one spendable index.
    #[error("commitment index cap must be >= 1")]
    IndexCapZero,

    /// The committed index range can overspend the channel by more than
    /// one remainder unit: `cap * unit_value <= channel_amount + unit_value`
    /// must hold.
    #[error(
        "commitment cap {cap} at unit_value {unit_value} overspends channel_amount {channel_amount}"
    )]
    CommitmentOverspendsChannel {
        cap: u64,
        unit_value: Amount,
        channel_amount: Amount,
    },
}

/// The immutable commitment fixed at channel open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeCommitment {
    /// Signature mode carries no commitment material.
    Signature,
    /// Tip of the hash chain and its length.
    Payword { root: Digest, max_k: u64 },
    /// Merkle root and the leaf cap.
    Paytree { root: Digest, max_i: u64 },
}

impl ModeCommitment {
    /// The payment mode this commitment belongs to.
    pub fn mode(&self) -> PaymentMode {
        match self {
            ModeCommitment::Signature => PaymentMode::Signature,
            ModeCommitment::Payword { .. } => PaymentMode::Payword,
            ModeCommitment::Paytree { .. } => PaymentMode::Paytree,
        }
    }
}

/// Latest accepted state in signature mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureState {
    /// Total the client has committed to pay so far.
    pub cumulative_owed_amount: Amount,
    /// DER signature over the canonical `(channel_id, owed)` payload.
    /// Empty in the unit state.
    pub client_signature_der: Vec<u8>,
    /// When this state was accepted.
    pub updated_at: Timestamp,
}

/// Latest accepted state in PayWord mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaywordState {
    /// Chain step counter.
    pub k: u64,
    /// The revealed preimage at depth `k`. The unit state holds the chain
    /// root, which is depth 0 and never a valid payment.
    pub token: Digest,
    /// When this state was accepted.
    pub updated_at: Timestamp,
}

/// Latest accepted state in PayTree mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaytreeState {
    /// Leaf index counter.
    pub i: u64,
    /// The revealed leaf hash. Zero in the unit state.
    pub leaf: Digest,
    /// Inclusion proof of the leaf. Empty in the unit state.
    pub proof: MerkleProof,
    /// When this state was accepted.
    pub updated_at: Timestamp,
}

/// The per-mode `latest_state` behind a common read API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatestState {
    Signature(SignatureState),
    Payword(PaywordState),
    Paytree(PaytreeState),
}

impl LatestState {
    /// The unit element for a freshly opened channel: index zero, nothing
    /// owed. Never produced by an accepted payment.
    pub fn unit(commitment: &ModeCommitment) -> Self {
        match commitment {
            ModeCommitment::Signature => LatestState::Signature(SignatureState {
                cumulative_owed_amount: 0,
                client_signature_der: Vec::new(),
                updated_at: 0,
            }),
            ModeCommitment::Payword { root, .. } => LatestState::Payword(PaywordState {
                k: 0,
                token: *root,
                updated_at: 0,
            }),
            ModeCommitment::Paytree { .. } => LatestState::Paytree(PaytreeState {
                i: 0,
                leaf: [0u8; 32],
                proof: MerkleProof::default(),
                updated_at: 0,
            }),
        }
    }

    /// The payment mode this state belongs to.
    pub fn mode(&self) -> PaymentMode {
        match self {
            LatestState::Signature(_) => PaymentMode::Signature,
            LatestState::Payword(_) => PaymentMode::Payword,
            LatestState::Paytree(_) => PaymentMode::Paytree,
        }
    }

    /// The monotonic index: the owed amount itself in signature mode, the
    /// step/leaf counter otherwise.
    pub fn index(&self) -> u64 {
        match self {
            LatestState::Signature(s) => s.cumulative_owed_amount,
            LatestState::Payword(s) => s.k,
            LatestState::Paytree(s) => s.i,
        }
    }

    /// Cumulative owed amount implied by this state.
    pub fn cumulative_owed(&self, unit_value: Amount) -> Amount {
        match self {
            LatestState::Signature(s) => s.cumulative_owed_amount,
            LatestState::Payword(s) => s.k.saturating_mul(unit_value),
            LatestState::Paytree(s) => s.i.saturating_mul(unit_value),
        }
    }
}

/// Channel lifecycle status. Transitions one way: `Open -> Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Open,
    Closed,
}

/// The final statement frozen when a channel closes.
///
/// Kept on the record so a repeated close returns bytes identical to the
/// first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStatement {
    pub channel_id: ChannelId,
    pub final_cumulative_owed_amount: Amount,
    pub closed_at: Timestamp,
    /// Client's DER signature over the canonical closing statement.
    pub client_signature_der: Vec<u8>,
    /// Vendor's DER co-signature over the same bytes.
    pub vendor_signature_der: Vec<u8>,
}

/// One payment channel record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: ChannelId,
    /// DER SubjectPublicKeyInfo of the client key bound at open.
    pub client_public_key_der: Vec<u8>,
    /// Fingerprint of the client key, the secondary lookup key.
    pub client_fingerprint: KeyFingerprint,
    /// Integer cap on the cumulative owed amount.
    pub channel_amount: Amount,
    /// Value of one index step.
    pub unit_value: Amount,
    /// Immutable once set.
    pub commitment: ModeCommitment,
    pub opened_at: Timestamp,
    pub status: ChannelStatus,
    pub latest: LatestState,
    /// Present once the channel has closed.
    pub final_statement: Option<FinalStatement>,
}

impl Channel {
    /// Construct an open channel, enforcing the construction rules:
    /// unit value at least 1, the cap covering at least one unit, and a
    /// committed index range that cannot overspend the channel by more
    /// than one remainder unit.
    pub fn open(
        channel_id: ChannelId,
        client_public_key_der: Vec<u8>,
        client_fingerprint: KeyFingerprint,
        channel_amount: Amount,
        unit_value: Amount,
        commitment: ModeCommitment,
        opened_at: Timestamp,
    ) -> Result<Self, ChannelRuleViolation> {
        if unit_value == 0 {
            return Err(ChannelRuleViolation::UnitValueZero);
        }
        if channel_amount < unit_value {
            return Err(ChannelRuleViolation::AmountBelowUnitValue {
                channel_amount,
                unit_value,
            });
        }

        let cap = match &commitment {
            ModeCommitment::Signature => None,
            ModeCommitment::Payword { max_k, .. } => Some(*max_k),
            ModeCommitment::Paytree { max_i, .. } => Some(*max_i),
        };
        if let Some(cap) = cap {
            if cap == 0 {
                return Err(ChannelRuleViolation::IndexCapZero);
            }
            let committed = cap.checked_mul(unit_value);
            let allowed = channel_amount.checked_add(unit_value);
            match (committed, allowed) {
                (Some(committed), Some(allowed)) if committed <= allowed => {}
                _ => {
                    return Err(ChannelRuleViolation::CommitmentOverspendsChannel {
                        cap,
                        unit_value,
                        channel_amount,
                    })
                }
            }
        }

        let latest = LatestState::unit(&commitment);
        Ok(Self {
            channel_id,
            client_public_key_der,
            client_fingerprint,
            channel_amount,
            unit_value,
            commitment,
            opened_at,
            status: ChannelStatus::Open,
            latest,
            final_statement: None,
        })
    }

    /// The channel's payment mode (fixed at open).
    pub fn mode(&self) -> PaymentMode {
        self.commitment.mode()
    }

    pub fn is_closed(&self) -> bool {
        self.status == ChannelStatus::Closed
    }

    /// Cumulative owed amount of the latest accepted state.
    pub fn cumulative_owed(&self) -> Amount {
        self.latest.cumulative_owed(self.unit_value)
    }
}
