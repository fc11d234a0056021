//! Core identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Monetary amount in the smallest accounting unit.
///
/// Channel caps, unit values and cumulative owed amounts are all plain
/// integers; no currency or decimal handling happens off-chain.
pub type Amount = u64;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Stable identifier of a payment channel, assigned by the vendor when the
/// channel is opened. Unique per `(vendor, client)` pair while open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(Uuid);

impl ChannelId {
    /// Generate a fresh random channel id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the canonical hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// The underlying 128-bit value.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// SHA-256 fingerprint of a DER-encoded public key.
///
/// Used as the address of a client everywhere a full key would be
/// wasteful: the single-open-channel index and log lines.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyFingerprint([u8; 32]);

impl KeyFingerprint {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, the textual form for digests.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Eight hex chars are enough to tell clients apart in logs.
        write!(f, "KeyFingerprint({}..)", &self.to_hex()[..8])
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The authentication scheme a channel is locked to at open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Cumulative signed owed-amount updates.
    Signature,
    /// Hash-chain tokens.
    Payword,
    /// Merkle-tree tokens.
    Paytree,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentMode::Signature => "signature",
            PaymentMode::Payword => "payword",
            PaymentMode::Paytree => "paytree",
        };
        f.write_str(name)
    }
}
