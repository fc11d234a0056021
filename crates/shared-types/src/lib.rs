//! # NanoMoni Shared Types
//!
//! Identifiers, scalar aliases and textual encodings shared by every
//! subsystem: the crypto primitives, the channel store and the payment
//! use-cases.
//!
//! Nothing in this crate performs I/O or cryptography; it only defines the
//! vocabulary the other crates speak to each other in.

pub mod encoding;
pub mod entities;

pub use encoding::{b64_decode, b64_decode_array, b64_encode, EncodingError};
pub use entities::{Amount, ChannelId, KeyFingerprint, PaymentMode, Timestamp};
