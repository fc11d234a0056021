//! # Integration Tests Crate
//!
//! End-to-end scenarios exercised through the public [`PaymentApi`]
//! against the in-memory channel store, with real keys and real
//! commitments.
//!
//! ## Structure
//!
//! ```text
//! integration-tests/
//! └── src/
//!     ├── lib.rs         # This file
//!     ├── support.rs     # Shared harness: keys, certificates, requests
//!     ├── end_to_end.rs  # Literal scenarios (happy paths, caps, races)
//!     └── properties.rs  # Cross-mode invariants (monotonicity, caps,
//!                        #   first-payment floor)
//! ```
//!
//! [`PaymentApi`]: nanomoni_payments::PaymentApi

#[cfg(test)]
mod end_to_end;
#[cfg(test)]
mod properties;
#[cfg(test)]
mod support;
