//! # Channel State Store
//!
//! Owns every payment channel's record and its `latest_state`, and is the
//! only place that mutates them.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): channel entities, per-mode latest states and
//!   the guard predicate DSL. Pure data and pure functions.
//! - **Ports** (`ports/`): the [`ChannelStore`] trait the use-case layer
//!   depends on.
//! - **Adapters** (`adapters/`): the in-memory store. A production
//!   deployment would back this with a server-side-scripted store; the
//!   guard DSL is deliberately small enough to transcribe into one.
//!
//! ## The atomic primitive
//!
//! `apply_payment` runs load → guard → overwrite as one atomic unit.
//! Use-cases never read state, compare it and write it back in separate
//! store calls; that split is exactly the lost-update bug this crate
//! exists to prevent.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::InMemoryChannelStore;
pub use domain::entities::{
    Channel, ChannelRuleViolation, ChannelStatus, FinalStatement, LatestState, ModeCommitment,
    PaytreeState, PaywordState, SignatureState,
};
pub use domain::errors::StoreError;
pub use domain::guards::PaymentGuard;
pub use ports::ChannelStore;
