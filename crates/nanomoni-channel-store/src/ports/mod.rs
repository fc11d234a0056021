//! # Store Port
//!
//! The interface the payment use-cases depend on. Implementations must be
//! thread-safe (`Send + Sync`) and must execute `apply_payment` as a
//! single atomic unit: load, guard and overwrite with no interleaving
//! writer in between.

use crate::domain::entities::{Channel, FinalStatement, LatestState};
use crate::domain::errors::StoreError;
use crate::domain::guards::PaymentGuard;
use shared_types::{ChannelId, KeyFingerprint, PaymentMode};

/// Persistent view of payment channels keyed by channel id, with a
/// secondary lookup by client key fingerprint.
pub trait ChannelStore: Send + Sync {
    /// Fetch a channel snapshot.
    fn get(&self, channel_id: &ChannelId) -> Result<Option<Channel>, StoreError>;

    /// The id of the client's currently open channel, if any. Backs the
    /// one-open-channel-per-client rule.
    fn find_open_by_client(
        &self,
        client: &KeyFingerprint,
    ) -> Result<Option<ChannelId>, StoreError>;

    /// Insert a freshly opened channel. Fails with `ChannelAlreadyOpen` if
    /// the id exists or the client already has an open channel.
    fn create(&self, channel: Channel) -> Result<(), StoreError>;

    /// Atomically replace `latest_state` with `candidate` if the guard
    /// accepts it against the current state.
    ///
    /// The guard MUST be evaluated inside the store's atomic section.
    /// Splitting load, check and store across round-trips reintroduces the
    /// lost-update race this method exists to prevent. On rejection the
    /// stored state is left untouched.
    fn apply_payment(
        &self,
        channel_id: &ChannelId,
        expected_mode: PaymentMode,
        candidate: LatestState,
        guard: &PaymentGuard,
    ) -> Result<LatestState, StoreError>;

    /// Transition `open -> closed`, freezing `latest_state` and recording
    /// the final statement. Returns the closed record. Fails with
    /// `AlreadyClosed` on a second call; callers wanting idempotent close
    /// read the frozen statement from the record instead.
    fn close(
        &self,
        channel_id: &ChannelId,
        statement: FinalStatement,
    ) -> Result<Channel, StoreError>;
}

impl<T: ChannelStore + ?Sized> ChannelStore for std::sync::Arc<T> {
    fn get(&self, channel_id: &ChannelId) -> Result<Option<Channel>, StoreError> {
        (**self).get(channel_id)
    }

    fn find_open_by_client(
        &self,
        client: &KeyFingerprint,
    ) -> Result<Option<ChannelId>, StoreError> {
        (**self).find_open_by_client(client)
    }

    fn create(&self, channel: Channel) -> Result<(), StoreError> {
        (**self).create(channel)
    }

    fn apply_payment(
        &self,
        channel_id: &ChannelId,
        expected_mode: PaymentMode,
        candidate: LatestState,
        guard: &PaymentGuard,
    ) -> Result<LatestState, StoreError> {
        (**self).apply_payment(channel_id, expected_mode, candidate, guard)
    }

    fn close(
        &self,
        channel_id: &ChannelId,
        statement: FinalStatement,
    ) -> Result<Channel, StoreError> {
        (**self).close(channel_id, statement)
    }
}
