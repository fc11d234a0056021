//! # In-Memory Channel Store
//!
//! Reference implementation of the [`ChannelStore`] port. One `RwLock`
//! over the whole map: `apply_payment` holds the write lock across load,
//! guard and overwrite, which makes the update atomic with respect to
//! every other writer. A scripted backend (server-side transaction)
//! replaces this in production with the same guard semantics.

use crate::domain::entities::{Channel, ChannelStatus, FinalStatement, LatestState};
use crate::domain::errors::StoreError;
use crate::domain::guards::PaymentGuard;
use crate::ports::ChannelStore;
use parking_lot::RwLock;
use shared_types::{ChannelId, KeyFingerprint, PaymentMode};
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct StoreInner {
    channels: HashMap<ChannelId, Channel>,
    /// Open channels only; entries are removed on close.
    open_by_client: HashMap<KeyFingerprint, ChannelId>,
}

/// Thread-safe in-memory channel store.
#[derive(Default)]
pub struct InMemoryChannelStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, open or closed.
    pub fn len(&self) -> usize {
        self.inner.read().channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().channels.is_empty()
    }
}

impl ChannelStore for InMemoryChannelStore {
    fn get(&self, channel_id: &ChannelId) -> Result<Option<Channel>, StoreError> {
        Ok(self.inner.read().channels.get(channel_id).cloned())
    }

    fn find_open_by_client(
        &self,
        client: &KeyFingerprint,
    ) -> Result<Option<ChannelId>, StoreError> {
        Ok(self.inner.read().open_by_client.get(client).copied())
    }

    fn create(&self, channel: Channel) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        if inner.channels.contains_key(&channel.channel_id) {
            return Err(StoreError::ChannelAlreadyOpen);
        }
        if inner.open_by_client.contains_key(&channel.client_fingerprint) {
            return Err(StoreError::ChannelAlreadyOpen);
        }

        debug!(
            channel_id = %channel.channel_id,
            client = %channel.client_fingerprint,
            mode = %channel.mode(),
            channel_amount = channel.channel_amount,
            "channel created"
        );
        inner
            .open_by_client
            .insert(channel.client_fingerprint, channel.channel_id);
        inner.channels.insert(channel.channel_id, channel);
        Ok(())
    }

    fn apply_payment(
        &self,
        channel_id: &ChannelId,
        expected_mode: PaymentMode,
        candidate: LatestState,
        guard: &PaymentGuard,
    ) -> Result<LatestState, StoreError> {
        // Write lock held across load + guard + overwrite: the atomic unit.
        let mut inner = self.inner.write();
        let channel = inner
            .channels
            .get_mut(channel_id)
            .ok_or(StoreError::ChannelNotFound)?;

        if channel.is_closed() {
            return Err(StoreError::ChannelClosed);
        }
        if channel.mode() != expected_mode {
            return Err(StoreError::ModeMismatch {
                expected: expected_mode,
                actual: channel.mode(),
            });
        }

        guard.evaluate(&channel.latest, &candidate)?;

        debug!(
            channel_id = %channel_id,
            index = candidate.index(),
            "payment state applied"
        );
        channel.latest = candidate;
        Ok(channel.latest.clone())
    }

    fn close(
        &self,
        channel_id: &ChannelId,
        statement: FinalStatement,
    ) -> Result<Channel, StoreError> {
        let mut inner = self.inner.write();
        let channel = inner
            .channels
            .get_mut(channel_id)
            .ok_or(StoreError::ChannelNotFound)?;

        if channel.is_closed() {
            return Err(StoreError::AlreadyClosed);
        }

        channel.status = ChannelStatus::Closed;
        channel.final_statement = Some(statement);
        let closed = channel.clone();

        inner.open_by_client.remove(&closed.client_fingerprint);
        debug!(
            channel_id = %channel_id,
            final_owed = closed.cumulative_owed(),
            "channel closed"
        );
        Ok(closed)
    }
}
