//! # Payment Service
//!
//! Implements [`PaymentApi`] over a [`ChannelStore`], an
//! [`IssuerDirectory`] and a [`TimeSource`], all injected.
//!
//! Every mutation of channel state goes through the store's atomic
//! `apply_payment`; this layer verifies auth material against read-only
//! snapshots and never writes back a locally modified copy. Validation
//! errors are final; only a transient store failure is retried, once.

use crate::adapters::issuer_cache::IssuerKeyCache;
use crate::config::PaymentConfig;
use crate::domain::errors::PaymentError;
use crate::domain::payloads::{ClosingStatementPayload, SignatureUpdatePayload};
use crate::domain::validators::{check_replay, ReplayCheck};
use crate::ports::inbound::{
    CloseChannelRequest, FinalStatementResponse, OpenChannelRequest, OpenChannelResponse,
    PaymentApi, PaytreePaymentReceipt, PaytreePaymentRequest, PaywordPaymentReceipt,
    PaywordPaymentRequest, SignaturePaymentReceipt, SignaturePaymentRequest,
};
use crate::ports::outbound::{IssuerDirectory, TimeSource};
use nanomoni_channel_store::{
    Channel, ChannelStore, FinalStatement, LatestState, ModeCommitment, PaymentGuard,
    PaytreeState, PaywordState, SignatureState, StoreError,
};
use shared_crypto::paytree::MerkleProof;
use shared_crypto::{verify_token, verify_token_step, EcdsaKeyPair, EcdsaPublicKey};
use shared_types::{b64_decode, b64_decode_array, b64_encode, ChannelId, PaymentMode};
use tracing::{info, warn};

/// The vendor-side payment engine.
pub struct PaymentService<S, D, T>
where
    S: ChannelStore,
    D: IssuerDirectory,
    T: TimeSource,
{
    store: S,
    issuer_keys: IssuerKeyCache<D>,
    time: T,
    vendor_keys: EcdsaKeyPair,
    config: PaymentConfig,
}

impl<S, D, T> PaymentService<S, D, T>
where
    S: ChannelStore,
    D: IssuerDirectory,
    T: TimeSource,
{
    pub fn new(
        store: S,
        issuer_directory: D,
        time: T,
        vendor_keys: EcdsaKeyPair,
        config: PaymentConfig,
    ) -> Self {
        let issuer_keys = IssuerKeyCache::new(
            issuer_directory,
            config.issuer_backoff_base_secs,
            config.issuer_backoff_cap_secs,
        );
        Self {
            store,
            issuer_keys,
            time,
            vendor_keys,
            config,
        }
    }

    /// Run a store call, retrying once with backoff on a transient
    /// failure. Rejections pass through untouched.
    fn with_retry<R>(
        &self,
        mut op: impl FnMut() -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        match op() {
            Err(StoreError::Unavailable(reason)) => {
                warn!(%reason, "store unavailable, retrying once");
                std::thread::sleep(self.config.store_retry_backoff);
                op()
            }
            other => other,
        }
    }

    fn load_channel(&self, channel_id: &ChannelId) -> Result<Channel, PaymentError> {
        self.with_retry(|| self.store.get(channel_id))?
            .ok_or(PaymentError::ChannelNotFound)
    }

    /// Snapshot checks shared by the three pay flows.
    fn require_open_in_mode(
        channel: &Channel,
        expected: PaymentMode,
    ) -> Result<(), PaymentError> {
        if channel.is_closed() {
            return Err(PaymentError::ChannelClosed);
        }
        if channel.mode() != expected {
            return Err(PaymentError::ModeMismatch {
                expected,
                actual: channel.mode(),
            });
        }
        Ok(())
    }

    fn client_key(channel: &Channel) -> Result<EcdsaPublicKey, PaymentError> {
        // The key was validated at open; failure here means the record was
        // corrupted out from under us.
        EcdsaPublicKey::from_der(&channel.client_public_key_der)
            .map_err(|_| PaymentError::InvalidSignature)
    }

    fn statement_response(statement: &FinalStatement) -> FinalStatementResponse {
        FinalStatementResponse {
            channel_id: statement.channel_id,
            final_cumulative_owed_amount: statement.final_cumulative_owed_amount,
            closed_at: statement.closed_at,
            client_signature_b64: b64_encode(&statement.client_signature_der),
            vendor_signature_b64: b64_encode(&statement.vendor_signature_der),
        }
    }
}

impl<S, D, T> PaymentApi for PaymentService<S, D, T>
where
    S: ChannelStore,
    D: IssuerDirectory,
    T: TimeSource,
{
    fn open_channel(
        &self,
        request: OpenChannelRequest,
    ) -> Result<OpenChannelResponse, PaymentError> {
        let now = self.time.now();

        // 1) The certificate, under the cached Issuer key.
        self.issuer_keys.verify_certificate(
            &request.certificate,
            now,
            self.config.certificate_clock_skew_secs,
        )?;

        // 2) The certificate must cover the key the request claims.
        if request.certificate.body.client_public_key_der_b64
            != request.payload.client_public_key_der_b64
        {
            return Err(PaymentError::InvalidCertificate(
                "certificate does not cover the requesting client key".into(),
            ));
        }
        if request.payload.channel_amount > request.certificate.body.initial_balance {
            return Err(PaymentError::InvalidCertificate(format!(
                "channel amount {} exceeds certified balance {}",
                request.payload.channel_amount, request.certificate.body.initial_balance
            )));
        }

        // 3) The client's signature over the canonical request bytes.
        let payload_bytes = request.payload.canonical_bytes()?;
        let client_key_der = b64_decode(&request.payload.client_public_key_der_b64)
            .map_err(|e| PaymentError::MalformedRequest(e.to_string()))?;
        let client_key = EcdsaPublicKey::from_der(&client_key_der)
            .map_err(|_| PaymentError::MalformedRequest("client key is not DER SPKI".into()))?;
        let signature = b64_decode(&request.client_signature_b64)
            .map_err(|e| PaymentError::MalformedRequest(e.to_string()))?;
        client_key
            .verify(&payload_bytes, &signature)
            .map_err(|_| PaymentError::InvalidSignature)?;

        // 4) Commitment shape and channel rules.
        let commitment = request.payload.commitment()?;
        let channel = Channel::open(
            ChannelId::generate(),
            client_key_der,
            client_key.fingerprint(),
            request.payload.channel_amount,
            request.payload.unit_value,
            commitment,
            now,
        )
        .map_err(|e| PaymentError::InvalidCommitment(e.to_string()))?;
        let channel_id = channel.channel_id;

        // 5) Persist; the store enforces one open channel per client.
        self.with_retry(|| self.store.create(channel.clone()))?;

        info!(
            %channel_id,
            client = %client_key.fingerprint(),
            mode = %request.payload.mode,
            channel_amount = request.payload.channel_amount,
            "channel opened"
        );
        Ok(OpenChannelResponse { channel_id })
    }

    fn pay_signature(
        &self,
        request: SignaturePaymentRequest,
    ) -> Result<SignaturePaymentReceipt, PaymentError> {
        let now = self.time.now();
        let channel = self.load_channel(&request.channel_id)?;
        Self::require_open_in_mode(&channel, PaymentMode::Signature)?;

        let signature_der = b64_decode(&request.signature_b64)
            .map_err(|e| PaymentError::MalformedRequest(e.to_string()))?;

        if let LatestState::Signature(current) = &channel.latest {
            match check_replay(
                request.cumulative_owed_amount,
                &signature_der,
                current.cumulative_owed_amount,
                &current.client_signature_der,
            ) {
                ReplayCheck::Duplicate => {
                    // Same amount, same bytes: a retransmission, answered
                    // from the stored state.
                    return Ok(SignaturePaymentReceipt {
                        channel_id: request.channel_id,
                        accepted_owed_amount: current.cumulative_owed_amount,
                        accepted_at: current.updated_at,
                    });
                }
                ReplayCheck::Mismatch => {
                    warn!(channel_id = %request.channel_id, "same owed amount, different signature");
                    return Err(PaymentError::NonMonotonicIndex {
                        current: current.cumulative_owed_amount,
                        candidate: request.cumulative_owed_amount,
                    });
                }
                ReplayCheck::Fresh => {}
            }
        }

        let payload = SignatureUpdatePayload {
            channel_id: request.channel_id,
            cumulative_owed_amount: request.cumulative_owed_amount,
        };
        Self::client_key(&channel)?
            .verify(&payload.canonical_bytes()?, &signature_der)
            .map_err(|_| PaymentError::InvalidSignature)?;

        let candidate = LatestState::Signature(SignatureState {
            cumulative_owed_amount: request.cumulative_owed_amount,
            client_signature_der: signature_der,
            updated_at: now,
        });
        let guard = PaymentGuard::for_channel(&channel);
        let applied = self.with_retry(|| {
            self.store.apply_payment(
                &request.channel_id,
                PaymentMode::Signature,
                candidate.clone(),
                &guard,
            )
        })?;

        match applied {
            LatestState::Signature(state) => Ok(SignaturePaymentReceipt {
                channel_id: request.channel_id,
                accepted_owed_amount: state.cumulative_owed_amount,
                accepted_at: state.updated_at,
            }),
            other => Err(PaymentError::ModeMismatch {
                expected: PaymentMode::Signature,
                actual: other.mode(),
            }),
        }
    }

    fn pay_payword(
        &self,
        request: PaywordPaymentRequest,
    ) -> Result<PaywordPaymentReceipt, PaymentError> {
        let now = self.time.now();
        let channel = self.load_channel(&request.channel_id)?;
        Self::require_open_in_mode(&channel, PaymentMode::Payword)?;

        let (root, max_k) = match &channel.commitment {
            ModeCommitment::Payword { root, max_k } => (*root, *max_k),
            other => {
                return Err(PaymentError::ModeMismatch {
                    expected: PaymentMode::Payword,
                    actual: other.mode(),
                })
            }
        };
        let latest = match &channel.latest {
            LatestState::Payword(state) => state.clone(),
            other => {
                return Err(PaymentError::ModeMismatch {
                    expected: PaymentMode::Payword,
                    actual: other.mode(),
                })
            }
        };

        // Index sanity before any hashing; the guard re-checks atomically.
        if request.k == 0 {
            return Err(PaymentError::NonMonotonicIndex {
                current: latest.k,
                candidate: 0,
            });
        }
        if request.k > max_k {
            return Err(PaymentError::ExceedsIndexCap {
                candidate: request.k,
                cap: max_k,
            });
        }

        let token = b64_decode_array::<32>(&request.token_b64)
            .map_err(|e| PaymentError::MalformedRequest(e.to_string()))?;

        match check_replay(request.k, &token, latest.k, &latest.token) {
            ReplayCheck::Duplicate => {
                return Ok(PaywordPaymentReceipt {
                    channel_id: request.channel_id,
                    accepted_k: latest.k,
                    cumulative_owed_amount: channel.latest.cumulative_owed(channel.unit_value),
                    accepted_at: latest.updated_at,
                });
            }
            ReplayCheck::Mismatch => {
                warn!(channel_id = %request.channel_id, k = request.k, "same k, different token");
                return Err(PaymentError::NonMonotonicIndex {
                    current: latest.k,
                    candidate: request.k,
                });
            }
            ReplayCheck::Fresh => {}
        }

        // One hash from the token on file when k advances by exactly one;
        // full chain verification when it skips ahead.
        let token_is_valid = if request.k == latest.k + 1 {
            verify_token_step(&token, &latest.token)
        } else {
            verify_token(&token, request.k, &root, max_k)
        };
        if !token_is_valid {
            return Err(PaymentError::InvalidToken);
        }

        let candidate = LatestState::Payword(PaywordState {
            k: request.k,
            token,
            updated_at: now,
        });
        let guard = PaymentGuard::for_channel(&channel);
        let applied = self.with_retry(|| {
            self.store.apply_payment(
                &request.channel_id,
                PaymentMode::Payword,
                candidate.clone(),
                &guard,
            )
        })?;

        match applied {
            LatestState::Payword(state) => Ok(PaywordPaymentReceipt {
                channel_id: request.channel_id,
                accepted_k: state.k,
                cumulative_owed_amount: state.k.saturating_mul(channel.unit_value),
                accepted_at: state.updated_at,
            }),
            other => Err(PaymentError::ModeMismatch {
                expected: PaymentMode::Payword,
                actual: other.mode(),
            }),
        }
    }

    fn pay_paytree(
        &self,
        request: PaytreePaymentRequest,
    ) -> Result<PaytreePaymentReceipt, PaymentError> {
        let now = self.time.now();
        let channel = self.load_channel(&request.channel_id)?;
        Self::require_open_in_mode(&channel, PaymentMode::Paytree)?;

        let (root, max_i) = match &channel.commitment {
            ModeCommitment::Paytree { root, max_i } => (*root, *max_i),
            other => {
                return Err(PaymentError::ModeMismatch {
                    expected: PaymentMode::Paytree,
                    actual: other.mode(),
                })
            }
        };
        let latest = match &channel.latest {
            LatestState::Paytree(state) => state.clone(),
            other => {
                return Err(PaymentError::ModeMismatch {
                    expected: PaymentMode::Paytree,
                    actual: other.mode(),
                })
            }
        };

        // The first accepted index is 1; zero is the unit state, not a
        // payment.
        if request.i == 0 {
            return Err(PaymentError::NonMonotonicIndex {
                current: latest.i,
                candidate: 0,
            });
        }
        if request.i > max_i {
            return Err(PaymentError::ExceedsIndexCap {
                candidate: request.i,
                cap: max_i,
            });
        }

        let leaf = b64_decode_array::<32>(&request.leaf_b64)
            .map_err(|e| PaymentError::MalformedRequest(e.to_string()))?;
        let siblings = request
            .proof_b64
            .iter()
            .map(|s| b64_decode_array::<32>(s))
            .collect::<Result<Vec<[u8; 32]>, _>>()
            .map_err(|e| PaymentError::MalformedRequest(e.to_string()))?;
        let proof = MerkleProof { siblings };

        match check_replay(request.i, &leaf, latest.i, &latest.leaf) {
            ReplayCheck::Duplicate => {
                return Ok(PaytreePaymentReceipt {
                    channel_id: request.channel_id,
                    accepted_i: latest.i,
                    cumulative_owed_amount: channel.latest.cumulative_owed(channel.unit_value),
                    accepted_at: latest.updated_at,
                });
            }
            ReplayCheck::Mismatch => {
                warn!(channel_id = %request.channel_id, i = request.i, "same i, different leaf");
                return Err(PaymentError::NonMonotonicIndex {
                    current: latest.i,
                    candidate: request.i,
                });
            }
            ReplayCheck::Fresh => {}
        }

        if !shared_crypto::verify_proof(&leaf, request.i, &proof, &root, max_i) {
            return Err(PaymentError::InvalidProof);
        }

        let candidate = LatestState::Paytree(PaytreeState {
            i: request.i,
            leaf,
            proof,
            updated_at: now,
        });
        let guard = PaymentGuard::for_channel(&channel);
        let applied = self.with_retry(|| {
            self.store.apply_payment(
                &request.channel_id,
                PaymentMode::Paytree,
                candidate.clone(),
                &guard,
            )
        })?;

        match applied {
            LatestState::Paytree(state) => Ok(PaytreePaymentReceipt {
                channel_id: request.channel_id,
                accepted_i: state.i,
                cumulative_owed_amount: state.i.saturating_mul(channel.unit_value),
                accepted_at: state.updated_at,
            }),
            other => Err(PaymentError::ModeMismatch {
                expected: PaymentMode::Paytree,
                actual: other.mode(),
            }),
        }
    }

    fn close_channel(
        &self,
        request: CloseChannelRequest,
    ) -> Result<FinalStatementResponse, PaymentError> {
        let channel = self.load_channel(&request.channel_id)?;

        // Idempotent: a closed channel answers with its frozen statement.
        if channel.is_closed() {
            return match &channel.final_statement {
                Some(statement) => Ok(Self::statement_response(statement)),
                None => Err(PaymentError::StoreUnavailable(
                    "closed channel has no final statement".into(),
                )),
            };
        }

        let final_owed = channel.cumulative_owed();
        let payload = ClosingStatementPayload {
            channel_id: request.channel_id,
            final_cumulative_owed_amount: final_owed,
            closed_at: request.closed_at,
        };
        let payload_bytes = payload.canonical_bytes()?;

        let client_signature_der = b64_decode(&request.client_signature_b64)
            .map_err(|e| PaymentError::MalformedRequest(e.to_string()))?;
        Self::client_key(&channel)?
            .verify(&payload_bytes, &client_signature_der)
            .map_err(|_| PaymentError::InvalidSignature)?;

        // Vendor co-signs the identical bytes for settlement.
        let vendor_signature_der = self.vendor_keys.sign(&payload_bytes);
        let statement = FinalStatement {
            channel_id: request.channel_id,
            final_cumulative_owed_amount: final_owed,
            closed_at: request.closed_at,
            client_signature_der,
            vendor_signature_der,
        };

        match self.with_retry(|| self.store.close(&request.channel_id, statement.clone())) {
            Ok(closed) => {
                info!(
                    channel_id = %request.channel_id,
                    final_owed,
                    "channel closed"
                );
                match &closed.final_statement {
                    Some(frozen) => Ok(Self::statement_response(frozen)),
                    None => Ok(Self::statement_response(&statement)),
                }
            }
            // Lost a close race: someone else froze the statement first.
            Err(StoreError::AlreadyClosed) => {
                let reloaded = self.load_channel(&request.channel_id)?;
                match &reloaded.final_statement {
                    Some(frozen) => Ok(Self::statement_response(frozen)),
                    None => Err(PaymentError::StoreUnavailable(
                        "closed channel has no final statement".into(),
                    )),
                }
            }
            Err(other) => Err(other.into()),
        }
    }
}
