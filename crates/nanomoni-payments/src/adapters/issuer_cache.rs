//! # Issuer Public Key Cache
//!
//! The only process-wide state in the engine: a single cached Issuer key
//! behind a read-biased lock. Fetched lazily on first use. A certificate
//! that fails signature verification forces exactly one refresh before the
//! rejection stands, so a rotated Issuer key cannot keep rejecting valid
//! certificates, and a stale key cannot keep accepting revoked ones.
//! Refresh failures back off exponentially.

use crate::domain::certificate::{Certificate, CertificateError};
use crate::domain::errors::PaymentError;
use crate::ports::outbound::{DirectoryError, IssuerDirectory};
use parking_lot::{Mutex, RwLock};
use shared_crypto::EcdsaPublicKey;
use shared_types::Timestamp;
use tracing::{debug, warn};

#[derive(Default)]
struct BackoffState {
    consecutive_failures: u32,
    not_before: Timestamp,
}

/// Cached Issuer public key with refresh-on-rotation.
pub struct IssuerKeyCache<D: IssuerDirectory> {
    directory: D,
    cell: RwLock<Option<EcdsaPublicKey>>,
    backoff: Mutex<BackoffState>,
    backoff_base_secs: u64,
    backoff_cap_secs: u64,
}

impl<D: IssuerDirectory> IssuerKeyCache<D> {
    pub fn new(directory: D, backoff_base_secs: u64, backoff_cap_secs: u64) -> Self {
        Self {
            directory,
            cell: RwLock::new(None),
            backoff: Mutex::new(BackoffState::default()),
            backoff_base_secs,
            backoff_cap_secs,
        }
    }

    /// The cached key, fetching it on first use.
    pub fn current(&self, now: Timestamp) -> Result<EcdsaPublicKey, PaymentError> {
        if let Some(key) = self.cell.read().as_ref() {
            return Ok(key.clone());
        }
        self.refresh(now)
    }

    /// Drop the cache and fetch a fresh key, honoring the backoff window.
    pub fn refresh(&self, now: Timestamp) -> Result<EcdsaPublicKey, PaymentError> {
        {
            let backoff = self.backoff.lock();
            if now < backoff.not_before {
                return Err(PaymentError::IssuerUnreachable(format!(
                    "refresh backed off until {}",
                    backoff.not_before
                )));
            }
        }

        match self.fetch() {
            Ok(key) => {
                debug!(fingerprint = %key.fingerprint(), "issuer key cached");
                *self.cell.write() = Some(key.clone());
                *self.backoff.lock() = BackoffState::default();
                Ok(key)
            }
            Err(err) => {
                let mut backoff = self.backoff.lock();
                backoff.consecutive_failures += 1;
                let exponent = backoff.consecutive_failures.saturating_sub(1).min(32);
                let delay = self
                    .backoff_base_secs
                    .saturating_mul(1u64 << exponent)
                    .min(self.backoff_cap_secs);
                backoff.not_before = now.saturating_add(delay);
                warn!(
                    failures = backoff.consecutive_failures,
                    retry_in = delay,
                    "issuer key refresh failed"
                );
                Err(err)
            }
        }
    }

    fn fetch(&self) -> Result<EcdsaPublicKey, PaymentError> {
        let der = self.directory.fetch_public_key_der().map_err(|e| match e {
            DirectoryError::Unreachable(msg) => PaymentError::IssuerUnreachable(msg),
            DirectoryError::MalformedKey => {
                PaymentError::IssuerUnreachable("directory returned a malformed key".into())
            }
        })?;
        EcdsaPublicKey::from_der(&der)
            .map_err(|_| PaymentError::IssuerUnreachable("directory returned a malformed key".into()))
    }

    /// Verify a certificate under the cached key.
    ///
    /// A signature failure triggers one forced refresh and a re-check
    /// before `invalid_certificate` is returned; window violations never
    /// do (a rotated key cannot fix an expired certificate).
    pub fn verify_certificate(
        &self,
        certificate: &Certificate,
        now: Timestamp,
        clock_skew: u64,
    ) -> Result<(), PaymentError> {
        let key = self.current(now)?;
        match certificate.verify(&key, now, clock_skew) {
            Ok(()) => Ok(()),
            Err(CertificateError::BadSignature) => {
                debug!("certificate rejected under cached key; forcing issuer key refresh");
                match self.refresh(now) {
                    Ok(fresh) => certificate
                        .verify(&fresh, now, clock_skew)
                        .map_err(|e| PaymentError::InvalidCertificate(e.to_string())),
                    // Refresh being unavailable does not excuse the
                    // certificate; report the verification failure.
                    Err(_) => Err(PaymentError::InvalidCertificate(
                        CertificateError::BadSignature.to_string(),
                    )),
                }
            }
            Err(other) => Err(PaymentError::InvalidCertificate(other.to_string())),
        }
    }
}
