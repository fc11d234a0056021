//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the payment service requires from the host application:
//! the Issuer's key directory and a clock.

use parking_lot::Mutex;
use shared_types::Timestamp;
use thiserror::Error;

/// Failure fetching the Issuer public key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// Network-level failure; try again later.
    #[error("issuer unreachable: {0}")]
    Unreachable(String),

    /// The directory answered with bytes that are not a key.
    #[error("issuer returned a malformed key")]
    MalformedKey,
}

/// Source of the Issuer's current public key.
///
/// Production: an HTTP client against `GET /issuer/public_key`.
/// Testing: [`StaticIssuerDirectory`] below.
pub trait IssuerDirectory: Send + Sync {
    /// Fetch the Issuer public key as DER SubjectPublicKeyInfo bytes.
    fn fetch_public_key_der(&self) -> Result<Vec<u8>, DirectoryError>;
}

/// Abstract clock (for testability).
pub trait TimeSource: Send + Sync {
    /// Current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Default time source using system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

// =============================================================================
// TEST DOUBLES
// Production adapters live with the host application; the doubles below
// serve unit and integration tests.
// =============================================================================

/// Directory that serves a fixed key, with optional injected failures.
#[derive(Default)]
pub struct StaticIssuerDirectory {
    key_der: Mutex<Option<Vec<u8>>>,
    fail_next: Mutex<u32>,
}

impl StaticIssuerDirectory {
    pub fn new(key_der: Vec<u8>) -> Self {
        Self {
            key_der: Mutex::new(Some(key_der)),
            fail_next: Mutex::new(0),
        }
    }

    /// Swap the served key, simulating an Issuer key rotation.
    pub fn rotate(&self, key_der: Vec<u8>) {
        *self.key_der.lock() = Some(key_der);
    }

    /// Make the next `n` fetches fail with `Unreachable`.
    pub fn fail_next(&self, n: u32) {
        *self.fail_next.lock() = n;
    }
}

impl IssuerDirectory for StaticIssuerDirectory {
    fn fetch_public_key_der(&self) -> Result<Vec<u8>, DirectoryError> {
        let mut failures = self.fail_next.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(DirectoryError::Unreachable("injected failure".into()));
        }
        self.key_der
            .lock()
            .clone()
            .ok_or_else(|| DirectoryError::Unreachable("no key configured".into()))
    }
}

/// Manually advanced clock for tests.
#[derive(Default)]
pub struct ManualTimeSource {
    now: Mutex<Timestamp>,
}

impl ManualTimeSource {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, secs: u64) {
        *self.now.lock() += secs;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<D: IssuerDirectory + ?Sized> IssuerDirectory for std::sync::Arc<D> {
    fn fetch_public_key_der(&self) -> Result<Vec<u8>, DirectoryError> {
        (**self).fetch_public_key_der()
    }
}
