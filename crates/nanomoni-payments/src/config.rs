//! Service configuration.

use std::time::Duration;

/// Tunables for the payment service.
#[derive(Clone, Debug)]
pub struct PaymentConfig {
    /// Tolerance when checking certificate validity windows, in seconds.
    pub certificate_clock_skew_secs: u64,
    /// Pause before the single retry of a transient store failure.
    pub store_retry_backoff: Duration,
    /// First Issuer-refresh backoff interval, in seconds; doubles per
    /// consecutive failure.
    pub issuer_backoff_base_secs: u64,
    /// Upper bound on the Issuer-refresh backoff, in seconds.
    pub issuer_backoff_cap_secs: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            certificate_clock_skew_secs: 30,
            store_retry_backoff: Duration::from_millis(50),
            issuer_backoff_base_secs: 1,
            issuer_backoff_cap_secs: 60,
        }
    }
}
