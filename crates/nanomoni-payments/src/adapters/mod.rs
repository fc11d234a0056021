//! Adapters owned by the payment use-cases.

pub mod issuer_cache;
