//! # NanoMoni Payment Use-Cases
//!
//! The vendor-side payment engine: opening channels against Issuer
//! certificates, accepting payments in the three modes, and closing
//! channels into signed final statements.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): canonical signed payloads, the certificate,
//!   pure replay validators and the error taxonomy.
//! - **Ports** (`ports/`): the inbound [`PaymentApi`] and the outbound
//!   [`IssuerDirectory`] / [`TimeSource`] dependencies.
//! - **Adapters** (`adapters/`): the cached Issuer public key.
//! - **Service** (`service.rs`): wires domain logic to the channel store.
//!
//! The HTTP layer above this crate is a collaborator, not a member: it
//! authenticates callers and hands the service typed requests plus the
//! exact body bytes that were signed.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::issuer_cache::IssuerKeyCache;
pub use config::PaymentConfig;
pub use domain::certificate::{Certificate, CertificateError};
pub use domain::errors::PaymentError;
pub use domain::payloads::{
    CertificateBody, ClosingStatementPayload, OpenChannelPayload, SignatureUpdatePayload,
};
pub use ports::inbound::{
    CloseChannelRequest, FinalStatementResponse, OpenChannelRequest, OpenChannelResponse,
    PaymentApi, PaytreePaymentReceipt, PaytreePaymentRequest, PaywordPaymentReceipt,
    PaywordPaymentRequest, SignaturePaymentReceipt, SignaturePaymentRequest,
};
pub use ports::outbound::{
    DirectoryError, IssuerDirectory, ManualTimeSource, StaticIssuerDirectory, SystemTimeSource,
    TimeSource,
};
pub use service::PaymentService;
