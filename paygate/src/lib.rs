#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for payment-gated resource access.
//!
//! This crate implements the server side of the HTTP 402 "Payment Required"
//! pattern: a protected endpoint hands out a time-bound payment demand, the
//! client pays it on-chain out of band, and then retries with a reference to
//! the transfer. The transfer is inspected on the designated chain and, when
//! it matches the demand, the demand is consumed exactly once.
//!
//! Chain-specific inspection lives in separate crates (`paygate-evm` for
//! account-based chains, `paygate-svm` for Solana) which implement the
//! [`verifier::ChainVerifier`] capability defined here.
//!
//! # Modules
//!
//! - [`amount`] - Decimal amounts, base-unit normalization and tolerance
//! - [`clock`] - Injectable wall clock
//! - [`issuer`] - Creation of new payment demands
//! - [`network`] - Supported networks and their chain families
//! - [`outcome`] - Verification outcome and failure reason codes
//! - [`request`] - Payment request, spec and proof types
//! - [`settings`] - Verification settings shared by chain verifiers
//! - [`store`] - In-memory registry of outstanding payment demands
//! - [`verifier`] - Chain verifier capability and the `verify` operation
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod amount;
pub mod clock;
pub mod error;
pub mod issuer;
pub mod network;
pub mod outcome;
pub mod request;
pub mod settings;
pub mod store;
pub mod verifier;

pub use amount::Amount;
pub use issuer::{IssuerConfig, RequestIssuer};
pub use network::{ChainFamily, Network};
pub use outcome::{FailureReason, VerificationOutcome, VerifiedPayment};
pub use request::{PaymentProof, PaymentRequest, PaymentSpec};
pub use settings::VerificationSettings;
pub use store::PaymentRequestStore;
pub use verifier::{ChainVerifier, FailurePolicy, PaymentVerifier, VerifierRegistry};
