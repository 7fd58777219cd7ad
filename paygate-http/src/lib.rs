#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP boundary of the payment gate.
//!
//! Reads the `x-payment-id` / `x-payment-proof` retry headers, asks the core
//! verifier whether the referenced transfer pays an outstanding demand, and
//! either lets the request through, answers HTTP 402 with a fresh demand, or
//! reports a verification fault.
//!
//! # Modules
//!
//! - [`constants`] - HTTP header names
//! - [`headers`] - Proof header encoding/decoding
//! - [`error`] - Header and gate fault errors
//! - [`body`] - 402 and fault response bodies
//! - [`gate`] - [`AccessGate`] and [`GateDecision`]
//! - [`layer`] - Per-route tower middleware
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing of gate decisions

pub mod body;
pub mod constants;
pub mod error;
pub mod gate;
pub mod headers;
pub mod layer;

pub use body::PaymentRequiredBody;
pub use error::{GateFault, HttpError};
pub use gate::{AccessGate, GateDecision, PriceTag};
pub use headers::{decode_payment_proof, encode_payment_proof};
pub use layer::{PaymentGateLayer, PaymentGateService};
