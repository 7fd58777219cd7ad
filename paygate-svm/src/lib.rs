#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Ledger-chain (Solana) payment proof verification.
//!
//! Implements [`paygate::ChainVerifier`] for Solana clusters. A proof is a
//! base58 transaction signature; the verifier fetches the transaction in
//! `jsonParsed` encoding and looks for an SPL token transfer of the USDC mint
//! to the requested token account.
//!
//! # Modules
//!
//! - [`networks`] - USDC mints and token program ids
//! - [`rpc`] - [`LedgerRpc`] and the `reqwest` JSON-RPC client
//! - [`types`] - `jsonParsed` transaction shapes
//! - [`verifier`] - [`LedgerChainVerifier`]
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing spans around RPC calls

pub mod error;
pub mod networks;
pub mod rpc;
pub mod types;
pub mod verifier;

pub use error::{LedgerRpcError, SvmConfigError};
pub use networks::{parse_pubkey, usdc_mint};
pub use rpc::{JsonRpcLedgerClient, LedgerRpc};
pub use verifier::LedgerChainVerifier;
