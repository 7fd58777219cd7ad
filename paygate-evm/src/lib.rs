#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Account-chain (EVM) payment proof verification.
//!
//! Implements [`paygate::ChainVerifier`] for EIP-155 networks. A proof is a
//! transaction hash; the verifier reads the receipt and the transaction from
//! a JSON-RPC node, decodes the ERC-20 `Transfer` event emitted by the USDC
//! contract, and compares recipient and amount with the payment request.
//!
//! # Modules
//!
//! - [`contract`] - Solidity event definitions
//! - [`networks`] - Known USDC deployments
//! - [`provider`] - Read-only RPC surface and its alloy implementation
//! - [`verifier`] - [`AccountChainVerifier`]
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing spans around RPC calls

pub mod contract;
pub mod error;
pub mod networks;
pub mod provider;
pub mod verifier;

pub use error::EvmConfigError;
pub use networks::{parse_address, usdc_address};
pub use provider::{AccountChainRpc, AlloyRpc, http_rpc};
pub use verifier::AccountChainVerifier;
