//! Payment gate HTTP server.
//!
//! Wires the core store, issuer and verifier, the account- and ledger-chain
//! verifiers, and the HTTP gate into an axum application driven by a TOML
//! configuration.
//!
//! # Modules
//!
//! - [`config`] - Server configuration with environment variable expansion
//! - [`error`] - Startup and API error types
//! - [`handlers`] - Axum route handlers and router builder
//! - [`shutdown`] - Signal handling and background task tracking
//! - [`state`] - Assembly of the gate from configuration

pub mod config;
pub mod error;
pub mod handlers;
pub mod shutdown;
pub mod state;

pub use config::ServerConfig;
pub use handlers::router;
pub use state::AppState;
