//! Error types for the Solana verifier and its RPC client.

use paygate::Network;

/// Error raised while setting up a [`LedgerChainVerifier`](crate::LedgerChainVerifier).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SvmConfigError {
    /// The network is not a Solana cluster.
    #[error("Network {0} is not a ledger chain")]
    NotLedgerNetwork(Network),
    /// The string is not a base58 public key.
    #[error("Invalid Solana public key {0:?}")]
    InvalidPubkey(String),
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Error talking to a Solana JSON-RPC node.
#[derive(Debug, thiserror::Error)]
pub enum LedgerRpcError {
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: reqwest::StatusCode,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },
}
