//! Configuration errors for account-chain verifiers.

use paygate::Network;

/// Error raised while setting up an [`AccountChainVerifier`](crate::AccountChainVerifier).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvmConfigError {
    /// The network is not an account-based chain.
    #[error("Network {0} is not an account-based chain")]
    NotAccountNetwork(Network),
    /// The string is not a 20-byte hex address.
    #[error("Invalid EVM address {0:?}")]
    InvalidAddress(String),
}
