//! Error types for issuing and looking up payment requests.
//!
//! Verification itself never fails with an error; see
//! [`VerificationOutcome`](crate::VerificationOutcome).

use crate::amount::AmountError;
use crate::network::Network;
use crate::outcome::FailureReason;

/// Error returned when a payment request cannot be issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueError {
    /// The amount is not payable with the stable-coin's precision.
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
    /// No recipient is configured for the requested network.
    #[error("No recipient configured for network {0}")]
    UnsupportedNetwork(Network),
}

/// Why a payment request could not be read from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No live entry has this id.
    #[error("Payment request not found")]
    NotFound,
    /// The entry existed but its expiry has passed.
    #[error("Payment request has expired")]
    Expired,
}

impl From<LookupError> for FailureReason {
    fn from(value: LookupError) -> Self {
        match value {
            LookupError::NotFound => Self::RequestNotFound,
            LookupError::Expired => Self::RequestExpired,
        }
    }
}

/// A transaction reference was already consumed by another payment request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transaction {0} was already used")]
pub struct TransactionAlreadyUsed(pub String);

impl From<TransactionAlreadyUsed> for FailureReason {
    fn from(_: TransactionAlreadyUsed) -> Self {
        Self::TransactionAlreadyUsed
    }
}
