//! Verification outcomes and machine-readable failure reasons.
//!
//! Verification never returns an error to its caller. Every path, including
//! RPC failures and malformed client input, resolves to a
//! [`VerificationOutcome`] so that a misbehaving client cannot abort the gate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::PaymentRequest;

/// Why a payment proof was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FailureReason {
    /// No live payment request has this id.
    RequestNotFound,
    /// The payment request expired before it was satisfied.
    RequestExpired,
    /// The proof names a different network than the request.
    NetworkMismatch,
    /// The referenced transaction does not exist on-chain.
    TxNotFound,
    /// The referenced transaction failed or reverted.
    TxFailed,
    /// The transaction did not call the configured stable-coin contract.
    WrongContract,
    /// The transfer moved an asset other than the configured stable-coin.
    WrongAsset,
    /// The transaction contains no recognizable token transfer.
    NoTransferFound,
    /// The transfer went to someone other than the request's recipient.
    RecipientMismatch,
    /// The transferred amount differs from the requested one beyond tolerance.
    AmountMismatch,
    /// The transaction already satisfied another payment request.
    TransactionAlreadyUsed,
    /// The transaction was confirmed before the payment request was issued.
    StaleTransaction,
    /// The payment request was issued for a different price.
    PriceMismatch,
    /// The chain could not be queried (timeout, transport error, no provider).
    ChainUnavailable,
    /// The proof could not be parsed.
    MalformedProof,
}

impl FailureReason {
    /// Returns the `snake_case` wire code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestNotFound => "request_not_found",
            Self::RequestExpired => "request_expired",
            Self::NetworkMismatch => "network_mismatch",
            Self::TxNotFound => "tx_not_found",
            Self::TxFailed => "tx_failed",
            Self::WrongContract => "wrong_contract",
            Self::WrongAsset => "wrong_asset",
            Self::NoTransferFound => "no_transfer_found",
            Self::RecipientMismatch => "recipient_mismatch",
            Self::AmountMismatch => "amount_mismatch",
            Self::TransactionAlreadyUsed => "transaction_already_used",
            Self::StaleTransaction => "stale_transaction",
            Self::PriceMismatch => "price_mismatch",
            Self::ChainUnavailable => "chain_unavailable",
            Self::MalformedProof => "malformed_proof",
        }
    }

    /// Returns a short human-readable explanation.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::RequestNotFound => "Payment request not found",
            Self::RequestExpired => "Payment request has expired",
            Self::NetworkMismatch => "Proof network does not match the payment request",
            Self::TxNotFound => "Transaction not found on chain",
            Self::TxFailed => "Transaction failed on chain",
            Self::WrongContract => "Transaction did not interact with the stable-coin contract",
            Self::WrongAsset => "Transfer did not move the expected stable-coin",
            Self::NoTransferFound => "No token transfer found in transaction",
            Self::RecipientMismatch => "Transfer recipient does not match the payment request",
            Self::AmountMismatch => "Transfer amount does not match the payment request",
            Self::TransactionAlreadyUsed => "Transaction was already used for another payment",
            Self::StaleTransaction => "Transaction predates the payment request",
            Self::PriceMismatch => "Payment request does not match the price of this resource",
            Self::ChainUnavailable => "Chain could not be queried",
            Self::MalformedProof => "Payment proof is malformed",
        }
    }

    /// Infrastructure faults are not "you haven't paid" signals and must not
    /// be answered with a fresh payment demand.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(self, Self::ChainUnavailable | Self::MalformedProof)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment request that was satisfied by an on-chain transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayment {
    /// The consumed payment request.
    pub request: PaymentRequest,
    /// Reference of the transaction that satisfied it.
    pub transaction_reference: String,
}

/// Result of verifying a payment proof: a boolean plus a reason code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The proof satisfied the request, which has now been consumed.
    Verified(VerifiedPayment),
    /// The proof was not accepted.
    Rejected(FailureReason),
}

impl VerificationOutcome {
    /// Returns `true` for [`VerificationOutcome::Verified`].
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Verified(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

impl From<FailureReason> for VerificationOutcome {
    fn from(reason: FailureReason) -> Self {
        Self::Rejected(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_wire_codes_match_serde() {
        for reason in [
            FailureReason::RequestNotFound,
            FailureReason::AmountMismatch,
            FailureReason::TransactionAlreadyUsed,
            FailureReason::StaleTransaction,
            FailureReason::PriceMismatch,
            FailureReason::MalformedProof,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn test_infrastructure_reasons() {
        assert!(FailureReason::ChainUnavailable.is_infrastructure());
        assert!(FailureReason::MalformedProof.is_infrastructure());
        assert!(!FailureReason::AmountMismatch.is_infrastructure());
        assert!(!FailureReason::RequestNotFound.is_infrastructure());
    }

    #[test]
    fn test_rejected_outcome_accessors() {
        let outcome = VerificationOutcome::from(FailureReason::TxNotFound);
        assert!(!outcome.is_verified());
        assert_eq!(outcome.reason(), Some(FailureReason::TxNotFound));
    }
}
