//! Payment demand and proof types.
//!
//! A [`PaymentRequest`] is the server-issued demand; a [`PaymentProof`] is the
//! untrusted client submission pointing at the on-chain transfer that is
//! supposed to satisfy it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::network::Network;

/// Opaque identifier of a payment request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Wraps an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PaymentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The stable-coin every demand is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    /// Circle USD Coin.
    #[default]
    #[serde(rename = "USDC")]
    Usdc,
}

impl Currency {
    /// Returns the ticker symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Usdc => "USDC",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What the caller wants to charge; input to [`RequestIssuer::issue`](crate::RequestIssuer::issue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSpec {
    /// Amount in currency units.
    pub amount: Amount,
    /// Currency of the amount. Only USDC is supported.
    #[serde(default)]
    pub currency: Currency,
    /// Network the transfer must happen on.
    pub network: Network,
    /// What the payment grants access to.
    #[serde(default)]
    pub description: String,
}

/// An outstanding payment demand.
///
/// Immutable once created: the store never updates an entry in place, it only
/// removes it (on successful verification or on expiry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Unique identifier among live entries.
    pub id: PaymentId,
    /// Amount in currency units, strictly positive.
    pub amount: Amount,
    /// Always USDC.
    pub currency: Currency,
    /// Network the transfer must happen on.
    pub network: Network,
    /// Chain-specific address funds must be sent to.
    pub recipient: String,
    /// What the payment grants access to.
    pub description: String,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
    /// Instant after which the demand can no longer be satisfied.
    pub expires_at: DateTime<Utc>,
}

impl PaymentRequest {
    /// Returns `true` once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Client-submitted, untrusted proof of payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    /// Transaction hash (account chains) or signature (ledger chains).
    #[serde(alias = "transactionHash", alias = "txHash", alias = "signature")]
    pub transaction_reference: String,
    /// Network the client claims to have paid on.
    pub network: Network,
    /// Block (or slot) the client observed the transaction in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Unix timestamp (seconds) the client observed the transaction at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl PaymentProof {
    /// Creates a proof with only the mandatory fields.
    pub fn new(transaction_reference: impl Into<String>, network: Network) -> Self {
        Self {
            transaction_reference: transaction_reference.into(),
            network,
            block_number: None,
            timestamp: None,
        }
    }
}
