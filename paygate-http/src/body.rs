//! JSON bodies returned by the gate.

use paygate::request::{Currency, PaymentId};
use paygate::{Amount, FailureReason, Network, PaymentRequest};
use serde::{Deserialize, Serialize};

use crate::constants::{PAYMENT_ID_HEADER, PAYMENT_PROOF_HEADER};

/// Body of an HTTP 402 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    /// Human-readable reason the resource was withheld.
    pub error: String,
    /// Always `true`.
    pub payment_required: bool,
    /// The fresh payment demand.
    pub payment_request: PaymentRequestView,
    /// How to satisfy the demand.
    pub instructions: Instructions,
    /// Reason code of the rejected proof, when the client supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl PaymentRequiredBody {
    /// Builds the body for `request`, optionally explaining a rejected proof.
    #[must_use]
    pub fn new(request: &PaymentRequest, rejected: Option<FailureReason>) -> Self {
        let error = rejected.map_or("Payment Required", |reason| reason.message());
        Self {
            error: error.to_owned(),
            payment_required: true,
            payment_request: PaymentRequestView::from(request),
            instructions: Instructions::for_request(request),
            reason: rejected,
        }
    }
}

/// Client-facing projection of a [`PaymentRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestView {
    /// Value for the `x-payment-id` retry header.
    pub payment_id: PaymentId,
    /// Amount to transfer, in currency units.
    pub amount: Amount,
    /// Always `USDC`.
    pub currency: Currency,
    /// Network to pay on.
    pub network: Network,
    /// Address or token account to pay.
    pub recipient: String,
    /// What the payment grants access to.
    pub description: String,
    /// RFC 3339 expiry.
    pub expires_at: String,
}

impl From<&PaymentRequest> for PaymentRequestView {
    fn from(request: &PaymentRequest) -> Self {
        Self {
            payment_id: request.id.clone(),
            amount: request.amount,
            currency: request.currency,
            network: request.network,
            recipient: request.recipient.clone(),
            description: request.description.clone(),
            expires_at: request.expires_at.to_rfc3339(),
        }
    }
}

/// Step-by-step payment instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Instructions {
    pub step1: String,
    pub step2: String,
    pub step3: String,
    pub step4: String,
}

impl Instructions {
    fn for_request(request: &PaymentRequest) -> Self {
        Self {
            step1: format!(
                "Send {} {} to {} on {}",
                request.amount, request.currency, request.recipient, request.network
            ),
            step2: "Wait for the transaction to be confirmed".to_owned(),
            step3: format!(
                "Retry the request with header {PAYMENT_ID_HEADER}: {}",
                request.id
            ),
            step4: format!(
                "Include header {PAYMENT_PROOF_HEADER} with \
                 {{\"transactionReference\": \"<hash or signature>\", \"network\": \"{}\"}}",
                request.network
            ),
        }
    }
}

/// Body of a gate fault response (400, 500 or 503).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultBody {
    /// Always `Payment verification failed`.
    pub error: String,
    /// Machine-readable reason code.
    pub reason: String,
    /// Human-readable detail.
    pub details: String,
}
