//! The access gate: turns request headers into a pass, a demand or a fault.

use std::sync::Arc;

use http::HeaderMap;
use paygate::error::IssueError;
use paygate::request::{Currency, PaymentId};
use paygate::{
    Amount, FailureReason, Network, PaymentProof, PaymentRequest, PaymentSpec, PaymentVerifier,
    RequestIssuer, VerificationOutcome, VerifiedPayment,
};

use crate::body::PaymentRequiredBody;
use crate::constants::{PAYMENT_ID_HEADER, PAYMENT_PROOF_HEADER};
use crate::error::{GateFault, HttpError};
use crate::headers::{decode_payment_proof, header_str};
use crate::layer::PaymentGateLayer;

/// Price of a protected resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTag {
    /// Amount in USDC.
    pub amount: Amount,
    /// Network the payment is demanded on.
    pub network: Network,
    /// What the payment grants access to.
    pub description: String,
}

impl PriceTag {
    /// Creates a price tag with an empty description.
    #[must_use]
    pub const fn new(amount: Amount, network: Network) -> Self {
        Self {
            amount,
            network,
            description: String::new(),
        }
    }

    /// Sets the description shown in payment demands.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether `request` was issued for this price.
    #[must_use]
    pub fn matches(&self, request: &PaymentRequest) -> bool {
        request.amount == self.amount
            && request.network == self.network
            && request.currency == Currency::Usdc
            && request.description == self.description
    }

    fn spec(&self) -> PaymentSpec {
        PaymentSpec {
            amount: self.amount,
            currency: Currency::Usdc,
            network: self.network,
            description: self.description.clone(),
        }
    }
}

/// Result of [`AccessGate::gate`].
#[derive(Debug)]
pub enum GateDecision {
    /// The proof was verified; the protected handler may run.
    Pass(VerifiedPayment),
    /// No acceptable proof; a fresh payment demand was issued.
    Gated(PaymentRequiredBody),
    /// Whether the client paid could not be decided.
    Fault(GateFault),
}

/// Issues and verifies payment demands for protected endpoints.
#[derive(Debug, Clone)]
pub struct AccessGate {
    issuer: RequestIssuer,
    verifier: PaymentVerifier,
}

impl AccessGate {
    /// Creates a gate over a shared issuer and verifier.
    ///
    /// Both must be backed by the same store for verification to find the
    /// requests the gate issues.
    #[must_use]
    pub const fn new(issuer: RequestIssuer, verifier: PaymentVerifier) -> Self {
        Self { issuer, verifier }
    }

    /// The issuer of new payment requests.
    #[must_use]
    pub const fn issuer(&self) -> &RequestIssuer {
        &self.issuer
    }

    /// The verifier consuming payment requests.
    #[must_use]
    pub const fn verifier(&self) -> &PaymentVerifier {
        &self.verifier
    }

    /// Returns a tower layer protecting a route with `price`.
    #[must_use]
    pub fn route(&self, price: PriceTag) -> PaymentGateLayer {
        PaymentGateLayer::new(self.clone(), Arc::new(price))
    }

    /// Issues a payment demand for `price`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError`] if the amount or network cannot be served.
    pub fn issue(&self, price: &PriceTag) -> Result<PaymentRequest, IssueError> {
        self.issuer.issue(price.spec())
    }

    /// Verifies a proof against an outstanding request.
    pub async fn verify(&self, id: &PaymentId, proof: &PaymentProof) -> VerificationOutcome {
        self.verifier.verify(id, proof).await
    }

    /// Decides what to do with a request carrying `headers`.
    ///
    /// Without a proof header a fresh demand is issued. A proof that cannot
    /// be decoded, or that arrives without its payment id, is a fault. A
    /// payment id naming a request issued for another price is rejected
    /// before the chain is consulted, leaving that request payable. A
    /// rejected proof yields a brand-new demand carrying the rejection
    /// reason; infrastructure rejections are faults.
    #[cfg_attr(feature = "telemetry", tracing::instrument(name = "paygate.gate", skip_all))]
    pub async fn gate(&self, headers: &HeaderMap, price: &PriceTag) -> GateDecision {
        let (id, proof) = match read_proof(headers) {
            Ok(Some(pair)) => pair,
            Ok(None) => return self.demand(price, None),
            Err(e) => return GateDecision::Fault(GateFault::MalformedProof(e)),
        };
        if let Ok(request) = self.issuer.store().lookup(&id)
            && !price.matches(&request)
        {
            #[cfg(feature = "telemetry")]
            tracing::info!(
                payment_id = %id,
                requested = %request.amount,
                price = %price.amount,
                "Payment request does not match route price"
            );
            return self.demand(price, Some(FailureReason::PriceMismatch));
        }
        match self.verify(&id, &proof).await {
            VerificationOutcome::Verified(payment) => GateDecision::Pass(payment),
            VerificationOutcome::Rejected(reason) if reason.is_infrastructure() => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(payment_id = %id, reason = %reason, "Payment verification fault");
                GateDecision::Fault(GateFault::Verification(reason))
            }
            VerificationOutcome::Rejected(reason) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(payment_id = %id, reason = %reason, "Payment proof rejected");
                self.demand(price, Some(reason))
            }
        }
    }

    fn demand(&self, price: &PriceTag, rejected: Option<FailureReason>) -> GateDecision {
        match self.issue(price) {
            Ok(request) => GateDecision::Gated(PaymentRequiredBody::new(&request, rejected)),
            Err(e) => GateDecision::Fault(GateFault::Issue(e)),
        }
    }
}

/// Extracts the payment id and decoded proof; `None` when no proof was sent.
fn read_proof(headers: &HeaderMap) -> Result<Option<(PaymentId, PaymentProof)>, HttpError> {
    let Some(raw_proof) = header_str(headers, PAYMENT_PROOF_HEADER)? else {
        return Ok(None);
    };
    let id = header_str(headers, PAYMENT_ID_HEADER)?
        .ok_or(HttpError::MissingHeader(PAYMENT_ID_HEADER))?;
    let proof = decode_payment_proof(raw_proof)?;
    Ok(Some((PaymentId::new(id), proof)))
}
