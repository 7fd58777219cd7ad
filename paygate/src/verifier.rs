//! The chain verifier capability and the `verify` operation.
//!
//! [`ChainVerifier`] is implemented once per chain family (in `paygate-evm`
//! and `paygate-svm`) and inspects a single transaction. [`PaymentVerifier`]
//! wraps the chain inspection with the store-side checks: the request must be
//! live, the proof must target the request's network, the transaction must
//! not have paid for anything else, and the request is consumed atomically so
//! that concurrent retries observe at most one success.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, normalize, within_tolerance};
use crate::network::{ChainFamily, Network};
use crate::outcome::{FailureReason, VerificationOutcome, VerifiedPayment};
use crate::request::{PaymentId, PaymentProof, PaymentRequest};
use crate::settings::VerificationSettings;
use crate::store::PaymentRequestStore;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failure to talk to a chain node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcFailure {
    /// The call did not complete within the configured bound.
    #[error("RPC call timed out after {0:?}")]
    Timeout(Duration),
    /// The transport or the node returned an error.
    #[error("RPC transport error: {0}")]
    Transport(String),
}

impl From<RpcFailure> for FailureReason {
    fn from(_: RpcFailure) -> Self {
        Self::ChainUnavailable
    }
}

/// Runs an RPC future with an upper time bound.
///
/// On timeout the future is dropped, which cancels the in-flight request.
///
/// # Errors
///
/// Returns [`RpcFailure::Timeout`] when `timeout` elapses first and
/// [`RpcFailure::Transport`] when the call itself fails.
pub async fn bounded<T, E, F>(timeout: Duration, call: F) -> Result<T, RpcFailure>
where
    E: fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(RpcFailure::Transport(err.to_string())),
        Err(_) => Err(RpcFailure::Timeout(timeout)),
    }
}

/// Compares a raw on-chain amount against the requested amount.
///
/// # Errors
///
/// Returns [`FailureReason::AmountMismatch`] when the normalized value is
/// outside the tolerance or cannot be represented.
pub fn check_amount(
    raw: u128,
    expected: &Amount,
    settings: &VerificationSettings,
) -> Result<(), FailureReason> {
    let observed = normalize(raw, settings.decimals).map_err(|_| FailureReason::AmountMismatch)?;
    if within_tolerance(observed, expected.as_decimal(), settings.tolerance) {
        Ok(())
    } else {
        Err(FailureReason::AmountMismatch)
    }
}

/// Rejects transfers confirmed before the request was issued.
///
/// `confirmed_at` is the chain's block time in unix seconds; `None` when the
/// node did not report one. A transfer may precede the request by at most
/// the configured clock skew.
///
/// # Errors
///
/// Returns [`FailureReason::StaleTransaction`] for older or undated transfers.
pub fn check_freshness(
    confirmed_at: Option<i64>,
    request: &PaymentRequest,
    settings: &VerificationSettings,
) -> Result<(), FailureReason> {
    let skew = i64::try_from(settings.clock_skew.as_secs()).unwrap_or(i64::MAX);
    let earliest = request.created_at.timestamp().saturating_sub(skew);
    match confirmed_at {
        Some(at) if at >= earliest => Ok(()),
        _ => Err(FailureReason::StaleTransaction),
    }
}

/// Inspects one chain for a transfer satisfying a payment request.
///
/// Implementations perform no store access; they only answer whether the
/// referenced transaction pays `request`.
pub trait ChainVerifier: Send + Sync {
    /// The chain family this verifier understands.
    fn family(&self) -> ChainFamily;

    /// The network this verifier is bound to.
    fn network(&self) -> Network;

    /// Checks that `proof` references a successful transfer of the requested
    /// amount to the requested recipient.
    fn verify_transfer<'a>(
        &'a self,
        request: &'a PaymentRequest,
        proof: &'a PaymentProof,
    ) -> BoxFuture<'a, Result<(), FailureReason>>;
}

impl<T: ChainVerifier + ?Sized> ChainVerifier for Arc<T> {
    fn family(&self) -> ChainFamily {
        (**self).family()
    }

    fn network(&self) -> Network {
        (**self).network()
    }

    fn verify_transfer<'a>(
        &'a self,
        request: &'a PaymentRequest,
        proof: &'a PaymentProof,
    ) -> BoxFuture<'a, Result<(), FailureReason>> {
        (**self).verify_transfer(request, proof)
    }
}

/// Chain verifiers keyed by the network they serve.
#[derive(Default, Clone)]
pub struct VerifierRegistry(HashMap<Network, Arc<dyn ChainVerifier>>);

impl fmt::Debug for VerifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut networks: Vec<&str> = self.0.keys().map(|n| n.name()).collect();
        networks.sort_unstable();
        f.debug_tuple("VerifierRegistry").field(&networks).finish()
    }
}

impl VerifierRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registers a verifier under its own network, replacing any previous one.
    pub fn register(&mut self, verifier: Arc<dyn ChainVerifier>) -> &mut Self {
        self.0.insert(verifier.network(), verifier);
        self
    }

    /// Returns the verifier for `network`.
    #[must_use]
    pub fn get(&self, network: Network) -> Option<&Arc<dyn ChainVerifier>> {
        self.0.get(&network)
    }

    /// Returns the networks with a registered verifier.
    pub fn networks(&self) -> impl Iterator<Item = Network> + '_ {
        self.0.keys().copied()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What happens to a payment request after a failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The request stays payable until it expires, so the client may retry
    /// with a corrected proof.
    #[default]
    RetainUntilExpiry,
    /// A rejected proof removes the request. Infrastructure faults
    /// (`chain_unavailable`, `malformed_proof`) never do.
    InvalidateOnFailure,
}

/// The `verify` operation: store checks plus chain inspection.
#[derive(Clone)]
pub struct PaymentVerifier {
    store: Arc<PaymentRequestStore>,
    registry: Arc<VerifierRegistry>,
    policy: FailurePolicy,
}

impl fmt::Debug for PaymentVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentVerifier")
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PaymentVerifier {
    /// Creates a verifier over `store` using the chain verifiers in `registry`.
    #[must_use]
    pub fn new(store: Arc<PaymentRequestStore>, registry: VerifierRegistry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
            policy: FailurePolicy::default(),
        }
    }

    /// Sets the failure policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<PaymentRequestStore> {
        &self.store
    }

    /// Returns the failure policy in effect.
    #[must_use]
    pub const fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Verifies `proof` against the payment request `id`.
    ///
    /// On success the request has been removed from the store; for a given
    /// id at most one call ever returns [`VerificationOutcome::Verified`].
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(skip_all, fields(payment_id = %id, network = %proof.network))
    )]
    pub async fn verify(&self, id: &PaymentId, proof: &PaymentProof) -> VerificationOutcome {
        match self.verify_inner(id, proof).await {
            Ok(payment) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(tx = %payment.transaction_reference, "Payment verified");
                VerificationOutcome::Verified(payment)
            }
            Err(reason) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(reason = %reason, "Payment rejected");
                if self.should_invalidate(reason) {
                    self.store.remove(id);
                }
                VerificationOutcome::Rejected(reason)
            }
        }
    }

    async fn verify_inner(
        &self,
        id: &PaymentId,
        proof: &PaymentProof,
    ) -> Result<VerifiedPayment, FailureReason> {
        let request = self.store.lookup(id).map_err(FailureReason::from)?;
        if proof.network != request.network {
            return Err(FailureReason::NetworkMismatch);
        }
        let reference = proof.transaction_reference.trim();
        if reference.is_empty() {
            return Err(FailureReason::MalformedProof);
        }
        let chain = self
            .registry
            .get(request.network)
            .ok_or(FailureReason::ChainUnavailable)?;

        chain.verify_transfer(&request, proof).await?;

        let request = self.store.take_if_valid(id).map_err(FailureReason::from)?;
        if let Err(used) = self.store.claim_transaction(request.network, reference) {
            // The demand itself is still unpaid; put it back.
            self.store.insert(request);
            return Err(used.into());
        }
        Ok(VerifiedPayment {
            request,
            transaction_reference: reference.to_owned(),
        })
    }

    const fn should_invalidate(&self, reason: FailureReason) -> bool {
        matches!(self.policy, FailurePolicy::InvalidateOnFailure)
            && !reason.is_infrastructure()
            && !matches!(
                reason,
                FailureReason::RequestNotFound | FailureReason::RequestExpired
            )
    }
}
