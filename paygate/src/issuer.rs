//! Creation of new payment requests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;

use crate::error::IssueError;
use crate::network::Network;
use crate::request::{PaymentId, PaymentRequest, PaymentSpec};
use crate::settings::DEFAULT_DECIMALS;
use crate::store::PaymentRequestStore;

/// Default lifetime of a payment request: 15 minutes.
pub const DEFAULT_TTL: Duration = Duration::minutes(15);

/// Prefix of every issued payment id.
pub const PAYMENT_ID_PREFIX: &str = "pay_";

/// Where funds go and how long a demand stays payable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    /// Recipient address per network. Networks without one cannot be charged.
    pub recipients: HashMap<Network, String>,
    /// Lifetime of an issued request.
    pub ttl: Duration,
    /// Fractional digits an amount may carry.
    pub decimals: u32,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            recipients: HashMap::new(),
            ttl: DEFAULT_TTL,
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl IssuerConfig {
    /// Sets the recipient for a network.
    #[must_use]
    pub fn with_recipient(mut self, network: Network, recipient: impl Into<String>) -> Self {
        self.recipients.insert(network, recipient.into());
        self
    }

    /// Sets the request lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Issues payment requests into a [`PaymentRequestStore`].
#[derive(Debug, Clone)]
pub struct RequestIssuer {
    store: Arc<PaymentRequestStore>,
    config: Arc<IssuerConfig>,
}

impl RequestIssuer {
    /// Creates an issuer writing into `store`.
    #[must_use]
    pub fn new(store: Arc<PaymentRequestStore>, config: IssuerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<PaymentRequestStore> {
        &self.store
    }

    /// Returns the issuer configuration.
    #[must_use]
    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Creates, stores and returns a new payment request.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::InvalidAmount`] when the amount is finer than the
    /// stable-coin unit, and [`IssueError::UnsupportedNetwork`] when no
    /// recipient is configured for the network.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(skip_all, fields(network = %spec.network), err)
    )]
    pub fn issue(&self, spec: PaymentSpec) -> Result<PaymentRequest, IssueError> {
        spec.amount.ensure_precision(self.config.decimals)?;
        let recipient = self
            .config
            .recipients
            .get(&spec.network)
            .ok_or(IssueError::UnsupportedNetwork(spec.network))?
            .clone();

        let created_at = self.store.clock().now();
        let mut request = PaymentRequest {
            id: generate_id(),
            amount: spec.amount,
            currency: spec.currency,
            network: spec.network,
            recipient,
            description: spec.description,
            created_at,
            expires_at: created_at + self.config.ttl,
        };
        while !self.store.insert(request.clone()) {
            request.id = generate_id();
        }

        #[cfg(feature = "telemetry")]
        tracing::info!(
            payment_id = %request.id,
            amount = %request.amount,
            "Issued payment request"
        );
        Ok(request)
    }
}

fn generate_id() -> PaymentId {
    PaymentId::new(format!("{PAYMENT_ID_PREFIX}{:032x}", rand::random::<u128>()))
}
