//! Assembles the store, issuer, chain verifiers and gate from configuration.

use std::sync::Arc;

use paygate::{
    ChainFamily, ChainVerifier, IssuerConfig, Network, PaymentRequestStore, PaymentVerifier,
    RequestIssuer, VerificationSettings, VerifierRegistry,
};
use paygate_evm::{AccountChainVerifier, http_rpc, parse_address, usdc_address};
use paygate_http::AccessGate;
use paygate_svm::{JsonRpcLedgerClient, LedgerChainVerifier, parse_pubkey, usdc_mint};

use crate::config::{NetworkConfig, ServerConfig};
use crate::error::StartupError;

/// Everything the router needs.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The gate shared by every protected route.
    pub gate: AccessGate,
    /// Backing store, exposed for the sweep task.
    pub store: Arc<PaymentRequestStore>,
}

impl AppState {
    /// Builds the application state.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if a network's addresses are invalid or no
    /// asset is known for it.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StartupError> {
        let store =
            Arc::new(PaymentRequestStore::new().with_spent_retention(config.spent_retention()));

        let mut issuer_config = IssuerConfig::default().with_ttl(config.ttl());
        issuer_config.decimals = config.verification.decimals;
        let mut registry = VerifierRegistry::new();
        for (&network, net) in &config.networks {
            let verifier = build_verifier(network, net, config.verification)?;
            registry.register(verifier);
            issuer_config = issuer_config.with_recipient(network, net.recipient.trim());
            tracing::info!(%network, rpc_url = %net.rpc_url, "Registered chain verifier");
        }

        let issuer = RequestIssuer::new(Arc::clone(&store), issuer_config);
        let verifier =
            PaymentVerifier::new(Arc::clone(&store), registry).with_policy(config.failure_policy);
        Ok(Self {
            gate: AccessGate::new(issuer, verifier),
            store,
        })
    }
}

fn build_verifier(
    network: Network,
    net: &NetworkConfig,
    settings: VerificationSettings,
) -> Result<Arc<dyn ChainVerifier>, StartupError> {
    match network.family() {
        ChainFamily::Account => {
            let evm = |source| StartupError::Evm { network, source };
            parse_address(&net.recipient).map_err(evm)?;
            let contract = match &net.asset {
                Some(asset) => parse_address(asset).map_err(evm)?,
                None => usdc_address(network).ok_or(StartupError::MissingAsset(network))?,
            };
            let rpc = http_rpc(net.rpc_url.clone());
            let verifier =
                AccountChainVerifier::new(network, contract, rpc, settings).map_err(evm)?;
            Ok(Arc::new(verifier))
        }
        ChainFamily::Ledger => {
            let svm = |source| StartupError::Svm { network, source };
            parse_pubkey(&net.recipient).map_err(svm)?;
            let mint = match &net.asset {
                Some(asset) => parse_pubkey(asset).map_err(svm)?,
                None => usdc_mint(network).ok_or(StartupError::MissingAsset(network))?,
            };
            let rpc = JsonRpcLedgerClient::try_new(net.rpc_url.clone(), settings.rpc_timeout)
                .map_err(svm)?;
            let verifier = LedgerChainVerifier::new(network, mint, rpc, settings).map_err(svm)?;
            Ok(Arc::new(verifier))
        }
    }
}
