//! Transfer verification on account-based chains.
//!
//! A payment is accepted when the referenced transaction succeeded, called the
//! configured USDC contract, and its first decodable `Transfer` log moved the
//! requested amount (within tolerance) to the requested recipient. The
//! including block must not predate the payment request.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, TxHash};
use alloy_sol_types::SolEvent;
use paygate::verifier::{BoxFuture, ChainVerifier, bounded, check_amount, check_freshness};
use paygate::{
    ChainFamily, FailureReason, Network, PaymentProof, PaymentRequest, VerificationSettings,
};

use crate::contract::Transfer;
use crate::error::EvmConfigError;
use crate::networks::usdc_address;
use crate::provider::{AccountChainRpc, EventLog};

/// Awaits a future, optionally instrumenting it with a tracing span.
macro_rules! traced {
    ($fut:expr, $span:expr) => {{
        #[cfg(feature = "telemetry")]
        {
            use tracing::Instrument;
            $fut.instrument($span).await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            $fut.await
        }
    }};
}

/// [`ChainVerifier`] for one EVM network.
pub struct AccountChainVerifier<R> {
    network: Network,
    contract: Address,
    rpc: R,
    settings: VerificationSettings,
}

impl<R> fmt::Debug for AccountChainVerifier<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountChainVerifier")
            .field("network", &self.network)
            .field("contract", &self.contract)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<R: AccountChainRpc> AccountChainVerifier<R> {
    /// Creates a verifier checking transfers of `contract` on `network`.
    ///
    /// # Errors
    ///
    /// Returns [`EvmConfigError::NotAccountNetwork`] for ledger networks.
    pub fn new(
        network: Network,
        contract: Address,
        rpc: R,
        settings: VerificationSettings,
    ) -> Result<Self, EvmConfigError> {
        if network.family() != ChainFamily::Account {
            return Err(EvmConfigError::NotAccountNetwork(network));
        }
        Ok(Self {
            network,
            contract,
            rpc,
            settings,
        })
    }

    /// Creates a verifier for the network's well-known USDC deployment.
    ///
    /// # Errors
    ///
    /// Returns [`EvmConfigError::NotAccountNetwork`] for ledger networks.
    pub fn usdc(
        network: Network,
        rpc: R,
        settings: VerificationSettings,
    ) -> Result<Self, EvmConfigError> {
        let contract = usdc_address(network).ok_or(EvmConfigError::NotAccountNetwork(network))?;
        Self::new(network, contract, rpc, settings)
    }

    /// The stable-coin contract transfers must go through.
    #[must_use]
    pub const fn contract(&self) -> Address {
        self.contract
    }

    async fn inspect(
        &self,
        request: &PaymentRequest,
        proof: &PaymentProof,
    ) -> Result<(), FailureReason> {
        let hash = TxHash::from_str(proof.transaction_reference.trim())
            .map_err(|_| FailureReason::MalformedProof)?;
        let timeout = self.settings.rpc_timeout;

        let receipt = traced!(
            bounded(timeout, self.rpc.receipt(hash)),
            tracing::info_span!("get_transaction_receipt", tx = %hash, otel.kind = "client")
        )?
        .ok_or(FailureReason::TxNotFound)?;
        if !receipt.success {
            return Err(FailureReason::TxFailed);
        }

        let transaction = traced!(
            bounded(timeout, self.rpc.transaction(hash)),
            tracing::info_span!("get_transaction_by_hash", tx = %hash, otel.kind = "client")
        )?
        .ok_or(FailureReason::TxNotFound)?;
        if transaction.to != Some(self.contract) {
            return Err(FailureReason::WrongContract);
        }

        let (log, transfer) = first_transfer(&receipt.logs).ok_or(FailureReason::NoTransferFound)?;
        if log.address != self.contract {
            return Err(FailureReason::WrongAsset);
        }

        let recipient = Address::from_str(request.recipient.trim())
            .map_err(|_| FailureReason::RecipientMismatch)?;
        if transfer.to != recipient {
            return Err(FailureReason::RecipientMismatch);
        }

        let raw = u128::try_from(transfer.value).map_err(|_| FailureReason::AmountMismatch)?;
        check_amount(raw, &request.amount, &self.settings)?;

        let block = receipt.block_number.ok_or(FailureReason::TxNotFound)?;
        let mined_at = traced!(
            bounded(timeout, self.rpc.block_timestamp(block)),
            tracing::info_span!("get_block_by_number", block, otel.kind = "client")
        )?
        .and_then(|secs| i64::try_from(secs).ok());
        check_freshness(mined_at, request, &self.settings)
    }
}

/// Returns the first log that decodes as an ERC-20 `Transfer`.
fn first_transfer(logs: &[EventLog]) -> Option<(&EventLog, Transfer)> {
    logs.iter().find_map(|log| {
        Transfer::decode_raw_log(log.topics.iter().copied(), &log.data)
            .ok()
            .map(|transfer| (log, transfer))
    })
}

impl<R: AccountChainRpc> ChainVerifier for AccountChainVerifier<R> {
    fn family(&self) -> ChainFamily {
        ChainFamily::Account
    }

    fn network(&self) -> Network {
        self.network
    }

    fn verify_transfer<'a>(
        &'a self,
        request: &'a PaymentRequest,
        proof: &'a PaymentProof,
    ) -> BoxFuture<'a, Result<(), FailureReason>> {
        Box::pin(async move {
            let result = self.inspect(request, proof).await;
            #[cfg(feature = "telemetry")]
            if let Err(reason) = &result {
                tracing::debug!(network = %self.network, %reason, "Transfer rejected");
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use alloy_primitives::{B256, U256, address};
    use chrono::Utc;
    use paygate::request::{Currency, PaymentId};

    use super::*;
    use crate::networks::USDC_BASE;
    use crate::provider::{ReceiptSummary, TransactionSummary};

    const RECIPIENT: Address = address!("1111111111111111111111111111111111111111");
    const PAYER: Address = address!("2222222222222222222222222222222222222222");
    const TX: &str = "0x00000000000000000000000000000000000000000000000000000000000000aa";

    fn request(amount: &str, recipient: &str) -> PaymentRequest {
        let now = Utc::now();
        PaymentRequest {
            id: PaymentId::new("pay_test"),
            amount: amount.parse().unwrap(),
            currency: Currency::Usdc,
            network: Network::Base,
            recipient: recipient.to_owned(),
            description: String::new(),
            created_at: now,
            expires_at: now + chrono::Duration::minutes(15),
        }
    }

    const BLOCK: u64 = 7;

    #[derive(Default)]
    struct MockChain {
        receipts: HashMap<TxHash, ReceiptSummary>,
        transactions: HashMap<TxHash, TransactionSummary>,
        block_times: HashMap<u64, u64>,
        stall: bool,
        broken: bool,
    }

    impl AccountChainRpc for MockChain {
        type Error = String;

        async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>, String> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            if self.broken {
                return Err("connection refused".into());
            }
            Ok(self.receipts.get(&hash).cloned())
        }

        async fn transaction(&self, hash: TxHash) -> Result<Option<TransactionSummary>, String> {
            Ok(self.transactions.get(&hash).copied())
        }

        async fn block_timestamp(&self, number: u64) -> Result<Option<u64>, String> {
            Ok(self.block_times.get(&number).copied())
        }
    }

    fn transfer_log(emitter: Address, to: Address, raw: u64) -> EventLog {
        let data = Transfer {
            from: PAYER,
            to,
            value: U256::from(raw),
        }
        .encode_log_data();
        EventLog {
            address: emitter,
            topics: data.topics().to_vec(),
            data: data.data,
        }
    }

    fn chain_with(success: bool, to: Address, logs: Vec<EventLog>) -> MockChain {
        let hash = TxHash::from_str(TX).unwrap();
        let mut chain = MockChain::default();
        chain.receipts.insert(
            hash,
            ReceiptSummary {
                success,
                block_number: Some(BLOCK),
                logs,
            },
        );
        chain
            .transactions
            .insert(hash, TransactionSummary { to: Some(to) });
        chain.mined_at(Utc::now());
        chain
    }

    impl MockChain {
        fn mined_at(&mut self, at: chrono::DateTime<Utc>) {
            let secs = u64::try_from(at.timestamp()).unwrap();
            self.block_times.insert(BLOCK, secs);
        }
    }

    fn paid(raw: u64) -> MockChain {
        chain_with(true, USDC_BASE, vec![transfer_log(USDC_BASE, RECIPIENT, raw)])
    }

    fn verifier(chain: MockChain) -> AccountChainVerifier<MockChain> {
        AccountChainVerifier::usdc(Network::Base, chain, VerificationSettings::default()).unwrap()
    }

    fn proof() -> PaymentProof {
        PaymentProof::new(TX, Network::Base)
    }

    async fn check(chain: MockChain, amount: &str, recipient: &str) -> Result<(), FailureReason> {
        let request = request(amount, recipient);
        verifier(chain).verify_transfer(&request, &proof()).await
    }

    const RECIPIENT_STR: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn test_exact_amount_passes() {
        assert_eq!(check(paid(100_000), "0.10", RECIPIENT_STR).await, Ok(()));
    }

    #[tokio::test]
    async fn test_short_amount_fails() {
        assert_eq!(
            check(paid(80_000), "0.10", RECIPIENT_STR).await,
            Err(FailureReason::AmountMismatch)
        );
    }

    #[tokio::test]
    async fn test_tolerance_boundary() {
        assert_eq!(check(paid(110_000), "0.10", RECIPIENT_STR).await, Ok(()));
        assert_eq!(
            check(paid(111_000), "0.10", RECIPIENT_STR).await,
            Err(FailureReason::AmountMismatch)
        );
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        assert_eq!(
            check(MockChain::default(), "0.10", RECIPIENT_STR).await,
            Err(FailureReason::TxNotFound)
        );
    }

    #[tokio::test]
    async fn test_reverted_transaction() {
        let chain = chain_with(false, USDC_BASE, vec![]);
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::TxFailed)
        );
    }

    #[tokio::test]
    async fn test_wrong_contract() {
        let other = address!("3333333333333333333333333333333333333333");
        let chain = chain_with(true, other, vec![transfer_log(other, RECIPIENT, 100_000)]);
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::WrongContract)
        );
    }

    #[tokio::test]
    async fn test_transfer_from_other_token() {
        let other = address!("3333333333333333333333333333333333333333");
        let chain = chain_with(true, USDC_BASE, vec![transfer_log(other, RECIPIENT, 100_000)]);
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::WrongAsset)
        );
    }

    #[tokio::test]
    async fn test_no_transfer_log() {
        let unrelated = EventLog {
            address: USDC_BASE,
            topics: vec![B256::repeat_byte(0x42)],
            data: alloy_primitives::Bytes::new(),
        };
        let chain = chain_with(true, USDC_BASE, vec![unrelated]);
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::NoTransferFound)
        );
    }

    #[tokio::test]
    async fn test_first_transfer_is_the_one_checked() {
        let stranger = address!("4444444444444444444444444444444444444444");
        let chain = chain_with(
            true,
            USDC_BASE,
            vec![
                transfer_log(USDC_BASE, stranger, 100_000),
                transfer_log(USDC_BASE, RECIPIENT, 100_000),
            ],
        );
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::RecipientMismatch)
        );
    }

    #[tokio::test]
    async fn test_recipient_case_insensitive() {
        let recipient = address!("ab5801a7d398351b8be11c439e05c5b3259aec9b");
        let chain = chain_with(
            true,
            USDC_BASE,
            vec![transfer_log(USDC_BASE, recipient, 100_000)],
        );
        let upper = "0xAB5801A7D398351B8BE11C439E05C5B3259AEC9B";
        assert_eq!(check(chain, "0.10", upper).await, Ok(()));
    }

    #[tokio::test]
    async fn test_different_recipient() {
        assert_eq!(
            check(
                paid(100_000),
                "0.10",
                "0x5555555555555555555555555555555555555555"
            )
            .await,
            Err(FailureReason::RecipientMismatch)
        );
    }

    #[tokio::test]
    async fn test_transfer_older_than_request_is_stale() {
        let mut chain = paid(100_000);
        chain.mined_at(Utc::now() - chrono::Duration::hours(25));
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::StaleTransaction)
        );
    }

    #[tokio::test]
    async fn test_transfer_within_clock_skew_passes() {
        let mut chain = paid(100_000);
        chain.mined_at(Utc::now() - chrono::Duration::seconds(30));
        assert_eq!(check(chain, "0.10", RECIPIENT_STR).await, Ok(()));
    }

    #[tokio::test]
    async fn test_unknown_block_time_is_stale() {
        let mut chain = paid(100_000);
        chain.block_times.clear();
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::StaleTransaction)
        );
    }

    #[tokio::test]
    async fn test_malformed_hash() {
        let request = request("0.10", RECIPIENT_STR);
        let proof = PaymentProof::new("not-a-hash", Network::Base);
        assert_eq!(
            verifier(paid(100_000)).verify_transfer(&request, &proof).await,
            Err(FailureReason::MalformedProof)
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_unavailable() {
        let mut chain = paid(100_000);
        chain.broken = true;
        assert_eq!(
            check(chain, "0.10", RECIPIENT_STR).await,
            Err(FailureReason::ChainUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_node_times_out() {
        let mut chain = paid(100_000);
        chain.stall = true;
        let settings = VerificationSettings::default().with_rpc_timeout(Duration::from_secs(3));
        let verifier = AccountChainVerifier::usdc(Network::Base, chain, settings).unwrap();
        let request = request("0.10", RECIPIENT_STR);
        assert_eq!(
            verifier.verify_transfer(&request, &proof()).await,
            Err(FailureReason::ChainUnavailable)
        );
    }

    #[test]
    fn test_rejects_ledger_network() {
        let result = AccountChainVerifier::usdc(
            Network::Solana,
            MockChain::default(),
            VerificationSettings::default(),
        );
        assert!(matches!(
            result,
            Err(EvmConfigError::NotAccountNetwork(Network::Solana))
        ));
    }
}
