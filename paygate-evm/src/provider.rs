//! Read-only access to an EVM node.
//!
//! Verification needs three calls: the receipt of a transaction (status,
//! block and emitted logs), the transaction itself (its destination) and the
//! timestamp of the including block. [`AccountChainRpc`] narrows a node to
//! those calls so that the verifier can be exercised against an in-memory
//! chain.

use std::fmt;
use std::future::Future;

use alloy_consensus::{BlockHeader as _, Transaction as _};
use alloy_network::{BlockResponse, ReceiptResponse};
use alloy_primitives::{Address, B256, Bytes, TxHash};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::{BlockNumberOrTag, Log, TransactionReceipt};
use alloy_transport::TransportError;
use url::Url;

/// An event log as emitted in a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics, event signature first.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed data.
    pub data: Bytes,
}

impl From<&Log> for EventLog {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        }
    }
}

/// The parts of a transaction receipt that verification looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    /// `false` when the transaction reverted.
    pub success: bool,
    /// Including block; `None` while pending.
    pub block_number: Option<u64>,
    /// Logs in emission order.
    pub logs: Vec<EventLog>,
}

impl From<&TransactionReceipt> for ReceiptSummary {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            success: receipt.status(),
            block_number: receipt.block_number(),
            logs: receipt.inner.logs().iter().map(EventLog::from).collect(),
        }
    }
}

/// The parts of a transaction that verification looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSummary {
    /// Destination; `None` for contract creation.
    pub to: Option<Address>,
}

/// Read-only RPC surface of an account-based chain.
pub trait AccountChainRpc: Send + Sync {
    /// Transport error type.
    type Error: fmt::Display + Send;

    /// Fetches the receipt of `hash`; `None` when the node does not know it.
    fn receipt(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Option<ReceiptSummary>, Self::Error>> + Send;

    /// Fetches the transaction `hash`; `None` when the node does not know it.
    fn transaction(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Option<TransactionSummary>, Self::Error>> + Send;

    /// Fetches the timestamp (unix seconds) of block `number`.
    fn block_timestamp(
        &self,
        number: u64,
    ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send;
}

/// [`AccountChainRpc`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct AlloyRpc<P>(pub P);

impl<P> AccountChainRpc for AlloyRpc<P>
where
    P: Provider + Send + Sync,
{
    type Error = TransportError;

    async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>, TransportError> {
        let receipt = self.0.get_transaction_receipt(hash).await?;
        Ok(receipt.as_ref().map(ReceiptSummary::from))
    }

    async fn transaction(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionSummary>, TransportError> {
        let tx = self.0.get_transaction_by_hash(hash).await?;
        Ok(tx.map(|tx| TransactionSummary { to: tx.to() }))
    }

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>, TransportError> {
        let block = self
            .0
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await?;
        Ok(block.map(|block| block.header().timestamp()))
    }
}

/// Creates an HTTP JSON-RPC client for `url`.
#[must_use]
pub fn http_rpc(url: Url) -> AlloyRpc<RootProvider> {
    #[cfg(feature = "telemetry")]
    tracing::info!(rpc_url = %url, "Using HTTP transport");
    AlloyRpc(RootProvider::new_http(url))
}
