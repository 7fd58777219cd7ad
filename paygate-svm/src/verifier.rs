//! Transfer verification on Solana.
//!
//! Solana transactions carry ordered instructions instead of event logs. The
//! transfer of record is the first SPL token instruction that moves the
//! configured USDC mint; there is no contract-address check because the mint
//! itself identifies the asset. Plain `transfer` instructions carry no mint,
//! so theirs is read from the transaction's token balance metadata. The
//! block time must not predate the payment request.

use std::fmt;
use std::str::FromStr;

use paygate::verifier::{BoxFuture, ChainVerifier, bounded, check_amount, check_freshness};
use paygate::{
    ChainFamily, FailureReason, Network, PaymentProof, PaymentRequest, VerificationSettings,
};
use solana_pubkey::Pubkey;
use solana_signature::Signature;

use crate::error::SvmConfigError;
use crate::networks::{TOKEN_2022_PROGRAM, TOKEN_PROGRAM, usdc_mint};
use crate::rpc::LedgerRpc;
use crate::types::{Instruction, ParsedTransaction, TransferInfo};

const TOKEN_PARSER: &str = "spl-token";

/// [`ChainVerifier`] for one Solana cluster.
pub struct LedgerChainVerifier<R> {
    network: Network,
    mint: Pubkey,
    mint_b58: String,
    rpc: R,
    settings: VerificationSettings,
}

impl<R> fmt::Debug for LedgerChainVerifier<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerChainVerifier")
            .field("network", &self.network)
            .field("mint", &self.mint_b58)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<R: LedgerRpc> LedgerChainVerifier<R> {
    /// Creates a verifier checking transfers of `mint` on `network`.
    ///
    /// # Errors
    ///
    /// Returns [`SvmConfigError::NotLedgerNetwork`] for account networks.
    pub fn new(
        network: Network,
        mint: Pubkey,
        rpc: R,
        settings: VerificationSettings,
    ) -> Result<Self, SvmConfigError> {
        if network.family() != ChainFamily::Ledger {
            return Err(SvmConfigError::NotLedgerNetwork(network));
        }
        Ok(Self {
            network,
            mint,
            mint_b58: mint.to_string(),
            rpc,
            settings,
        })
    }

    /// Creates a verifier for the cluster's well-known USDC mint.
    ///
    /// # Errors
    ///
    /// Returns [`SvmConfigError::NotLedgerNetwork`] for account networks.
    pub fn usdc(
        network: Network,
        rpc: R,
        settings: VerificationSettings,
    ) -> Result<Self, SvmConfigError> {
        let mint = usdc_mint(network).ok_or(SvmConfigError::NotLedgerNetwork(network))?;
        Self::new(network, mint, rpc, settings)
    }

    /// The mint transfers must move.
    #[must_use]
    pub const fn mint(&self) -> &Pubkey {
        &self.mint
    }

    async fn inspect(
        &self,
        request: &PaymentRequest,
        proof: &PaymentProof,
    ) -> Result<(), FailureReason> {
        let signature = Signature::from_str(proof.transaction_reference.trim())
            .map_err(|_| FailureReason::MalformedProof)?;

        let fetch = bounded(self.settings.rpc_timeout, self.rpc.transaction(&signature));
        #[cfg(feature = "telemetry")]
        let fetch = tracing::Instrument::instrument(
            fetch,
            tracing::info_span!("get_transaction", %signature, otel.kind = "client"),
        );
        let transaction = fetch.await?.ok_or(FailureReason::TxNotFound)?;
        if !transaction.succeeded() {
            return Err(FailureReason::TxFailed);
        }

        let transfer = self.find_transfer(&transaction)?;
        if transfer.destination != request.recipient.trim() {
            return Err(FailureReason::RecipientMismatch);
        }
        let raw = transfer.raw_amount().ok_or(FailureReason::AmountMismatch)?;
        check_amount(raw, &request.amount, &self.settings)?;
        check_freshness(transaction.block_time, request, &self.settings)
    }

    /// Picks the first token transfer of the configured mint.
    ///
    /// A transaction with token transfers of other mints only reports
    /// [`FailureReason::WrongAsset`]; one without any reports
    /// [`FailureReason::NoTransferFound`]. A transfer whose mint cannot be
    /// resolved counts as neither.
    fn find_transfer(
        &self,
        transaction: &ParsedTransaction,
    ) -> Result<TransferInfo, FailureReason> {
        let mut saw_other_asset = false;
        for transfer in token_transfers(transaction) {
            let mint = transfer
                .mint
                .as_deref()
                .or_else(|| transaction.mint_of(&transfer.destination));
            match mint {
                Some(mint) if mint == self.mint_b58 => {}
                Some(_) => {
                    saw_other_asset = true;
                    continue;
                }
                None => continue,
            }
            return Ok(transfer);
        }
        Err(if saw_other_asset {
            FailureReason::WrongAsset
        } else {
            FailureReason::NoTransferFound
        })
    }
}

/// SPL token `transfer` / `transferChecked` instructions, in order.
fn token_transfers(transaction: &ParsedTransaction) -> impl Iterator<Item = TransferInfo> + '_ {
    let token_programs = [TOKEN_PROGRAM.to_string(), TOKEN_2022_PROGRAM.to_string()];
    transaction
        .instructions()
        .iter()
        .filter_map(move |instruction| match instruction {
            Instruction::Parsed(parsed)
                if parsed.program == TOKEN_PARSER
                    || token_programs.contains(&parsed.program_id) =>
            {
                Some(parsed)
            }
            _ => None,
        })
        .filter(|parsed| matches!(parsed.parsed.kind.as_str(), "transfer" | "transferChecked"))
        .filter_map(|parsed| serde_json::from_value(parsed.parsed.info.clone()).ok())
}

impl<R: LedgerRpc> ChainVerifier for LedgerChainVerifier<R> {
    fn family(&self) -> ChainFamily {
        ChainFamily::Ledger
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
