//! `jsonParsed` transaction shapes returned by `getTransaction`.
//!
//! Only the fields needed to locate a token transfer are modelled. Anything
//! else the node returns is ignored.

use serde::{Deserialize, Serialize};

/// A confirmed transaction in `jsonParsed` encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    /// Slot the transaction was processed in.
    #[serde(default)]
    pub slot: u64,
    /// Estimated production time of the slot, in unix seconds.
    #[serde(default)]
    pub block_time: Option<i64>,
    /// Status metadata; absent on some pruned nodes.
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    /// The transaction body.
    pub transaction: TransactionBody,
}

impl ParsedTransaction {
    /// Returns `true` when metadata is present and reports no error.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.meta.as_ref().is_some_and(|meta| meta.err.is_none())
    }

    /// Top-level instructions in execution order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.transaction.message.instructions
    }

    /// Mint held by the token account `account`, from the balance metadata.
    #[must_use]
    pub fn mint_of(&self, account: &str) -> Option<&str> {
        let index = self
            .transaction
            .message
            .account_keys
            .iter()
            .position(|key| key.pubkey() == account)?;
        let meta = self.meta.as_ref()?;
        meta.pre_token_balances
            .iter()
            .chain(&meta.post_token_balances)
            .find(|balance| balance.account_index == index)
            .map(|balance| balance.mint.as_str())
    }
}

/// Execution metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Execution error, `null` on success.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    /// Token balances before execution.
    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,
    /// Token balances after execution.
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,
}

/// Balance of one token account touched by the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// Index into the message's account keys.
    pub account_index: usize,
    /// Mint of the token account.
    pub mint: String,
}

/// Signed transaction body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// The message carrying the instructions.
    pub message: Message,
    /// Transaction signatures, fee payer first.
    #[serde(default)]
    pub signatures: Vec<String>,
}

/// Transaction message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Accounts referenced by the transaction.
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,
    /// Top-level instructions.
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// An account key, parsed (`jsonParsed`) or bare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountKey {
    /// Object form with signer and writable flags.
    Parsed {
        /// Account address in base58.
        pubkey: String,
    },
    /// Plain base58 address.
    Plain(String),
}

impl AccountKey {
    /// The account address.
    #[must_use]
    pub fn pubkey(&self) -> &str {
        match self {
            Self::Parsed { pubkey } | Self::Plain(pubkey) => pubkey,
        }
    }
}

/// An instruction the node either could or could not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instruction {
    /// Parsed by a known program parser.
    Parsed(ParsedInstruction),
    /// Raw or partially decoded instruction.
    Raw(serde_json::Value),
}

/// A parsed instruction, e.g. an SPL token transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    /// Parser name, such as `spl-token`.
    pub program: String,
    /// Program id in base58.
    pub program_id: String,
    /// Decoded instruction.
    pub parsed: InstructionBody,
}

/// Decoded instruction payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionBody {
    /// Instruction name, such as `transferChecked`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Instruction-specific fields.
    #[serde(default)]
    pub info: serde_json::Value,
}

/// Fields of an SPL `transfer` or `transferChecked` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInfo {
    /// Source token account.
    #[serde(default)]
    pub source: Option<String>,
    /// Destination token account.
    pub destination: String,
    /// Mint; only present on `transferChecked`.
    #[serde(default)]
    pub mint: Option<String>,
    /// Raw amount on plain `transfer`.
    #[serde(default)]
    pub amount: Option<String>,
    /// Amount with decimals on `transferChecked`.
    #[serde(default)]
    pub token_amount: Option<TokenAmount>,
}

impl TransferInfo {
    /// Raw base-unit amount, if present and numeric.
    #[must_use]
    pub fn raw_amount(&self) -> Option<u128> {
        self.token_amount
            .as_ref()
            .map(|t| t.amount.as_str())
            .or(self.amount.as_deref())
            .and_then(|raw| raw.parse().ok())
    }
}

/// UI token amount as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Raw base-unit amount as a decimal string.
    pub amount: String,
    /// Mint decimals.
    #[serde(default)]
    pub decimals: u8,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_mixed_instructions_deserialize() {
        let tx: ParsedTransaction = serde_json::from_value(json!({
            "slot": 42,
            "meta": { "err": null, "fee": 5000 },
            "transaction": {
                "signatures": ["sig"],
                "message": {
                    "accountKeys": [],
                    "instructions": [
                        { "programId": "ComputeBudget111111111111111111111111111111",
                          "accounts": [], "data": "3DdGGhkhJbjm" },
                        { "program": "spl-memo",
                          "programId": "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr",
                          "parsed": "hello" },
                        { "program": "spl-token",
                          "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                          "parsed": { "type": "transferChecked", "info": {
                              "destination": "Dest", "mint": "Mint", "source": "Src",
                              "tokenAmount": { "amount": "100000", "decimals": 6,
                                               "uiAmount": 0.1, "uiAmountString": "0.1" }
                          }}}
                    ]
                }
            }
        }))
        .unwrap();

        assert!(tx.succeeded());
        assert_eq!(tx.slot, 42);
        assert!(matches!(tx.instructions()[0], Instruction::Raw(_)));
        assert!(matches!(tx.instructions()[1], Instruction::Raw(_)));
        let Instruction::Parsed(transfer) = &tx.instructions()[2] else {
            panic!("expected parsed transfer");
        };
        let info: TransferInfo = serde_json::from_value(transfer.parsed.info.clone()).unwrap();
        assert_eq!(info.raw_amount(), Some(100_000));
        assert_eq!(info.mint.as_deref(), Some("Mint"));
    }

    #[test]
    fn test_failed_or_missing_meta() {
        let failed: ParsedTransaction = serde_json::from_value(json!({
            "meta": { "err": { "InstructionError": [0, "Custom"] } },
            "transaction": { "message": { "instructions": [] } }
        }))
        .unwrap();
        assert!(!failed.succeeded());

        let missing: ParsedTransaction = serde_json::from_value(json!({
            "meta": null,
            "transaction": { "message": { "instructions": [] } }
        }))
        .unwrap();
        assert!(!missing.succeeded());
    }

    #[test]
    fn test_mint_resolved_from_token_balances() {
        let tx: ParsedTransaction = serde_json::from_value(json!({
            "blockTime": 1_700_000_000,
            "meta": {
                "err": null,
                "preTokenBalances": [
                    { "accountIndex": 1, "mint": "Mint", "owner": "Owner",
                      "uiTokenAmount": { "amount": "0", "decimals": 6 } }
                ],
                "postTokenBalances": []
            },
            "transaction": { "message": {
                "accountKeys": [
                    { "pubkey": "Payer", "signer": true, "writable": true },
                    { "pubkey": "Dest", "signer": false, "writable": true }
                ],
                "instructions": []
            }}
        }))
        .unwrap();
        assert_eq!(tx.block_time, Some(1_700_000_000));
        assert_eq!(tx.mint_of("Dest"), Some("Mint"));
        assert_eq!(tx.mint_of("Payer"), None);
        assert_eq!(tx.mint_of("Unknown"), None);
    }

    #[test]
    fn test_plain_transfer_amount() {
        let info: TransferInfo = serde_json::from_value(json!({
            "destination": "Dest", "source": "Src", "authority": "Owner", "amount": "2500"
        }))
        .unwrap();
        assert_eq!(info.raw_amount(), Some(2500));
        assert_eq!(info.mint, None);
    }
}
