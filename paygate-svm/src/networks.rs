//! USDC mints and token programs on the supported Solana clusters.

use solana_pubkey::{Pubkey, pubkey};

use crate::error::SvmConfigError;
use paygate::Network;

/// Native Circle USDC mint on Solana mainnet.
pub const USDC_SOLANA: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

/// Circle USDC test mint on Solana devnet.
pub const USDC_SOLANA_DEVNET: Pubkey = pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

/// SPL Token program.
pub const TOKEN_PROGRAM: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// SPL Token-2022 program.
pub const TOKEN_2022_PROGRAM: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// Returns the USDC mint for a ledger network.
#[must_use]
pub const fn usdc_mint(network: Network) -> Option<Pubkey> {
    match network {
        Network::Solana => Some(USDC_SOLANA),
        Network::SolanaDevnet => Some(USDC_SOLANA_DEVNET),
        _ => None,
    }
}

/// Parses a base58 public key.
///
/// # Errors
///
/// Returns [`SvmConfigError::InvalidPubkey`] when the input is not a 32-byte key.
pub fn parse_pubkey(value: &str) -> Result<Pubkey, SvmConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| SvmConfigError::InvalidPubkey(value.to_owned()))
}
