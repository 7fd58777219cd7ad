//! USDC deployments on the supported account-based networks.

use alloy_primitives::{Address, address};
use paygate::Network;

use crate::error::EvmConfigError;

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// USDC contract address on Ethereum Mainnet.
pub const USDC_ETHEREUM: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// USDC contract address on Polygon Mainnet.
pub const USDC_POLYGON: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// USDC contract address on Polygon Amoy.
pub const USDC_POLYGON_AMOY: Address = address!("41E94Eb71Ef8C9fAE0235d1e472b21E21B5a4dbF");

/// USDC contract address on Avalanche C-Chain.
pub const USDC_AVALANCHE: Address = address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E");

/// USDC contract address on Avalanche Fuji.
pub const USDC_AVALANCHE_FUJI: Address = address!("5425890298aed601595a70AB815c96711a31Bc65");

/// USDC contract address on Celo.
pub const USDC_CELO: Address = address!("cebA9300f2b948710d2653dD7B07f33A8B32118C");

/// Returns the USDC contract for an account-based network.
#[must_use]
pub const fn usdc_address(network: Network) -> Option<Address> {
    match network {
        Network::Base => Some(USDC_BASE),
        Network::BaseSepolia => Some(USDC_BASE_SEPOLIA),
        Network::Ethereum => Some(USDC_ETHEREUM),
        Network::Polygon => Some(USDC_POLYGON),
        Network::PolygonAmoy => Some(USDC_POLYGON_AMOY),
        Network::Avalanche => Some(USDC_AVALANCHE),
        Network::AvalancheFuji => Some(USDC_AVALANCHE_FUJI),
        Network::Celo => Some(USDC_CELO),
        Network::Solana | Network::SolanaDevnet => None,
    }
}

/// Parses a 20-byte hex address, with or without checksum casing.
///
/// # Errors
///
/// Returns [`EvmConfigError::InvalidAddress`] when the input is not an address.
pub fn parse_address(value: &str) -> Result<Address, EvmConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| EvmConfigError::InvalidAddress(value.to_owned()))
}
