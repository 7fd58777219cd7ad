//! Supported networks and their chain families.
//!
//! Networks are addressed by their human-readable name (e.g. `"base"`) on the
//! wire. Each one maps to a CAIP-2 chain identifier and to a [`ChainFamily`],
//! which selects how a transfer is located and decoded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How a chain exposes token transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    /// Account-based chains whose transactions emit structured event logs (EVM).
    Account,
    /// Instruction-based ledgers whose transactions carry ordered instructions (Solana).
    Ledger,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => f.write_str("account"),
            Self::Ledger => f.write_str("ledger"),
        }
    }
}

/// A network on which payment demands can be issued and verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Network {
    /// Base mainnet (`eip155:8453`).
    Base,
    /// Base Sepolia testnet (`eip155:84532`).
    BaseSepolia,
    /// Ethereum mainnet (`eip155:1`).
    Ethereum,
    /// Polygon PoS mainnet (`eip155:137`).
    Polygon,
    /// Polygon Amoy testnet (`eip155:80002`).
    PolygonAmoy,
    /// Avalanche C-Chain (`eip155:43114`).
    Avalanche,
    /// Avalanche Fuji testnet (`eip155:43113`).
    AvalancheFuji,
    /// Celo mainnet (`eip155:42220`).
    Celo,
    /// Solana mainnet-beta.
    Solana,
    /// Solana devnet.
    SolanaDevnet,
}

/// Static description of a network: its name and CAIP-2 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NetworkInfo {
    network: Network,
    name: &'static str,
    namespace: &'static str,
    reference: &'static str,
}

static NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        network: Network::Base,
        name: "base",
        namespace: "eip155",
        reference: "8453",
    },
    NetworkInfo {
        network: Network::BaseSepolia,
        name: "base-sepolia",
        namespace: "eip155",
        reference: "84532",
    },
    NetworkInfo {
        network: Network::Ethereum,
        name: "ethereum",
        namespace: "eip155",
        reference: "1",
    },
    NetworkInfo {
        network: Network::Polygon,
        name: "polygon",
        namespace: "eip155",
        reference: "137",
    },
    NetworkInfo {
        network: Network::PolygonAmoy,
        name: "polygon-amoy",
        namespace: "eip155",
        reference: "80002",
    },
    NetworkInfo {
        network: Network::Avalanche,
        name: "avalanche",
        namespace: "eip155",
        reference: "43114",
    },
    NetworkInfo {
        network: Network::AvalancheFuji,
        name: "avalanche-fuji",
        namespace: "eip155",
        reference: "43113",
    },
    NetworkInfo {
        network: Network::Celo,
        name: "celo",
        namespace: "eip155",
        reference: "42220",
    },
    NetworkInfo {
        network: Network::Solana,
        name: "solana",
        namespace: "solana",
        reference: "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
    },
    NetworkInfo {
        network: Network::SolanaDevnet,
        name: "solana-devnet",
        namespace: "solana",
        reference: "EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
    },
];

impl Network {
    /// Every supported network, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Base,
        Self::BaseSepolia,
        Self::Ethereum,
        Self::Polygon,
        Self::PolygonAmoy,
        Self::Avalanche,
        Self::AvalancheFuji,
        Self::Celo,
        Self::Solana,
        Self::SolanaDevnet,
    ];

    fn info(self) -> &'static NetworkInfo {
        NETWORKS
            .iter()
            .find(|info| info.network == self)
            .unwrap_or(&NETWORKS[0])
    }

    /// Returns the wire name of this network (e.g. `"base-sepolia"`).
    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Returns the chain family that decides how transfers are inspected.
    #[must_use]
    pub fn family(self) -> ChainFamily {
        match self.info().namespace {
            "solana" => ChainFamily::Ledger,
            _ => ChainFamily::Account,
        }
    }

    /// Returns the CAIP-2 chain identifier (e.g. `"eip155:8453"`).
    #[must_use]
    pub fn caip2(self) -> String {
        let info = self.info();
        format!("{}:{}", info.namespace, info.reference)
    }

    /// Returns the numeric EIP-155 chain id for account-based networks.
    #[must_use]
    pub fn eip155_chain_id(self) -> Option<u64> {
        let info = self.info();
        if info.namespace == "eip155" {
            info.reference.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no supported network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown network {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    /// Parses either the wire name (`"base"`) or the CAIP-2 form (`"eip155:8453"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NETWORKS
            .iter()
            .find(|info| {
                info.name.eq_ignore_ascii_case(trimmed)
                    || trimmed
                        .split_once(':')
                        .is_some_and(|(ns, r)| ns == info.namespace && r == info.reference)
            })
            .map(|info| info.network)
            .ok_or_else(|| UnknownNetwork(trimmed.to_owned()))
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_name() {
        assert_eq!("base".parse::<Network>().unwrap(), Network::Base);
        assert_eq!(
            "solana-devnet".parse::<Network>().unwrap(),
            Network::SolanaDevnet
        );
        assert_eq!("BASE".parse::<Network>().unwrap(), Network::Base);
        assert!("unknown".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_from_caip2() {
        assert_eq!(
            "eip155:84532".parse::<Network>().unwrap(),
            Network::BaseSepolia
        );
        assert_eq!(
            "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp"
                .parse::<Network>()
                .unwrap(),
            Network::Solana
        );
        assert!("eip155:999999".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_family() {
        assert_eq!(Network::Base.family(), ChainFamily::Account);
        assert_eq!(Network::Celo.family(), ChainFamily::Account);
        assert_eq!(Network::Solana.family(), ChainFamily::Ledger);
        assert_eq!(Network::SolanaDevnet.family(), ChainFamily::Ledger);
    }

    #[test]
    fn test_network_serde_uses_name() {
        let json = serde_json::to_string(&Network::PolygonAmoy).unwrap();
        assert_eq!(json, "\"polygon-amoy\"");
        let network: Network = serde_json::from_str("\"avalanche-fuji\"").unwrap();
        assert_eq!(network, Network::AvalancheFuji);
    }

    #[test]
    fn test_every_network_roundtrips_through_name_and_caip2() {
        for network in Network::ALL {
            assert_eq!(network.name().parse::<Network>().unwrap(), network);
            assert_eq!(network.caip2().parse::<Network>().unwrap(), network);
        }
    }

    #[test]
    fn test_eip155_chain_id() {
        assert_eq!(Network::Base.eip155_chain_id(), Some(8453));
        assert_eq!(Network::Ethereum.eip155_chain_id(), Some(1));
        assert_eq!(Network::Solana.eip155_chain_id(), None);
    }
}
