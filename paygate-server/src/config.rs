//! Server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 3402
//! ttl_minutes = 15
//!
//! [verification]
//! tolerance = "0.01"
//! rpc_timeout_secs = 10
//! clock_skew_secs = 60
//!
//! [networks.base]
//! rpc_url = "https://mainnet.base.org"
//! recipient = "$BASE_RECIPIENT"
//!
//! [[routes]]
//! path = "/report"
//! amount = "0.10"
//! network = "base"
//! description = "Daily report"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port
//! - Recipients and RPC URLs referenced by `$VAR` in the config file

use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use paygate::{Amount, FailurePolicy, Network, VerificationSettings};
use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `3402`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Lifetime of issued payment requests in minutes.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u32,

    /// Period of the expiry sweep in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// How long consumed transaction references are remembered, in minutes.
    ///
    /// Must cover a request's lifetime plus the verification clock skew:
    /// older transfers are rejected as stale anyway.
    #[serde(default = "default_spent_retention_minutes")]
    pub spent_retention_minutes: u32,

    /// What happens to a request after a rejected proof.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Amount tolerance, decimals and RPC timeout.
    #[serde(default)]
    pub verification: VerificationSettings,

    /// Per-network endpoints and recipients.
    #[serde(default)]
    pub networks: BTreeMap<Network, NetworkConfig>,

    /// Payment-protected routes.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Per-network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: Url,

    /// Address (EVM) or token account (Solana) receiving payments.
    pub recipient: String,

    /// Stable-coin contract address or mint overriding the well-known USDC one.
    #[serde(default)]
    pub asset: Option<String>,
}

/// A payment-protected route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Axum route path, e.g. `/report`.
    pub path: String,
    /// Price in USDC.
    pub amount: Amount,
    /// Network the payment is demanded on.
    pub network: Network,
    /// What the payment grants access to.
    #[serde(default)]
    pub description: String,
}

/// Error loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The TOML is malformed or has wrong types.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The values are inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Paths served by the server itself.
const RESERVED_PATHS: [&str; 3] = ["/health", "/payments", "/payments/verify"];

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    3402
}

const fn default_ttl_minutes() -> u32 {
    15
}

const fn default_sweep_interval_secs() -> u64 {
    60
}

const fn default_spent_retention_minutes() -> u32 {
    24 * 60
}

impl ServerConfig {
    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// After loading, all `$VAR` / `${VAR}` references are expanded from the
    /// process environment. `HOST` and `PORT` env vars override the file
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        let mut config = Self::parse(&content)?;

        if let Ok(host) = std::env::var("HOST")
            && let Ok(addr) = host.parse()
        {
            config.host = addr;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        Ok(config)
    }

    /// Parses and validates configuration text, expanding environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML or inconsistent values.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        let config: Self = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_minutes == 0 {
            return Err(ConfigError::Invalid("ttl_minutes must be positive".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_secs must be positive".into(),
            ));
        }
        let retention_secs = u64::from(self.spent_retention_minutes) * 60;
        let fresh_window_secs =
            u64::from(self.ttl_minutes) * 60 + self.verification.clock_skew.as_secs();
        if retention_secs < fresh_window_secs {
            return Err(ConfigError::Invalid(format!(
                "spent_retention_minutes must cover ttl_minutes plus clock skew \
                 ({fresh_window_secs}s)"
            )));
        }
        for (network, net) in &self.networks {
            if net.recipient.trim().is_empty() || net.recipient.starts_with('$') {
                return Err(ConfigError::Invalid(format!(
                    "recipient for {network} is not set (missing env var?)"
                )));
            }
        }
        let mut seen = HashSet::from(RESERVED_PATHS);
        for route in &self.routes {
            if !seen.insert(route.path.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "route path {} is reserved or listed twice",
                    route.path
                )));
            }
            if !route.path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "route path {:?} must start with '/'",
                    route.path
                )));
            }
            if !self.networks.contains_key(&route.network) {
                return Err(ConfigError::Invalid(format!(
                    "route {} uses unconfigured network {}",
                    route.path, route.network
                )));
            }
        }
        Ok(())
    }

    /// Request lifetime.
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.ttl_minutes))
    }

    /// Sweep period.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Retention of consumed transaction references.
    #[must_use]
    pub fn spent_retention(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.spent_retention_minutes))
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match std::env::var(&name) {
            Ok(value) if !name.is_empty() => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        port = 8080
        ttl_minutes = 5
        failure_policy = "invalidate_on_failure"

        [verification]
        tolerance = "0.02"
        rpc_timeout_secs = 3

        [networks.base]
        rpc_url = "https://mainnet.base.org"
        recipient = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C"

        [networks.solana-devnet]
        rpc_url = "https://api.devnet.solana.com"
        recipient = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"

        [[routes]]
        path = "/report"
        amount = "0.10"
        network = "base"
        description = "Daily report"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = ServerConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, default_host());
        assert_eq!(config.ttl(), chrono::Duration::minutes(5));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.failure_policy, FailurePolicy::InvalidateOnFailure);
        assert_eq!(config.verification.rpc_timeout, Duration::from_secs(3));
        assert_eq!(config.verification.decimals, 6);
        assert_eq!(config.networks.len(), 2);
        assert!(config.networks.contains_key(&Network::SolanaDevnet));
        assert_eq!(config.routes[0].amount.to_string(), "0.10");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config.port, 3402);
        assert_eq!(config.ttl_minutes, 15);
        assert_eq!(config.spent_retention(), chrono::Duration::hours(24));
        assert_eq!(config.failure_policy, FailurePolicy::RetainUntilExpiry);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_spent_retention_shorter_than_ttl_is_rejected() {
        let toml = r#"
            ttl_minutes = 30
            spent_retention_minutes = 30
        "#;
        assert!(matches!(
            ServerConfig::parse(toml),
            Err(ConfigError::Invalid(_))
        ));
        assert!(ServerConfig::parse("ttl_minutes = 30\nspent_retention_minutes = 31").is_ok());
    }

    #[test]
    fn test_route_on_unconfigured_network_is_rejected() {
        let toml = r#"
            [[routes]]
            path = "/x"
            amount = "1"
            network = "polygon"
        "#;
        assert!(matches!(
            ServerConfig::parse(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_reserved_route_path_is_rejected() {
        let toml = r#"
            [networks.base]
            rpc_url = "https://mainnet.base.org"
            recipient = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C"

            [[routes]]
            path = "/health"
            amount = "1"
            network = "base"
        "#;
        assert!(matches!(
            ServerConfig::parse(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unresolved_recipient_is_rejected() {
        let toml = r#"
            [networks.base]
            rpc_url = "https://mainnet.base.org"
            recipient = "$PAYGATE_TEST_SURELY_UNSET_RECIPIENT"
        "#;
        assert!(matches!(
            ServerConfig::parse(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_network_is_parse_error() {
        let toml = r#"
            [networks.mars]
            rpc_url = "https://example.com"
            recipient = "0x1"
        "#;
        assert!(matches!(
            ServerConfig::parse(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_expand_env_vars() {
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("a=$PATH;"), format!("a={path};"));
        assert_eq!(expand_env_vars("a=${PATH}x"), format!("a={path}x"));
        assert_eq!(
            expand_env_vars("$PAYGATE_TEST_UNSET_VAR ${PAYGATE_TEST_UNSET_VAR}"),
            "$PAYGATE_TEST_UNSET_VAR ${PAYGATE_TEST_UNSET_VAR}"
        );
        assert_eq!(expand_env_vars("cost: $ 5"), "cost: $ 5");
    }
}
