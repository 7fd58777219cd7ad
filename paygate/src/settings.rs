//! Verification settings shared by every chain verifier.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default absolute amount tolerance: 0.01 currency units.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Default stable-coin decimal count.
pub const DEFAULT_DECIMALS: u32 = 6;

/// Default upper bound for a single chain RPC call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Default allowance for a chain clock running behind the server clock.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// How transfers are compared against a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationSettings {
    /// Maximum absolute difference between observed and requested amounts.
    pub tolerance: Decimal,
    /// Number of fractional digits of the stable-coin's base unit.
    pub decimals: u32,
    /// Upper bound for each RPC call.
    #[serde(
        rename = "rpc_timeout_secs",
        serialize_with = "serialize_secs",
        deserialize_with = "deserialize_secs"
    )]
    pub rpc_timeout: Duration,
    /// How far before a request's creation a transfer may be timestamped.
    #[serde(
        rename = "clock_skew_secs",
        serialize_with = "serialize_secs",
        deserialize_with = "deserialize_secs"
    )]
    pub clock_skew: Duration,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            decimals: DEFAULT_DECIMALS,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }
}

impl VerificationSettings {
    /// Sets the amount tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the per-call RPC timeout.
    #[must_use]
    pub const fn with_rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    /// Sets the allowed chain clock skew.
    #[must_use]
    pub const fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

fn deserialize_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}
