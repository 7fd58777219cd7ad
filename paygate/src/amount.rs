//! Human-readable currency amounts.
//!
//! Payment demands carry their amount as a decimal string (`"0.10"`). On-chain
//! transfers carry an integer count of base units, so comparing the two needs
//! normalization by the token's decimal count and a small absolute tolerance.
//! All arithmetic is exact decimal arithmetic via [`rust_decimal`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced while parsing or normalizing an amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The input is not a decimal number.
    #[error("Invalid amount {0:?}: not a decimal number")]
    NotANumber(String),
    /// The amount is zero or negative.
    #[error("Invalid amount {0}: must be greater than zero")]
    NotPositive(String),
    /// The amount has more fractional digits than the token supports.
    #[error("Invalid amount {amount}: at most {decimals} fractional digits are allowed")]
    TooPrecise {
        /// The rejected amount.
        amount: String,
        /// Maximum number of fractional digits.
        decimals: u32,
    },
    /// A raw on-chain value does not fit the decimal range.
    #[error("Raw amount {0} is out of range")]
    OutOfRange(String),
}

/// A strictly positive currency amount, such as `"0.10"` USDC.
///
/// The original textual scale is preserved, so `"0.10"` serializes back as
/// `"0.10"` rather than `"0.1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    /// Returns the amount as a [`Decimal`].
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Checks that the amount is representable with `decimals` fractional digits.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::TooPrecise`] when the amount is finer than the token unit.
    pub fn ensure_precision(&self, decimals: u32) -> Result<(), AmountError> {
        if self.0.normalize().scale() > decimals {
            return Err(AmountError::TooPrecise {
                amount: self.to_string(),
                decimals,
            });
        }
        Ok(())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value =
            Decimal::from_str(trimmed).map_err(|_| AmountError::NotANumber(trimmed.to_owned()))?;
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(trimmed.to_owned()));
        }
        Ok(Self(value))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value.to_string()));
        }
        Ok(Self(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Converts a raw base-unit value into currency units.
///
/// `normalize(100_000, 6)` is `0.100000`.
///
/// # Errors
///
/// Returns [`AmountError::OutOfRange`] when the value exceeds the decimal range.
pub fn normalize(raw: u128, decimals: u32) -> Result<Decimal, AmountError> {
    let signed = i128::try_from(raw).map_err(|_| AmountError::OutOfRange(raw.to_string()))?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map_err(|_| AmountError::OutOfRange(raw.to_string()))
}

/// Returns `true` when `observed` is within `tolerance` of `expected`, inclusive.
#[must_use]
pub fn within_tolerance(observed: Decimal, expected: Decimal, tolerance: Decimal) -> bool {
    (observed - expected).abs() <= tolerance
}
