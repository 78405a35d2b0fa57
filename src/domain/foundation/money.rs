//! Money and currency value objects.
//!
//! Amounts are integer minor units (cents, kopecks). Every supported currency
//! uses two fractional digits, which is what the provider wire formats expect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

const MINOR_DIGITS: u32 = 2;
const MINOR_PER_UNIT: i64 = 10_i64.pow(MINOR_DIGITS);

/// ISO-4217 alphabetic currency code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("'{}' is not a three-letter currency code", code),
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-negative amount of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates an amount from minor units, rejecting negatives.
    pub fn new(minor: i64, currency: Currency) -> Result<Self, ValidationError> {
        if minor < 0 {
            return Err(ValidationError::out_of_range("amount", 0, i64::MAX, minor));
        }
        Ok(Self { minor, currency })
    }

    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    pub fn minor_units(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Parses a provider decimal string such as `"100"`, `"100.5"` or `"100.000"`.
    ///
    /// Fractional digits beyond the second must all be zero, so `"1.001"` is
    /// rejected instead of silently rounded.
    pub fn parse_decimal(value: &str, currency: Currency) -> Result<Self, ValidationError> {
        let value = value.trim();
        let invalid = |reason: &str| ValidationError::invalid_format("amount", reason);

        let (units, fraction) = match value.split_once('.') {
            Some((u, f)) => (u, f),
            None => (value, ""),
        };
        if units.is_empty() || !units.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal number"));
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal number"));
        }
        let (significant, rest) = fraction.split_at(fraction.len().min(MINOR_DIGITS as usize));
        if rest.chars().any(|c| c != '0') {
            return Err(invalid("more precision than minor units allow"));
        }

        let units: i64 = units.parse().map_err(|_| invalid("amount too large"))?;
        let mut cents: i64 = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|_| invalid("bad fraction"))?
        };
        if significant.len() == 1 {
            cents *= 10;
        }

        let minor = units
            .checked_mul(MINOR_PER_UNIT)
            .and_then(|m| m.checked_add(cents))
            .ok_or_else(|| invalid("amount too large"))?;
        Self::new(minor, currency)
    }

    /// Renders as `units.cc`, the format every supported provider accepts.
    pub fn to_decimal_string(&self) -> String {
        format!(
            "{}.{:02}",
            self.minor / MINOR_PER_UNIT,
            self.minor % MINOR_PER_UNIT
        )
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(&self, other: &Money) -> Result<Money, ValidationError> {
        self.ensure_same_currency(other)?;
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or_else(|| ValidationError::invalid_format("amount", "overflow"))?;
        Ok(Money {
            minor,
            currency: self.currency.clone(),
        })
    }

    /// Subtracts, flooring at zero.
    pub fn saturating_sub(&self, other: &Money) -> Result<Money, ValidationError> {
        self.ensure_same_currency(other)?;
        Ok(Money {
            minor: (self.minor - other.minor).max(0),
            currency: self.currency.clone(),
        })
    }

    /// Multiplies by a quantity.
    pub fn checked_times(&self, quantity: u32) -> Result<Money, ValidationError> {
        let minor = self
            .minor
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| ValidationError::invalid_format("amount", "overflow"))?;
        Ok(Money {
            minor,
            currency: self.currency.clone(),
        })
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), ValidationError> {
        if self.currency != other.currency {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("cannot combine {} with {}", self.currency, other.currency),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal_string(), self.currency)
    }
}
