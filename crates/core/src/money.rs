use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// An exact monetary amount, rounded to whole cents on entry.
///
/// Equality and ordering are by numeric value. The minor-unit integer from
/// [`Money::to_cents`] is the canonical key used to compare amounts across
/// the system, regardless of how they were written in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot interpret \"{0}\" as a monetary amount")]
pub struct MoneyParseError(pub String);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap()
    }

    /// The minor-unit integer value. Alias of [`Money::to_cents`] under the
    /// name the mismatch/filter layers use for map keys.
    pub fn key(self) -> i64 {
        self.to_cents()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Parse a textual amount from a CSV cell.
    ///
    /// This is the only place where string-format leniency lives. Currency
    /// symbols, currency codes, thousands separators and surrounding
    /// whitespace are ignored; accounting parentheses negate. Text with no
    /// parseable numeric core is rejected rather than guessed at.
    ///
    /// `"$100.00"`, `"100"`, `"€100.00"` and `"100 GBP"` all parse to the
    /// same value.
    pub fn parse(text: &str) -> Result<Self, MoneyParseError> {
        let s = text.trim();
        let (negative, s) = if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
            (true, s[1..s.len() - 1].trim())
        } else {
            (false, s)
        };

        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        if cleaned.is_empty() {
            return Err(MoneyParseError(text.to_string()));
        }

        let mut dec =
            Decimal::from_str(&cleaned).map_err(|_| MoneyParseError(text.to_string()))?;
        if negative {
            dec = -dec;
        }
        Ok(Money::from_decimal(dec))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}
