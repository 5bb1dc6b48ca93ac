use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A monetary amount with two fractional digits.
///
/// The sign of a ledger movement is carried by [`crate::EntryType`], never by
/// the amount itself; persisted entries always hold non-negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap_or(0)
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

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money::from_decimal)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_roundtrip() {
        assert_eq!(Money::from_cents(4590).to_cents(), 4590);
        assert_eq!(Money::from_cents(0).to_cents(), 0);
    }

    #[test]
    fn display_always_two_fractional_digits() {
        assert_eq!(Money::from_cents(4590).to_string(), "45.90");
        assert_eq!(Money::from_cents(100).to_string(), "1.00");
        assert_eq!(Money::from_str("120.5").unwrap().to_string(), "120.50");
    }

    #[test]
    fn from_decimal_rounds_to_two_places() {
        let m = Money::from_decimal(Decimal::from_str("1.005").unwrap());
        assert_eq!(m.to_cents(), 100);
        let m = Money::from_decimal(Decimal::from_str("1.015").unwrap());
        assert_eq!(m.to_cents(), 102);
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_cents(500);
        let b = Money::from_cents(250);
        assert_eq!((a + b).to_cents(), 750);
        assert_eq!((a - b).to_cents(), 250);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Money::from_str("not money").is_err());
    }

    #[test]
    fn serializes_as_a_bare_number() {
        let json = serde_json::to_value(Money::from_cents(4590)).unwrap();
        assert!(json.is_number());
        let back: Money = serde_json::from_value(json).unwrap();
        assert_eq!(back.to_cents(), 4590);
    }
}
