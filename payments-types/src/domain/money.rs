//! Monetary value in major currency units with two fractional digits.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Number of fractional digits kept for every amount.
pub const SCALE: u32 = 2;

/// Non-negative amount of the ledger currency in major units (naira).
///
/// The gateway speaks minor units (kobo); use [`Money::from_minor_units`] and
/// [`Money::to_minor_units`] when crossing that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Creates a new Money value, rejecting negatives and sub-kobo precision.
    pub fn new(amount: Decimal) -> Result<Self, DomainError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::NegativeAmount);
        }
        if amount.normalize().scale() > SCALE {
            return Err(DomainError::InvalidPrecision);
        }
        let mut amount = amount;
        amount.rescale(SCALE);
        // rescale keeps a lower scale when the mantissa would not fit
        if amount.scale() != SCALE {
            return Err(DomainError::AmountOverflow);
        }
        Ok(Self(amount))
    }

    /// Creates a zero-value Money.
    pub fn zero() -> Self {
        Self(Decimal::new(0, SCALE))
    }

    /// Converts an amount in minor units (kobo) into major units.
    pub fn from_minor_units(minor: i64) -> Result<Self, DomainError> {
        if minor < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self(Decimal::new(minor, SCALE)))
    }

    /// Returns the amount in minor units (kobo).
    pub fn to_minor_units(&self) -> Result<i64, DomainError> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|minor| minor.to_i64())
            .ok_or(DomainError::AmountOverflow)
    }

    /// Returns the amount in major units.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .filter(|sum| sum.scale() == SCALE)
            .map(Money)
            .ok_or(DomainError::AmountOverflow)
    }

    /// Checked subtraction - fails when the result would be negative.
    pub fn checked_sub(&self, other: Money) -> Result<Money, DomainError> {
        if self.0 < other.0 {
            return Err(DomainError::InsufficientFunds {
                available: self.0,
                requested: other.0,
            });
        }
        Ok(Money(self.0 - other.0))
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₦{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let money = Money::new(Decimal::from(500)).unwrap();
        assert_eq!(money.amount(), Decimal::new(50000, 2));
        assert_eq!(money.amount().to_string(), "500.00");
    }

    #[test]
    fn test_negative_money_fails() {
        let result = Money::new(Decimal::new(-100, 0));
        assert!(matches!(result, Err(DomainError::NegativeAmount)));
    }

    #[test]
    fn test_sub_kobo_precision_fails() {
        let result = Money::new(Decimal::new(10005, 3));
        assert!(matches!(result, Err(DomainError::InvalidPrecision)));
    }

    #[test]
    fn test_trailing_zeros_are_not_extra_precision() {
        let money = Money::new(Decimal::new(1050000, 4)).unwrap();
        assert_eq!(money.amount().to_string(), "105.00");
    }

    #[test]
    fn test_minor_unit_scaling() {
        let money = Money::from_minor_units(50000).unwrap();
        assert_eq!(money.amount(), Decimal::from(500));
        assert_eq!(money.to_minor_units().unwrap(), 50000);

        let odd = Money::new(Decimal::new(30075, 2)).unwrap();
        assert_eq!(odd.to_minor_units().unwrap(), 30075);
    }

    #[test]
    fn test_amount_too_large_for_kobo_scale_rejected() {
        assert!(matches!(
            Money::new(Decimal::MAX),
            Err(DomainError::AmountOverflow)
        ));
        assert!(matches!(
            Money::new(Decimal::from_i128_with_scale(10_i128.pow(27), 0)),
            Err(DomainError::AmountOverflow)
        ));
    }

    #[test]
    fn test_minor_units_overflow_is_an_error() {
        let huge = Money::new(Decimal::from_i128_with_scale(10_i128.pow(20), 0)).unwrap();
        assert!(matches!(
            huge.to_minor_units(),
            Err(DomainError::AmountOverflow)
        ));

        let largest = Money::new(Decimal::from_i128_with_scale(i64::MAX as i128, 2)).unwrap();
        assert_eq!(largest.to_minor_units().unwrap(), i64::MAX);
    }

    #[test]
    fn test_checked_sub_insufficient() {
        let balance = Money::new(Decimal::from(1000)).unwrap();
        let request = Money::new(Decimal::from(1500)).unwrap();
        let result = balance.checked_sub(request);
        assert!(matches!(
            result,
            Err(DomainError::InsufficientFunds { available, requested })
                if available == Decimal::from(1000) && requested == Decimal::from(1500)
        ));
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Money = serde_json::from_str("500").unwrap();
        let from_string: Money = serde_json::from_str("\"500.5\"").unwrap();
        assert_eq!(from_number.amount(), Decimal::from(500));
        assert_eq!(from_string.amount(), Decimal::new(50050, 2));
        assert!(serde_json::from_str::<Money>("-1").is_err());
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(Decimal::new(105, 1)).unwrap();
        assert_eq!(format!("{}", money), "₦10.50");
    }
}
