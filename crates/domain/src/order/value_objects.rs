//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = R$10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Largest magnitude, in whole units, accepted by [`Money::from_decimal`].
    pub const MAX_DECIMAL: f64 = 1_000_000_000.0;

    /// Creates a Money amount from a decimal value, rounding to the nearest cent.
    ///
    /// Returns `None` for NaN, infinite, or values beyond [`Money::MAX_DECIMAL`].
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount.abs() > Self::MAX_DECIMAL {
            return None;
        }
        Some(Self {
            cents: (amount * 100.0).round() as i64,
        })
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Sums amounts, returning `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a decimal number with two places, for display.
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Returns the whole units portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.units(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_from_decimal_rounds_to_cents() {
        assert_eq!(Money::from_decimal(10.0).unwrap().cents(), 1000);
        assert_eq!(Money::from_decimal(19.99).unwrap().cents(), 1999);
        assert!(Money::from_decimal(f64::NAN).is_none());
        assert!(Money::from_decimal(f64::INFINITY).is_none());
    }

    #[test]
    fn test_money_from_decimal_rejects_out_of_range() {
        assert!(Money::from_decimal(1e300).is_none());
        assert!(Money::from_decimal(-1e300).is_none());
        assert!(Money::from_decimal(Money::MAX_DECIMAL + 1.0).is_none());
        assert_eq!(
            Money::from_decimal(Money::MAX_DECIMAL).unwrap().cents(),
            100_000_000_000
        );
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1500).to_string(), "15.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_checked_sum() {
        let total = Money::checked_sum([1000, 500, 250].map(Money::from_cents)).unwrap();
        assert_eq!(total.cents(), 1750);
        assert_eq!(total.as_decimal(), 17.5);
        assert_eq!(Money::checked_sum([]), Some(Money::zero()));
    }

    #[test]
    fn test_money_checked_add_overflow() {
        let huge = Money::from_cents(i64::MAX);
        assert!(huge.checked_add(Money::from_cents(1)).is_none());
        assert!(Money::checked_sum([huge, huge]).is_none());
    }
}
