//! Integer money amounts.
//!
//! The shop trades in a single currency with no fractional unit (Rupiah), so
//! every price and order figure is a whole number of currency units.

use core::fmt;
use core::iter::Sum;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Amounts are never negative.
    #[error("amount cannot be negative (got {0})")]
    Negative(i64),
    /// Arithmetic left the representable range.
    #[error("amount overflow")]
    Overflow,
}

/// A non-negative amount in whole currency units.
///
/// ```
/// use toko_core::Money;
///
/// let price = Money::new(250_000).unwrap();
/// assert_eq!(price.times(3).unwrap(), Money::new(750_000).unwrap());
/// assert!(Money::new(-1).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Create an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if `amount < 0`.
    pub const fn new(amount: i64) -> Result<Self, MoneyError> {
        if amount < 0 {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Multiply by a quantity (a line total).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the product does not fit in an `i64`.
    pub fn times(self, quantity: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Add two amounts.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the sum does not fit in an `i64`.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Subtract, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 { Self::ZERO } else { Self(diff) }
    }
}

impl TryFrom<i64> for Money {
    type Error = MoneyError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Money {
    /// Saturates at `i64::MAX`; callers that care use [`Money::checked_add`].
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| Self(acc.0.saturating_add(m.0)))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Money::new(-5), Err(MoneyError::Negative(-5)));
    }

    #[test]
    fn test_times() {
        let price = Money::new(15_000_000).unwrap();
        assert_eq!(price.times(2).unwrap().as_i64(), 30_000_000);
        assert_eq!(Money::new(i64::MAX).unwrap().times(2), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_saturating_sub() {
        let a = Money::new(10).unwrap();
        let b = Money::new(25).unwrap();
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a).as_i64(), 15);
    }

    #[test]
    fn test_sum() {
        let total: Money = [1, 2, 3].into_iter().map(|n| Money::new(n).unwrap()).sum();
        assert_eq!(total.as_i64(), 6);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Money>("-1").is_err());
        assert_eq!(serde_json::from_str::<Money>("850000").unwrap().as_i64(), 850_000);
    }
}
