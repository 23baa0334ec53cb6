//! Type-safe recipe price using decimal arithmetic.
//!
//! Prices are stored in a `NUMERIC(5, 2)` column: at most five significant
//! digits, two of them after the decimal point. Values are always carried
//! with exactly two decimal places so `5` and `5.00` compare and serialize the
//! same way (`"5.00"`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The value has more fractional digits than the column allows.
    #[error("ensure that there are no more than {max} decimal places")]
    TooManyDecimalPlaces {
        /// Maximum allowed decimal places.
        max: u32,
    },
    /// The value has more integer digits than the column allows.
    #[error("ensure that there are no more than {max} digits before the decimal point")]
    TooManyDigits {
        /// Maximum allowed integer digits.
        max: u32,
    },
    /// The input is not a decimal number.
    #[error("a valid number is required")]
    Invalid,
}

/// A recipe price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Number of digits after the decimal point.
    pub const DECIMAL_PLACES: u32 = 2;
    /// Total number of significant digits.
    pub const MAX_DIGITS: u32 = 5;

    /// Create a price, validating it against the column precision.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooManyDecimalPlaces` if the value has more than
    /// two non-zero fractional digits, or `PriceError::TooManyDigits` if it is
    /// 1000 or more in magnitude.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let normalized = amount.normalize();
        if normalized.scale() > Self::DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces {
                max: Self::DECIMAL_PLACES,
            });
        }

        let max_integer_digits = Self::MAX_DIGITS - Self::DECIMAL_PLACES;
        if normalized.abs() >= Decimal::from(10_i64.pow(max_integer_digits)) {
            return Err(PriceError::TooManyDigits {
                max: max_integer_digits,
            });
        }

        let mut amount = normalized;
        amount.rescale(Self::DECIMAL_PLACES);
        Ok(Self(amount))
    }

    /// Returns the decimal amount (always with two decimal places).
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
