use std::{fmt::Display, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{
    database::{HasArguments, HasValueRef},
    encode::IsNull,
    error::BoxDynError,
    sqlite::SqliteTypeInfo,
    Decode,
    Encode,
    Sqlite,
    Type,
};
use thiserror::Error;

/// The number of decimal places that prices and weights are rounded to.
pub const AMOUNT_SCALE: u32 = 2;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A decimal quantity (a price, a tariff or a weight).
///
/// Amounts are serialized as strings (`"1000.00"`) so that clients never see binary floating point artefacts, but
/// can be deserialized from either a JSON string or a JSON number. In SQLite they are stored as TEXT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds half away from zero to [`AMOUNT_SCALE`] decimal places. The result always carries exactly two decimal
    /// places, so `4500` becomes `4500.00`.
    pub fn rounded(&self) -> Self {
        let mut value = self.0.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(AMOUNT_SCALE);
        Self(value)
    }

    /// `None` if the sum cannot be represented.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` if the product cannot be represented.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Self)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map(Self)
            .map_err(|e| AmountConversionError(format!("{s}: {e}")))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    sqlx (SQLite)    ---------------------------------------------------------
impl Type<Sqlite> for Amount {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty) ||
            <f64 as Type<Sqlite>>::compatible(ty) ||
            <i64 as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Amount {
    fn encode_by_ref(&self, buf: &mut <Sqlite as HasArguments<'q>>::ArgumentBuffer) -> IsNull {
        <String as Encode<'q, Sqlite>>::encode(self.0.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Amount {
    fn decode(value: <Sqlite as HasValueRef<'r>>::ValueRef) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<'r, Sqlite>>::decode(value)?;
        let amount = Amount::from_str(s)?;
        Ok(amount)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rounding_is_half_up_with_two_places() {
        let a = Amount::from_str("10.005").unwrap();
        assert_eq!(a.rounded().to_string(), "10.01");
        let a = Amount::from_str("10.004").unwrap();
        assert_eq!(a.rounded().to_string(), "10.00");
        let a = Amount::from(4500);
        assert_eq!(a.rounded().to_string(), "4500.00");
        let a = Amount::from_str("-2.345").unwrap();
        assert_eq!(a.rounded().to_string(), "-2.35");
    }

    #[test]
    fn multiplication() {
        let weight = Amount::from_str("2.5").unwrap();
        let price = Amount::from(500);
        assert_eq!(weight.checked_mul(price).unwrap().rounded().to_string(), "1250.00");
        let weight = Amount::from_str("0.333").unwrap();
        let price = Amount::from_str("4512.5").unwrap();
        assert_eq!(weight.checked_mul(price).unwrap().rounded().to_string(), "1502.66");
    }

    #[test]
    fn overflow_is_reported() {
        let huge = Amount::from_str("70000000000000000000000000000").unwrap();
        assert!(huge.checked_mul(Amount::from(500)).is_none());
        assert!(huge.checked_add(huge).is_none());
        assert_eq!(Amount::from(2).checked_add(Amount::from(3)), Some(Amount::from(5)));
    }

    #[test]
    fn serde_accepts_strings_and_numbers() {
        let a: Amount = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(a, Amount::from_str("12.5").unwrap());
        let a: Amount = serde_json::from_str("450").unwrap();
        assert_eq!(a, Amount::from(450));
        let s = serde_json::to_string(&Amount::from(1000).rounded()).unwrap();
        assert_eq!(s, "\"1000.00\"");
    }

    #[test]
    fn negative_and_parsing() {
        assert!(Amount::from(-1).is_negative());
        assert!(!Amount::zero().is_negative());
        assert!(Amount::from_str("abc").is_err());
    }
}
