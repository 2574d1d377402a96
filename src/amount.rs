//! Fixed-point currency amount with 2 decimal places.
//!
//! In memory an amount is a `rust_decimal::Decimal` held at scale 2. On disk
//! it is an integer count of minor units (100 minor units = 1.00).

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

/// Why a textual amount could not be turned into an [`Amount`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountParseError {
    /// Not a finite number at all
    #[error("not a number")]
    NotANumber,

    /// A valid number too large for decimal representation
    #[error("number out of representable range")]
    OutOfRange,
}

/// A currency amount that always carries exactly 2 decimal places.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use txn_batch::Amount;
///
/// let amount = Amount::from_str("4123.223").unwrap();
/// assert_eq!(amount.to_string(), "4123.22");
/// assert_eq!(amount.to_minor_units(), Some(412322));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Creates an amount, rounding to 2 decimal places (ties to even).
    ///
    /// Rounding works on the exact decimal value, so `2.675` becomes `2.68`.
    /// A binary-float `round` would give `2.67`; that result is deliberately
    /// not reproduced.
    pub fn new(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointNearestEven);
        rounded.rescale(Self::SCALE);
        Amount(rounded)
    }

    /// Interprets an integer count of minor units.
    pub fn from_minor_units(units: i64) -> Self {
        Amount(Decimal::new(units, Self::SCALE))
    }

    /// Returns the amount as an integer count of minor units, or `None` if it
    /// does not fit in an `i64`.
    pub fn to_minor_units(&self) -> Option<i64> {
        self.0.checked_mul(Decimal::ONE_HUNDRED)?.trunc().to_i64()
    }

    /// Returns `true` if this amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Renders the shortest decimal form, keeping at least one fractional
    /// digit (`"1234567890.1"`, `"20.0"`). Used when measuring an amount
    /// against its column.
    pub fn to_compact_string(&self) -> String {
        let normalized = self.0.normalize();
        if normalized.scale() == 0 {
            format!("{}.0", normalized)
        } else {
            normalized.to_string()
        }
    }

    /// Parses any finite numeric literal (integer, float or exponent form)
    /// and rounds it to 2 decimal places.
    pub fn parse_rounded(s: &str) -> std::result::Result<Self, AmountParseError> {
        let trimmed = s.trim();
        let float: f64 = trimmed
            .parse()
            .map_err(|_| AmountParseError::NotANumber)?;
        if !float.is_finite() {
            return Err(AmountParseError::NotANumber);
        }

        let decimal = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .ok()
            .or_else(|| Decimal::from_f64(float))
            .ok_or(AmountParseError::OutOfRange)?;
        Ok(Amount::new(decimal))
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Amount::parse_rounded(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount::new(self.0 + rhs.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}
