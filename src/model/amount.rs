//! Amount type for handling monetary values as they arrive from the ledger API.
//!
//! The API is supposed to send amounts as JSON numbers, but amounts typed into a form sometimes
//! arrive as strings such as `"30"` or `"1,250.00 ₺"`. Deserialization therefore coerces whatever it
//! is given into a `Decimal`, and anything that is not a number counts as zero so that a single bad
//! record cannot corrupt the totals.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;
use tracing::warn;

/// The currency symbol shown next to amounts. Only one currency is supported.
pub const CURRENCY_SYMBOL: &str = "₺";

/// Represents a monetary amount.
///
/// # Examples
///
/// Parsing a value typed by a user:
/// ```
/// # use esnaf_kasa::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1,250.50 ₺").unwrap();
/// assert_eq!(amount.to_string(), "1,250.50");
/// ```
///
/// Coercing a malformed value from the API:
/// ```
/// # use esnaf_kasa::model::Amount;
/// let amount: Amount = serde_json::from_str("\"forty\"").unwrap();
/// assert!(amount.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Converts any JSON value into an amount. Numbers are taken as they are, strings are parsed
    /// leniently, and everything else (or anything unparsable) becomes zero.
    pub fn coerce(value: &Value) -> Self {
        let coerced = match value {
            Value::Number(n) => decimal_from_number(n),
            Value::String(s) => Amount::from_str(s).ok().map(|a| a.value()),
            _ => None,
        };
        match coerced {
            Some(d) => Amount(d),
            None => {
                warn!("Treating the non-numeric amount {value} as zero");
                Amount::ZERO
            }
        }
    }

    /// Formats the amount with its sign and the currency symbol, e.g. `+1,250.00 ₺`.
    pub fn signed(&self, negative: bool) -> String {
        let sign = if negative { "-" } else { "+" };
        format!("{sign}{} {CURRENCY_SYMBOL}", Amount(self.0.abs()))
    }

    /// Formats the amount with the currency symbol, e.g. `1,250.00 ₺`.
    pub fn with_symbol(&self) -> String {
        format!("{self} {CURRENCY_SYMBOL}")
    }
}

fn decimal_from_number(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let s = n.to_string();
    Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()
        .or_else(|| n.as_f64().and_then(Decimal::from_f64))
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(String);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let without_symbol = trimmed
            .strip_suffix(CURRENCY_SYMBOL)
            .or_else(|| trimmed.strip_prefix(CURRENCY_SYMBOL))
            .unwrap_or(trimmed)
            .trim();

        if without_symbol.is_empty() {
            return Err(AmountError(format!("'{s}' is not an amount")));
        }

        // Remove commas (thousand separators)
        let without_commas = without_symbol.replace(',', "");

        Decimal::from_str(&without_commas)
            .or_else(|_| Decimal::from_scientific(&without_commas))
            .map(Amount)
            .map_err(|e| AmountError(format!("'{s}' is not an amount: {e}")))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.0.abs().round_dp(2);
        write!(
            f,
            "{sign}{}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // The API expects a JSON number.
        if self.0.fract().is_zero() {
            if let Some(i) = self.0.to_i64() {
                return serializer.serialize_i64(i);
            }
        }
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Amount::coerce(&value))
    }
}

/// Saturates at `Decimal::MAX` or `Decimal::MIN` instead of overflowing.
impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Amount(sum),
            None => {
                warn!("The sum of {} and {} is out of range, capping it", self.0, rhs.0);
                Amount(self.0.saturating_add(rhs.0))
            }
        }
    }
}

/// Saturates at `Decimal::MAX` or `Decimal::MIN` instead of overflowing.
impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        match self.0.checked_sub(rhs.0) {
            Some(difference) => Amount(difference),
            None => {
                warn!("The difference of {} and {} is out of range, capping it", self.0, rhs.0);
                Amount(self.0.saturating_sub(rhs.0))
            }
        }
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Decimal::from(value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
