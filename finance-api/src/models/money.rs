//! Fixed-point money arithmetic.
//!
//! Floating point has no place in a ledger, so monetary values are stored as
//! scaled integers: [`Amount`] carries two decimal places (minor currency
//! units) and [`Rate`] carries six. Every operation that loses precision
//! rounds half away from zero ("HALF_UP"), which is the convention used by the
//! central bank rates and by accounting systems consuming this ledger.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};
use thiserror::Error;

const AMOUNT_SCALE: u32 = 2;
const RATE_SCALE: u32 = 6;
const RATE_UNIT: i128 = 1_000_000;

/// Integer division rounding half away from zero.
fn div_half_up(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if 2 * remainder.abs() >= denominator.abs() {
        if (numerator < 0) == (denominator < 0) {
            quotient + 1
        } else {
            quotient - 1
        }
    } else {
        quotient
    }
}

/// The ways a decimal string may fail to parse as a fixed-point value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDecimalError {
    /// Nothing but whitespace (or a lone sign) was supplied
    #[error("empty decimal value")]
    Empty,
    /// A character other than a digit, sign or single decimal point was found
    #[error("invalid decimal value")]
    Invalid,
    /// More fractional digits were supplied than the type can hold
    #[error("at most {0} fractional digits are allowed")]
    TooPrecise(u32),
    /// The value does not fit in the underlying integer
    #[error("decimal value out of range")]
    OutOfRange,
}

/// Parse `s` into an integer scaled by `10^scale`. Excess fractional digits
/// are either rounded (HALF_UP) or rejected.
fn parse_scaled(s: &str, scale: u32, round: bool) -> Result<i64, ParseDecimalError> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
        None => return Err(ParseDecimalError::Empty),
    };

    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(ParseDecimalError::Empty);
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(ParseDecimalError::Invalid);
    }
    // Anything longer cannot fit in an i64 once scaled
    if whole.len() > 18 {
        return Err(ParseDecimalError::OutOfRange);
    }

    let scale = scale as usize;
    let (kept, round_up) = if fraction.len() > scale {
        if !round {
            return Err(ParseDecimalError::TooPrecise(scale as u32));
        }
        (&fraction[..scale], fraction.as_bytes()[scale] >= b'5')
    } else {
        (fraction, false)
    };

    let mut value: i128 = 0;
    for b in whole.bytes().chain(kept.bytes()) {
        value = value * 10 + i128::from(b - b'0');
    }
    for _ in kept.len()..scale {
        value *= 10;
    }
    if round_up {
        value += 1;
    }
    if negative {
        value = -value;
    }

    i64::try_from(value).map_err(|_| ParseDecimalError::OutOfRange)
}

fn fmt_scaled(value: i64, scale: u32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let unit = 10u64.pow(scale);
    let magnitude = value.unsigned_abs();
    let sign = if value < 0 { "-" } else { "" };
    write!(
        f,
        "{sign}{}.{:0width$}",
        magnitude / unit,
        magnitude % unit,
        width = scale as usize
    )
}

/// A monetary amount with two decimal places.
///
/// Amounts are signed: ledger rows use the sign to distinguish money owed from
/// money received, while stored invoice and payment totals are non-negative.
///
/// ```
/// # use finance_api::models::Amount;
/// let amount: Amount = "1500.5".parse().unwrap();
/// assert_eq!(amount.to_string(), "1500.50");
/// assert_eq!(amount.minor_units(), 150_050);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct Amount(i64);

impl Amount {
    /// Zero in any currency
    pub const ZERO: Self = Self(0);
    /// The smallest positive amount, 0.01
    pub const CENT: Self = Self(1);
    /// The largest amount accepted on input: ten integer digits
    pub const MAX: Self = Self(999_999_999_999);

    /// Construct an amount from a count of minor units (e.g. kopecks or cents)
    pub const fn from_minor_units(minor: i64) -> Self {
        Self(minor)
    }

    /// Construct an amount from a whole number of major units
    pub const fn whole(major: i64) -> Self {
        Self(major * 100)
    }

    /// The count of minor units
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Whether the amount is exactly zero
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether the amount is strictly greater than zero
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// The absolute value of the amount
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Whether the magnitude fits within [`Amount::MAX`]
    pub const fn within_limit(self) -> bool {
        self.0.unsigned_abs() <= Self::MAX.0 as u64
    }

    /// Multiply by an exchange rate, rounding the result to two decimal places.
    ///
    /// Returns `None` if the result does not fit.
    pub fn convert(self, rate: Rate) -> Option<Self> {
        let scaled = div_half_up(i128::from(self.0) * i128::from(rate.0), RATE_UNIT);
        i64::try_from(scaled).ok().map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_scaled(self.0, AMOUNT_SCALE, f)
    }
}

impl FromStr for Amount {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, AMOUNT_SCALE, false).map(Self)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Amount {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// An exchange rate (or a dimensionless factor) with six decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct Rate(i64);

impl Rate {
    /// The identity rate
    pub const ONE: Self = Self(1_000_000);
    /// A zero factor, e.g. "no markup"
    pub const ZERO: Self = Self(0);

    /// Construct a rate from millionths
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// The rate in millionths
    pub const fn micros(self) -> i64 {
        self.0
    }

    /// Whether the rate is strictly greater than zero
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `1 / self` at six decimal places, or `None` for a zero rate.
    pub fn inverse(self) -> Option<Self> {
        Self::ONE.cross(self)
    }

    /// `self / other` at six decimal places, or `None` if `other` is zero.
    ///
    /// Given two rates quoted against a common base currency, this is the rate
    /// from the first currency to the second.
    pub fn cross(self, other: Self) -> Option<Self> {
        if other.0 == 0 {
            return None;
        }
        let value = div_half_up(i128::from(self.0) * RATE_UNIT, i128::from(other.0));
        i64::try_from(value).ok().map(Self)
    }

    /// Divide a quote for `nominal` units down to a single unit.
    pub fn per_unit(self, nominal: u32) -> Option<Self> {
        if nominal == 0 {
            return None;
        }
        Some(Self(
            div_half_up(i128::from(self.0), i128::from(nominal)) as i64,
        ))
    }

    /// `self × (1 + markup)` at six decimal places.
    pub fn with_markup(self, markup: Self) -> Self {
        let value = div_half_up(
            i128::from(self.0) * (RATE_UNIT + i128::from(markup.0)),
            RATE_UNIT,
        );
        Self(value as i64)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_scaled(self.0, RATE_SCALE, f)
    }
}

impl FromStr for Rate {
    type Err = ParseDecimalError;

    /// Parse a decimal string. Digits beyond the sixth decimal place are rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, RATE_SCALE, true).map(Self)
    }
}

// Both types travel as decimal strings so no consumer ever round-trips them
// through a float, but numbers are accepted on input for convenience.

#[cfg(feature = "serde")]
macro_rules! decimal_serde {
    ($struct:ident) => {
        impl serde::Serialize for $struct {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $struct {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                serde_untagged::UntaggedEnumVisitor::new()
                    .string(|s| s.parse().map_err(serde::de::Error::custom))
                    .i64(|n| n.to_string().parse().map_err(serde::de::Error::custom))
                    .u64(|n| n.to_string().parse().map_err(serde::de::Error::custom))
                    .f64(|n| n.to_string().parse().map_err(serde::de::Error::custom))
                    .deserialize(deserializer)
            }
        }
    };
}

#[cfg(feature = "serde")]
decimal_serde!(Amount);
#[cfg(feature = "serde")]
decimal_serde!(Rate);

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for Amount {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Amount".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "pattern": "^-?[0-9]+(\\.[0-9]{1,2})?$",
            "examples": ["1500.00"],
        })
    }
}

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for Rate {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Rate".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "pattern": "^-?[0-9]+(\\.[0-9]{1,6})?$",
            "examples": ["90.123456"],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", 0)]
    #[case("12", 1200)]
    #[case("12.3", 1230)]
    #[case("-0.01", -1)]
    #[case("+7.05", 705)]
    #[case(".5", 50)]
    fn parses_amounts(#[case] input: &str, #[case] minor: i64) {
        assert_eq!(input.parse::<Amount>(), Ok(Amount::from_minor_units(minor)));
    }

    #[rstest]
    #[case("", ParseDecimalError::Empty)]
    #[case("-", ParseDecimalError::Empty)]
    #[case("1.2.3", ParseDecimalError::Invalid)]
    #[case("1,5", ParseDecimalError::Invalid)]
    #[case("1.005", ParseDecimalError::TooPrecise(2))]
    #[case("99999999999999999999", ParseDecimalError::OutOfRange)]
    fn rejects_bad_amounts(#[case] input: &str, #[case] err: ParseDecimalError) {
        assert_eq!(input.parse::<Amount>(), Err(err));
    }

    #[rstest]
    #[case(0, "0.00")]
    #[case(5, "0.05")]
    #[case(-5, "-0.05")]
    #[case(150_050, "1500.50")]
    fn displays_amounts(#[case] minor: i64, #[case] expected: &str) {
        assert_eq!(Amount::from_minor_units(minor).to_string(), expected);
    }

    #[rstest]
    #[case("1.0000005", 1_000_001)]
    #[case("1.0000004", 1_000_000)]
    #[case("-1.0000005", -1_000_001)]
    #[case("90.4890", 90_489_000)]
    fn rates_round_half_up(#[case] input: &str, #[case] micros: i64) {
        assert_eq!(input.parse::<Rate>(), Ok(Rate::from_micros(micros)));
    }

    #[rstest]
    #[case("100", "0.010000")]
    #[case("110", "0.009091")]
    #[case("0.06", "16.666667")]
    fn inverts_rates(#[case] rate: &str, #[case] expected: &str) {
        let rate: Rate = rate.parse().unwrap();
        assert_eq!(rate.inverse().unwrap().to_string(), expected);
    }

    #[test]
    fn cross_rates_divide_against_the_base() {
        let usd: Rate = "100".parse().unwrap();
        let eur: Rate = "110".parse().unwrap();
        assert_eq!(usd.cross(eur).unwrap().to_string(), "0.909091");
        assert_eq!(usd.cross(Rate::ZERO), None);
    }

    #[rstest]
    #[case("100.00", "0.909091", "90.91")]
    #[case("0.01", "0.5", "0.01")]
    #[case("0.01", "0.4", "0.00")]
    #[case("-0.01", "0.5", "-0.01")]
    #[case("1000.00", "16.666667", "16666.67")]
    fn converts_amounts(#[case] amount: &str, #[case] rate: &str, #[case] expected: &str) {
        let amount: Amount = amount.parse().unwrap();
        let rate: Rate = rate.parse().unwrap();
        assert_eq!(amount.convert(rate).unwrap().to_string(), expected);
    }

    #[test]
    fn oversized_conversions_are_refused() {
        let huge: Amount = "92233720368547758.07".parse().unwrap();
        assert_eq!(huge.convert("90".parse().unwrap()), None);
        assert!(!huge.within_limit());

        let largest: Amount = "9999999999.99".parse().unwrap();
        assert_eq!(largest, Amount::MAX);
        assert!(largest.within_limit());
        assert!((-largest).within_limit());
        assert!(!(largest + Amount::CENT).within_limit());
        assert_eq!(
            largest.convert("125.5".parse().unwrap()),
            Some("1254999999998.75".parse().unwrap())
        );
    }

    #[test]
    fn nominal_quotes_divide_down() {
        // e.g. 10 CNY quoted as 123.4567 RUB
        let quote: Rate = "123.4567".parse().unwrap();
        assert_eq!(quote.per_unit(10).unwrap().to_string(), "12.345670");
        assert_eq!(quote.per_unit(0), None);
    }

    #[test]
    fn markups_scale_the_official_rate() {
        let official: Rate = "90".parse().unwrap();
        let markup: Rate = "0.02".parse().unwrap();
        assert_eq!(official.with_markup(markup).to_string(), "91.800000");
        assert_eq!(official.with_markup(Rate::ZERO), official);
    }

    #[test]
    fn amounts_serialize_as_strings_and_accept_numbers() {
        let amount: Amount = serde_json::from_str("100.5").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"100.50\"");
        let amount: Amount = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(amount, Amount::whole(7));
        assert!(serde_json::from_str::<Amount>("\"1.001\"").is_err());
    }
}
