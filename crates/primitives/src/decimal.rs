//! Fixed-point decimal with 18 places of precision.
//!
//! Fee values and the fee-update multiplier are all carried as [`Dec`]. Results of
//! multiplication and division are rounded half-to-even at the 18th decimal place,
//! so the order in which operations are applied is part of the observable behavior.
use alloy_primitives::U256;
use core::{
    cmp::Ordering,
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
    str::FromStr,
};

/// Number of decimal places carried by [`Dec`].
pub const DEC_PRECISION: u32 = 18;

/// Raw units in `1.0`.
const ONE_RAW: i128 = 10i128.pow(DEC_PRECISION);

/// Raw units in `0.5`, used as the rounding midpoint.
const HALF_RAW: u128 = ONE_RAW as u128 / 2;

/// Scale applied to a dividend before division, so the quotient keeps 18 places plus a
/// rounding digit range.
const SQUARED_PRECISION: u128 = 10u128.pow(2 * DEC_PRECISION);

/// Signed fixed-point decimal.
///
/// Stored as an integer count of `10^-18` units. The type is `Copy`, so a value read
/// out of a fee state can never alias the state itself.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(i128);

impl Dec {
    /// `0.0`
    pub const ZERO: Dec = Dec(0);
    /// `1.0`
    pub const ONE: Dec = Dec(ONE_RAW);

    /// Creates a decimal from raw `10^-18` units.
    #[inline]
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Returns the raw `10^-18` units.
    #[inline]
    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Creates a decimal from a whole number. Every `i64` fits.
    #[inline]
    pub const fn from_int(value: i64) -> Self {
        Self(value as i128 * ONE_RAW)
    }

    /// Creates a decimal from an unsigned whole number. Every `u64` fits.
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        Self(value as i128 * ONE_RAW)
    }

    /// Creates a decimal from a wide whole number, returning `None` if it does not fit.
    #[inline]
    pub const fn checked_from_int(value: i128) -> Option<Self> {
        match value.checked_mul(ONE_RAW) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Returns `true` if the value is exactly zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the value is below zero.
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    #[inline]
    pub const fn checked_add(self, rhs: Dec) -> Option<Dec> {
        match self.0.checked_add(rhs.0) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[inline]
    pub const fn checked_sub(self, rhs: Dec) -> Option<Dec> {
        match self.0.checked_sub(rhs.0) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Checked multiplication.
    ///
    /// The raw product is computed exactly in 256 bits, then chopped back to 18 places
    /// with round-half-to-even.
    pub fn checked_mul(self, rhs: Dec) -> Option<Dec> {
        let product = U256::from(self.0.unsigned_abs()) * U256::from(rhs.0.unsigned_abs());
        let negative = self.is_negative() != rhs.is_negative();
        Self::from_magnitude(chop_precision_and_round(product), negative)
    }

    /// Checked division. Returns `None` on division by zero or overflow.
    ///
    /// The dividend is scaled by `10^36`, truncated by the divisor, then chopped back to
    /// 18 places with round-half-to-even.
    pub fn checked_quo(self, rhs: Dec) -> Option<Dec> {
        if rhs.is_zero() {
            return None;
        }
        let scaled = U256::from(self.0.unsigned_abs()) * U256::from(SQUARED_PRECISION);
        let quotient = scaled / U256::from(rhs.0.unsigned_abs());
        let negative = self.is_negative() != rhs.is_negative();
        Self::from_magnitude(chop_precision_and_round(quotient), negative)
    }

    fn from_magnitude(magnitude: U256, negative: bool) -> Option<Dec> {
        let limbs = magnitude.as_limbs();
        if limbs[2] != 0 || limbs[3] != 0 {
            return None;
        }
        let magnitude = u128::from(limbs[0]) | (u128::from(limbs[1]) << 64);
        let raw = i128::try_from(magnitude).ok()?;
        Some(Self(if negative { -raw } else { raw }))
    }
}

/// Drops 18 decimal places from `value`, rounding half to even.
fn chop_precision_and_round(value: U256) -> U256 {
    let precision = U256::from(ONE_RAW as u128);
    let quo = value / precision;
    let rem = value % precision;
    if rem.is_zero() {
        return quo;
    }
    let round_up = match rem.cmp(&U256::from(HALF_RAW)) {
        Ordering::Less => false,
        Ordering::Greater => true,
        Ordering::Equal => quo.as_limbs()[0] & 1 == 1,
    };
    if round_up {
        quo + U256::from(1u64)
    } else {
        quo
    }
}

impl From<i64> for Dec {
    #[inline]
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl From<u64> for Dec {
    #[inline]
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Add for Dec {
    type Output = Dec;

    fn add(self, rhs: Dec) -> Dec {
        match self.checked_add(rhs) {
            Some(sum) => sum,
            None => panic!("decimal addition overflow: {self} + {rhs}"),
        }
    }
}

impl Sub for Dec {
    type Output = Dec;

    fn sub(self, rhs: Dec) -> Dec {
        match self.checked_sub(rhs) {
            Some(diff) => diff,
            None => panic!("decimal subtraction overflow: {self} - {rhs}"),
        }
    }
}

impl Mul for Dec {
    type Output = Dec;

    fn mul(self, rhs: Dec) -> Dec {
        match self.checked_mul(rhs) {
            Some(product) => product,
            None => panic!("decimal multiplication overflow: {self} * {rhs}"),
        }
    }
}

impl Div for Dec {
    type Output = Dec;

    fn div(self, rhs: Dec) -> Dec {
        match self.checked_quo(rhs) {
            Some(quotient) => quotient,
            None => panic!("invalid decimal division: {self} / {rhs}"),
        }
    }
}

impl Neg for Dec {
    type Output = Dec;

    fn neg(self) -> Dec {
        Self(-self.0)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let one = ONE_RAW as u128;
        if self.is_negative() {
            f.write_str("-")?;
        }
        write!(
            f,
            "{}.{:0width$}",
            abs / one,
            abs % one,
            width = DEC_PRECISION as usize
        )
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

/// Error returned when parsing a [`Dec`] from a string fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseDecError {
    /// The input had no digits.
    #[error("empty decimal string")]
    Empty,
    /// The input contained something other than an optional sign, digits and one dot.
    #[error("invalid character in decimal string")]
    InvalidDigit,
    /// More than 18 fractional digits.
    #[error("decimal string has more than 18 fractional digits")]
    TooPrecise,
    /// The value does not fit.
    #[error("decimal string out of range")]
    Overflow,
}

impl FromStr for Dec {
    type Err = ParseDecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() {
            return Err(ParseDecError::Empty);
        }
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) if !int_part.is_empty() && !frac_part.is_empty() => {
                (int_part, frac_part)
            }
            Some(_) => return Err(ParseDecError::InvalidDigit),
            None => (digits, ""),
        };
        if frac_part.len() > DEC_PRECISION as usize {
            return Err(ParseDecError::TooPrecise);
        }

        let whole = parse_digits(int_part)?
            .checked_mul(ONE_RAW)
            .ok_or(ParseDecError::Overflow)?;
        // "5" in the first fractional place is 5 * 10^17 raw units.
        let frac_scale = 10i128.pow(DEC_PRECISION - frac_part.len() as u32);
        let frac = parse_digits(frac_part)? * frac_scale;
        let raw = whole.checked_add(frac).ok_or(ParseDecError::Overflow)?;

        Ok(Self(if negative { -raw } else { raw }))
    }
}

fn parse_digits(digits: &str) -> Result<i128, ParseDecError> {
    digits.bytes().try_fold(0i128, |acc, byte| {
        if !byte.is_ascii_digit() {
            return Err(ParseDecError::InvalidDigit);
        }
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(i128::from(byte - b'0')))
            .ok_or(ParseDecError::Overflow)
    })
}

#[cfg(feature = "serde")]
impl serde::Serialize for Dec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Dec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecVisitor;

        impl serde::de::Visitor<'_> for DecVisitor {
            type Value = Dec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Dec, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(DecVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    #[rstest]
    #[case::integer("10", 10 * ONE_RAW)]
    #[case::fraction("0.0025", 2_500_000_000_000_000)]
    #[case::full_precision("0.000000000000000001", 1)]
    #[case::negative("-1.5", -1_500_000_000_000_000_000)]
    #[case::leading_zeros("007.50", 7_500_000_000_000_000_000)]
    fn parse_valid(#[case] input: &str, #[case] raw: i128) {
        assert_eq!(dec(input).raw(), raw);
    }

    #[rstest]
    #[case::empty("", ParseDecError::Empty)]
    #[case::sign_only("-", ParseDecError::Empty)]
    #[case::trailing_dot("1.", ParseDecError::InvalidDigit)]
    #[case::leading_dot(".5", ParseDecError::InvalidDigit)]
    #[case::letters("1a", ParseDecError::InvalidDigit)]
    #[case::two_dots("1.2.3", ParseDecError::InvalidDigit)]
    #[case::too_precise("0.0000000000000000001", ParseDecError::TooPrecise)]
    #[case::overflow("1000000000000000000000000", ParseDecError::Overflow)]
    fn parse_invalid(#[case] input: &str, #[case] err: ParseDecError) {
        assert_eq!(input.parse::<Dec>(), Err(err));
    }

    #[test]
    fn display_keeps_full_precision() {
        assert_eq!(dec("0.0265625").to_string(), "0.026562500000000000");
        assert_eq!(dec("-2").to_string(), "-2.000000000000000000");
        assert_eq!(Dec::ZERO.to_string(), "0.000000000000000000");
    }

    #[test]
    fn display_parses_back() {
        let value = dec("1234.000000000000000987");
        assert_eq!(value.to_string().parse::<Dec>(), Ok(value));
    }

    #[test]
    fn mul_and_quo_exact() {
        assert_eq!(dec("0.025") * dec("1.0625"), dec("0.0265625"));
        assert_eq!(Dec::from_int(500_000) / Dec::from_int(1_000_000), dec("0.5"));
        assert_eq!(Dec::from_int(-500_000) / Dec::from_int(1_000_000), dec("-0.5"));
        assert_eq!(dec("-0.5") * dec("0.125"), dec("-0.0625"));
    }

    #[rstest]
    // 0.000000000000000001 * 0.5 = 0.5e-18, tie rounds to even 0
    #[case::tie_to_even_down("0.000000000000000001", "0.5", "0")]
    // 0.000000000000000003 * 0.5 = 1.5e-18, tie rounds to even 2e-18
    #[case::tie_to_even_up("0.000000000000000003", "0.5", "0.000000000000000002")]
    // 0.000000000000000001 * 0.6 = 0.6e-18, rounds up
    #[case::above_half("0.000000000000000001", "0.6", "0.000000000000000001")]
    #[case::negative_tie("-0.000000000000000003", "0.5", "-0.000000000000000002")]
    fn mul_rounds_half_even(#[case] lhs: &str, #[case] rhs: &str, #[case] expected: &str) {
        assert_eq!(dec(lhs) * dec(rhs), dec(expected));
    }

    #[test]
    fn quo_rounds() {
        // 1 / 3 = 0.333...333|3 -> rounds down
        assert_eq!(Dec::ONE / Dec::from_int(3), dec("0.333333333333333333"));
        // 2 / 3 = 0.666...666|6 -> rounds up
        assert_eq!(Dec::from_int(2) / Dec::from_int(3), dec("0.666666666666666667"));
    }

    #[test]
    fn checked_ops_detect_failure() {
        assert_eq!(Dec::ONE.checked_quo(Dec::ZERO), None);
        let huge = Dec::from_raw(i128::MAX);
        assert_eq!(huge.checked_add(Dec::from_raw(1)), None);
        assert_eq!(huge.checked_mul(Dec::from_int(2)), None);
        assert_eq!(Dec::checked_from_int(i128::MAX), None);
        assert_eq!(
            Dec::checked_from_int(-70_000_000),
            Some(Dec::from_int(-70_000_000))
        );
    }

    #[test]
    fn ordering_and_clamp() {
        let min = dec("0.0025");
        let max = dec("10");
        assert!(dec("0.001") < min);
        assert_eq!(dec("0.001").clamp(min, max), min);
        assert_eq!(dec("11").clamp(min, max), max);
        assert_eq!(dec("-3").clamp(min, max), min);
    }

    #[test]
    fn u64_max_fits() {
        let value = Dec::from_u64(u64::MAX);
        assert_eq!(value.raw(), i128::from(u64::MAX) * ONE_RAW);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&dec("0.006")).unwrap();
        assert_eq!(json, "\"0.006000000000000000\"");
        let back: Dec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dec("0.006"));
        assert!(serde_json::from_str::<Dec>("\"abc\"").is_err());
    }
}
