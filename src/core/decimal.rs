use crate::core::errors::ExchangeError;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Fraction digits kept by [`Precise::div`] when no precision is given
pub const DEFAULT_DIVISION_PRECISION: u32 = 18;

/// Largest decimal exponent accepted, in either direction
pub const MAX_EXPONENT: i64 = 10_000;

/// Arbitrary-precision decimal: `integer * 10^-decimals`.
///
/// All arithmetic runs on big integers so amounts beyond 2^53 or with many
/// significant digits never pass through a binary float.
#[derive(Debug, Clone)]
pub struct Precise {
    integer: BigInt,
    decimals: u32,
}

fn ten_pow(exp: u32) -> BigInt {
    BigInt::from(10u8).pow(exp)
}

fn invalid(value: &str) -> ExchangeError {
    ExchangeError::InvalidArgument(format!("invalid decimal string: {:?}", value))
}

impl Precise {
    pub fn zero() -> Self {
        Self {
            integer: BigInt::zero(),
            decimals: 0,
        }
    }

    /// Build from an unscaled integer and a possibly negative number of decimals
    fn from_parts(integer: BigInt, decimals: i64) -> Result<Self, ExchangeError> {
        if !(-MAX_EXPONENT..=MAX_EXPONENT).contains(&decimals) {
            return Err(ExchangeError::InvalidArgument(format!(
                "decimal exponent {} is out of range",
                decimals
            )));
        }
        let magnitude = u32::try_from(decimals.unsigned_abs()).map_err(|_| {
            ExchangeError::InvalidArgument(format!("decimal exponent {} is out of range", decimals))
        })?;
        Ok(if decimals < 0 {
            Self {
                integer: integer * ten_pow(magnitude),
                decimals: 0,
            }
        } else {
            Self {
                integer,
                decimals: magnitude,
            }
        })
    }

    /// Parse a decimal literal such as `"-12.50"`, `".5"` or `"1e-8"`
    pub fn parse(input: &str) -> Result<Self, ExchangeError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(invalid(input));
        }

        let (mantissa, exponent) = match s.find(['e', 'E']) {
            Some(idx) => {
                let exponent = s[idx + 1..]
                    .parse::<i64>()
                    .map_err(|_| invalid(input))?;
                (&s[..idx], exponent)
            }
            None => (s, 0),
        };

        let (negative, unsigned) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(invalid(input));
        }

        let mut integer =
            BigInt::from_str(&format!("{}{}", int_part, frac_part)).map_err(|_| invalid(input))?;
        if negative {
            integer = -integer;
        }

        let decimals = i64::try_from(frac_part.len())
            .ok()
            .and_then(|len| len.checked_sub(exponent))
            .ok_or_else(|| invalid(input))?;
        Self::from_parts(integer, decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.integer.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.integer.is_negative()
    }

    /// Number of fraction digits after dropping trailing zeros
    pub fn scale(&self) -> u32 {
        self.reduced().decimals
    }

    /// Strip trailing zeros from the fraction
    pub fn reduce(&mut self) {
        if self.integer.is_zero() {
            self.decimals = 0;
            return;
        }
        let ten = BigInt::from(10u8);
        while self.decimals > 0 && (&self.integer % &ten).is_zero() {
            self.integer /= &ten;
            self.decimals -= 1;
        }
    }

    pub fn reduced(&self) -> Self {
        let mut out = self.clone();
        out.reduce();
        out
    }

    fn aligned(&self, other: &Self) -> (BigInt, BigInt, u32) {
        let decimals = self.decimals.max(other.decimals);
        let a = &self.integer * ten_pow(decimals - self.decimals);
        let b = &other.integer * ten_pow(decimals - other.decimals);
        (a, b, decimals)
    }

    pub fn add(&self, other: &Self) -> Self {
        let (a, b, decimals) = self.aligned(other);
        Self {
            integer: a + b,
            decimals,
        }
        .reduced()
    }

    pub fn sub(&self, other: &Self) -> Self {
        let (a, b, decimals) = self.aligned(other);
        Self {
            integer: a - b,
            decimals,
        }
        .reduced()
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self {
            integer: &self.integer * &other.integer,
            decimals: self.decimals + other.decimals,
        }
        .reduced()
    }

    /// Truncating division keeping at most `precision` fraction digits
    pub fn div(&self, other: &Self, precision: u32) -> Result<Self, ExchangeError> {
        if other.integer.is_zero() {
            return Err(ExchangeError::InvalidArgument(
                "division by zero".to_string(),
            ));
        }
        let distance =
            i64::from(precision) - i64::from(self.decimals) + i64::from(other.decimals);
        let numerator = if distance >= 0 {
            &self.integer * ten_pow(distance as u32)
        } else {
            &self.integer / ten_pow(distance.unsigned_abs() as u32)
        };
        Ok(Self {
            integer: numerator / &other.integer,
            decimals: precision,
        }
        .reduced())
    }

    pub fn neg(&self) -> Self {
        Self {
            integer: -&self.integer,
            decimals: self.decimals,
        }
        .reduced()
    }

    pub fn abs(&self) -> Self {
        Self {
            integer: self.integer.abs(),
            decimals: self.decimals,
        }
        .reduced()
    }

    /// Move the decimal point `scale` places to the left (right when negative)
    pub fn shift_left(&self, scale: i64) -> Result<Self, ExchangeError> {
        let decimals = i64::from(self.decimals)
            .checked_add(scale)
            .ok_or_else(|| ExchangeError::InvalidArgument(format!("shift by {} overflows", scale)))?;
        Ok(Self::from_parts(self.integer.clone(), decimals)?.reduced())
    }

    /// Drop the fraction, rounding toward zero
    pub fn truncate(&self) -> Self {
        Self {
            integer: &self.integer / ten_pow(self.decimals),
            decimals: 0,
        }
    }

    pub fn to_decimal(&self) -> Result<Decimal, ExchangeError> {
        let text = self.to_string();
        Decimal::from_str(&text).map_err(|e| {
            ExchangeError::InvalidArgument(format!("{} does not fit a decimal: {}", text, e))
        })
    }
}

impl fmt::Display for Precise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reduced = self.reduced();
        let sign = if reduced.integer.is_negative() { "-" } else { "" };
        let digits = reduced.integer.abs().to_string();
        let decimals = reduced.decimals as usize;
        if decimals == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl FromStr for Precise {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Precise {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Precise {}

impl PartialOrd for Precise {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Precise {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }
}

fn binary(
    a: Option<&str>,
    b: Option<&str>,
    op: impl FnOnce(Precise, Precise) -> Result<Precise, ExchangeError>,
) -> Result<Option<String>, ExchangeError> {
    match (a, b) {
        (Some(a), Some(b)) => Ok(Some(op(Precise::parse(a)?, Precise::parse(b)?)?.to_string())),
        _ => Ok(None),
    }
}

fn unary(
    a: Option<&str>,
    op: impl FnOnce(Precise) -> Precise,
) -> Result<Option<String>, ExchangeError> {
    a.map(|a| Precise::parse(a).map(|p| op(p).to_string()))
        .transpose()
}

pub fn string_add(a: Option<&str>, b: Option<&str>) -> Result<Option<String>, ExchangeError> {
    binary(a, b, |a, b| Ok(a.add(&b)))
}

pub fn string_sub(a: Option<&str>, b: Option<&str>) -> Result<Option<String>, ExchangeError> {
    binary(a, b, |a, b| Ok(a.sub(&b)))
}

pub fn string_mul(a: Option<&str>, b: Option<&str>) -> Result<Option<String>, ExchangeError> {
    binary(a, b, |a, b| Ok(a.mul(&b)))
}

pub fn string_div(a: Option<&str>, b: Option<&str>) -> Result<Option<String>, ExchangeError> {
    binary(a, b, |a, b| a.div(&b, DEFAULT_DIVISION_PRECISION))
}

pub fn string_neg(a: Option<&str>) -> Result<Option<String>, ExchangeError> {
    unary(a, |a| a.neg())
}

pub fn string_abs(a: Option<&str>) -> Result<Option<String>, ExchangeError> {
    unary(a, |a| a.abs())
}

fn parse_integer_literal(value: &str) -> Result<BigInt, ExchangeError> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExchangeError::InvalidArgument(format!(
            "not an integer literal: {:?}",
            value
        )));
    }
    BigInt::from_str(value).map_err(|_| invalid(value))
}

/// Interpret `value` as a scaled integer and shift the decimal point left by `scale`.
///
/// `scale_down(Some("4022800"), 2)` is `"40228"`, `scale_down(Some("5"), 3)` is `"0.005"`.
/// A negative scale shifts right. Anything but `-?[0-9]+` is rejected.
pub fn scale_down(value: Option<&str>, scale: i32) -> Result<Option<String>, ExchangeError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let integer = parse_integer_literal(value)?;
    Ok(Some(
        Precise::from_parts(integer, i64::from(scale))?.to_string(),
    ))
}

/// Inverse of [`scale_down`]: shift right by `scale` and truncate toward zero
pub fn scale_up(value: Option<&str>, scale: i32) -> Result<Option<String>, ExchangeError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let precise = Precise::parse(value)?;
    let shifted = precise.shift_left(-i64::from(scale))?;
    Ok(Some(shifted.truncate().to_string()))
}

/// Count of significant fraction digits, e.g. `"0.0100"` has 2
pub fn precision_from_string(value: &str) -> Result<u32, ExchangeError> {
    Ok(Precise::parse(value)?.scale())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Precise {
        Precise::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_normalized_display() {
        assert_eq!(p("1.2300").to_string(), "1.23");
        assert_eq!(p("-0.000").to_string(), "0");
        assert_eq!(p(".5").to_string(), "0.5");
        assert_eq!(p("1e-8").to_string(), "0.00000001");
        assert_eq!(p("1.5E3").to_string(), "1500");
        assert_eq!(p("+7").to_string(), "7");
        assert_eq!(p("100").to_string(), "100");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "   ", "-", ".", "1.2.3", "abc", "1e", "0x10", "1,5"] {
            assert!(Precise::parse(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(p("0.1").add(&p("0.2")).to_string(), "0.3");
        assert_eq!(p("1").sub(&p("1.0001")).to_string(), "-0.0001");
        assert_eq!(p("0.001").mul(&p("0.01")).to_string(), "0.00001");
        assert_eq!(p("-2.5").mul(&p("4")).to_string(), "-10");
        assert_eq!(p("1").div(&p("3"), 18).unwrap().to_string(), "0.333333333333333333");
        assert_eq!(p("-1").div(&p("3"), 2).unwrap().to_string(), "-0.33");
        assert_eq!(p("10").div(&p("0.5"), 18).unwrap().to_string(), "20");
        assert!(p("1").div(&p("0.000"), 18).is_err());
        assert_eq!(p("-3.10").abs().to_string(), "3.1");
        assert_eq!(p("3.10").neg().to_string(), "-3.1");
        assert_eq!(p("0").neg().to_string(), "0");
    }

    #[test]
    fn test_beyond_float_precision() {
        let big = p("123456789012345678901234567890.123456789");
        let doubled = big.add(&big);
        assert_eq!(doubled.to_string(), "246913578024691357802469135780.246913578");
        assert_eq!(
            p("9007199254740993").add(&p("1")).to_string(),
            "9007199254740994"
        );
    }

    #[test]
    fn test_ordering_ignores_trailing_zeros() {
        assert_eq!(p("1.50"), p("1.5"));
        assert!(p("-1") < p("0.0001"));
        assert!(p("2") > p("1.999999999999999999999"));
    }

    #[test]
    fn test_string_helpers_propagate_none() {
        assert_eq!(string_mul(Some("0.01"), Some("0.001")).unwrap().as_deref(), Some("0.00001"));
        assert_eq!(string_sub(Some("10"), None).unwrap(), None);
        assert_eq!(string_neg(None).unwrap(), None);
        assert_eq!(string_neg(Some("-0.015805")).unwrap().as_deref(), Some("0.015805"));
        assert!(string_add(Some("x"), Some("1")).is_err());
    }

    #[test]
    fn test_scale_down_edge_cases() {
        assert_eq!(scale_down(None, 2).unwrap(), None);
        assert!(scale_down(Some(""), 2).is_err());
        assert!(scale_down(Some("1.5"), 2).is_err());
        assert!(scale_down(Some("12a"), 2).is_err());
        assert_eq!(scale_down(Some("4022800"), 2).unwrap().as_deref(), Some("40228"));
        assert_eq!(scale_down(Some("5"), 3).unwrap().as_deref(), Some("0.005"));
        assert_eq!(scale_down(Some("-5"), 3).unwrap().as_deref(), Some("-0.005"));
        assert_eq!(scale_down(Some("5"), -3).unwrap().as_deref(), Some("5000"));
        assert_eq!(scale_down(Some("0"), 6).unwrap().as_deref(), Some("0"));
        assert_eq!(scale_down(Some("123"), 0).unwrap().as_deref(), Some("123"));
    }

    #[test]
    fn test_scale_up_truncates() {
        assert_eq!(scale_up(None, 2).unwrap(), None);
        assert!(scale_up(Some(""), 2).is_err());
        assert_eq!(scale_up(Some("1.239"), 2).unwrap().as_deref(), Some("123"));
        assert_eq!(scale_up(Some("-1.239"), 2).unwrap().as_deref(), Some("-123"));
        assert_eq!(scale_up(Some("0.005"), 3).unwrap().as_deref(), Some("5"));
        assert_eq!(scale_up(Some("5000"), -3).unwrap().as_deref(), Some("5"));
        assert_eq!(scale_up(Some("0.0001"), 2).unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn test_exponent_out_of_range_is_rejected() {
        // would wrap to 1 and 0.1 if narrowed to u32
        assert!(Precise::parse("1e4294967296").is_err());
        assert!(Precise::parse("1e-4294967297").is_err());
        assert!(Precise::parse("1e999999999").is_err());
        assert!(Precise::parse("1e-999999999").is_err());
        assert!(Precise::parse("1e9223372036854775807").is_err());
        assert!(Precise::parse("1e-9223372036854775808").is_err());
        assert_eq!(p("1e10000").to_string().len(), 10_001);
        assert_eq!(p("2e-30").to_string(), "0.000000000000000000000000000002");
    }

    #[test]
    fn test_extreme_scales_are_errors_not_panics() {
        for scale in [i32::MIN, i32::MAX, -20_000, 20_000] {
            assert!(scale_up(Some("1"), scale).is_err(), "scale_up by {}", scale);
            assert!(scale_down(Some("1"), scale).is_err(), "scale_down by {}", scale);
        }
        assert!(p("1").shift_left(i64::MAX).is_err());
        assert!(p("1.5").shift_left(i64::MIN).is_err());
        assert_eq!(p("1.5").shift_left(-1).unwrap().to_string(), "15");
    }

    #[test]
    fn test_precision_from_string() {
        assert_eq!(precision_from_string("0.0100").unwrap(), 2);
        assert_eq!(precision_from_string("15").unwrap(), 0);
        assert_eq!(precision_from_string("1e-8").unwrap(), 8);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(p("40228.5").to_decimal().unwrap(), Decimal::new(402_285, 1));
    }
}
