//! Exact arithmetic over JSON numbers.
//!
//! JSON numbers are kept as their decimal source text (via `serde_json`'s
//! `arbitrary_precision` representation) and compared through
//! `fraction::BigFraction`, so `multipleOf: 0.1` against `1.1` holds and
//! `1e400`-style literals participate in bound checks without binary-float
//! drift. Machine-word comparisons are used whenever both operands fit.
use fraction::{BigFraction, BigUint};
use num_cmp::NumCmp;
use serde_json::Number;
use std::cmp::Ordering;

// JSON exponents are unbounded; expansion beyond this many decimal digits is
// clamped, which keeps ordering intact for any realistic operand.
const MAX_EXPONENT: i64 = 65_536;

/// Whether the number has a zero fractional part (`1.0` is an integer).
pub(crate) fn is_integer(number: &Number) -> bool {
    if number.as_i64().is_some() || number.as_u64().is_some() {
        return true;
    }
    matches!(to_fraction(number).denom(), Some(denom) if *denom == BigUint::from(1_u8))
}

/// Exact numeric equality: `1 == 1.0`, `12e2 == 1200`.
pub(crate) fn equals(left: &Number, right: &Number) -> bool {
    compare(left, right) == Ordering::Equal
}

/// Total order over JSON numbers.
pub(crate) fn compare(left: &Number, right: &Number) -> Ordering {
    match (integral(left), integral(right)) {
        (Some(lhs), Some(rhs)) => lhs.compare(rhs),
        _ => to_fraction(left)
            .partial_cmp(&to_fraction(right))
            .expect("JSON numbers are never NaN"),
    }
}

/// Whether `number` is an integral multiple of `multiple_of`.
pub(crate) fn is_multiple_of(number: &Number, multiple_of: &Number) -> bool {
    if let (Some(Integral::Unsigned(n)), Some(Integral::Unsigned(m))) =
        (integral(number), integral(multiple_of))
    {
        return m != 0 && n % m == 0;
    }
    let divisor = to_fraction(multiple_of);
    if divisor == BigFraction::new(BigUint::from(0_u8), BigUint::from(1_u8)) {
        return false;
    }
    let quotient = to_fraction(number) / divisor;
    matches!(quotient.denom(), Some(denom) if *denom == BigUint::from(1_u8))
}

#[derive(Clone, Copy)]
enum Integral {
    Signed(i64),
    Unsigned(u64),
}

impl Integral {
    fn compare(self, other: Integral) -> Ordering {
        match (self, other) {
            (Integral::Signed(lhs), Integral::Signed(rhs)) => lhs.cmp(&rhs),
            (Integral::Unsigned(lhs), Integral::Unsigned(rhs)) => lhs.cmp(&rhs),
            (Integral::Signed(lhs), Integral::Unsigned(rhs)) => {
                NumCmp::num_cmp(lhs, rhs).expect("integers are comparable")
            }
            (Integral::Unsigned(lhs), Integral::Signed(rhs)) => {
                NumCmp::num_cmp(lhs, rhs).expect("integers are comparable")
            }
        }
    }
}

fn integral(number: &Number) -> Option<Integral> {
    if let Some(value) = number.as_u64() {
        Some(Integral::Unsigned(value))
    } else {
        number.as_i64().map(Integral::Signed)
    }
}

fn to_fraction(number: &Number) -> BigFraction {
    parse_decimal(&number.to_string()).expect("serde_json numbers are valid JSON numbers")
}

fn parse_decimal(literal: &str) -> Option<BigFraction> {
    let (negative, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => {
            let exponent = unsigned[idx + 1..].parse::<i64>().unwrap_or_else(|_| {
                // Overflowing exponents keep only their sign
                if unsigned[idx + 1..].starts_with('-') {
                    i64::MIN
                } else {
                    i64::MAX
                }
            });
            (&unsigned[..idx], exponent)
        }
        None => (unsigned, 0_i64),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let mut digits = String::with_capacity(int_part.len() + frac_part.len());
    digits.push_str(int_part);
    digits.push_str(frac_part);
    let mantissa = digits.parse::<BigUint>().ok()?;
    let scale = exponent
        .saturating_sub(frac_part.len() as i64)
        .clamp(-MAX_EXPONENT, MAX_EXPONENT);
    let ten = BigUint::from(10_u8);
    let fraction = if scale >= 0 {
        BigFraction::new(mantissa * ten.pow(scale as u32), BigUint::from(1_u8))
    } else {
        BigFraction::new(mantissa, ten.pow((-scale) as u32))
    };
    Some(if negative { -fraction } else { fraction })
}
