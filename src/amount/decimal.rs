// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exact base-10 fixed-point arithmetic.
//!
//! A [`ScaledValue`] is a signed 256-bit magnitude with an implicit decimal
//! point `scale` digits from the right. Every unit conversion and every fee
//! computation in this crate goes through it; floating point is never used
//! for money.
//!
//! Values are kept normalized (no trailing fractional zeros, zero is never
//! negative) so structural equality is numeric equality. Operations that
//! cannot be represented exactly fail instead of rounding, with the single
//! exception of [`ScaledValue::div_truncated`], which truncates toward zero at
//! a scale the caller names.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest supported scale. `10^77` is the biggest power of ten below `2^256`.
pub const MAX_SCALE: u32 = 77;

/// Errors produced by decimal parsing and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("Invalid decimal numeral: {0:?}")]
    Parse(String),

    #[error("Decimal overflow during {0}")]
    Overflow(&'static str),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("{dividend} / {divisor} has no exact decimal representation")]
    Inexact { dividend: String, divisor: String },
}

/// Immutable signed fixed-point decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaledValue {
    negative: bool,
    magnitude: U256,
    scale: u32,
}

/// `10^exp` for `exp <= MAX_SCALE`.
fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

fn checked_pow10(exp: u32) -> Result<U256, DecimalError> {
    if exp > MAX_SCALE {
        return Err(DecimalError::Overflow("power of ten"));
    }
    Ok(pow10(exp))
}

impl ScaledValue {
    pub const ZERO: Self = Self {
        negative: false,
        magnitude: U256::ZERO,
        scale: 0,
    };

    /// Build a normalized value, rejecting scales beyond [`MAX_SCALE`].
    fn build(negative: bool, magnitude: U256, scale: u32) -> Result<Self, DecimalError> {
        let ten = U256::from(10u64);
        let mut magnitude = magnitude;
        let mut scale = scale;
        while scale > 0 && !magnitude.is_zero() && (magnitude % ten).is_zero() {
            magnitude /= ten;
            scale -= 1;
        }
        if magnitude.is_zero() {
            return Ok(Self::ZERO);
        }
        if scale > MAX_SCALE {
            return Err(DecimalError::Overflow("rescale"));
        }
        Ok(Self {
            negative,
            magnitude,
            scale,
        })
    }

    /// A non-negative integer value.
    pub fn from_integer(value: U256) -> Self {
        Self {
            negative: false,
            magnitude: value,
            scale: 0,
        }
    }

    /// `magnitude / 10^scale`, e.g. `from_parts(1234, 2)` is `12.34`.
    pub fn from_parts(magnitude: U256, scale: u32) -> Result<Self, DecimalError> {
        Self::build(false, magnitude, scale)
    }

    /// Parse a plain base-10 numeral: optional sign, digits, optional
    /// fractional part. Exponents, whitespace and separators are rejected.
    pub fn parse(input: &str) -> Result<Self, DecimalError> {
        let invalid = || DecimalError::Parse(input.to_string());

        let (negative, body) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            _ => (false, input),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        // Padding zeros carry no value and must not count against the range.
        let int_part = int_part.trim_start_matches('0');
        let frac_part = frac_part.trim_end_matches('0');
        if int_part.is_empty() && frac_part.is_empty() {
            return Ok(Self::ZERO);
        }

        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let digits = format!("{int_part}{frac_part}");
        let magnitude = U256::from_str_radix(&digits, 10)
            .map_err(|_| DecimalError::Overflow("parse"))?;

        Self::build(negative, magnitude, scale)
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Number of fractional digits in the normalized form.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_integer(&self) -> bool {
        self.scale == 0
    }

    pub fn negated(&self) -> Self {
        Self {
            negative: !self.negative && !self.is_zero(),
            ..*self
        }
    }

    /// The value as an unsigned integer, if it is a non-negative integer.
    pub fn to_u256(&self) -> Option<U256> {
        (self.is_integer() && !self.negative).then_some(self.magnitude)
    }

    /// The value as a `u64`, if it is a non-negative integer that fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_u256().and_then(|v| u64::try_from(v).ok())
    }

    /// Drop the fractional part, rounding toward zero.
    pub fn trunc(&self) -> Self {
        let magnitude = self.magnitude / pow10(self.scale);
        Self::build(self.negative, magnitude, 0).unwrap_or(Self::ZERO)
    }

    /// Both magnitudes brought to the larger of the two scales.
    fn aligned(&self, other: &Self) -> Result<(U256, U256, u32), DecimalError> {
        let scale = self.scale.max(other.scale);
        let lhs = self
            .magnitude
            .checked_mul(checked_pow10(scale - self.scale)?)
            .ok_or(DecimalError::Overflow("alignment"))?;
        let rhs = other
            .magnitude
            .checked_mul(checked_pow10(scale - other.scale)?)
            .ok_or(DecimalError::Overflow("alignment"))?;
        Ok((lhs, rhs, scale))
    }

    pub fn checked_add(&self, rhs: &Self) -> Result<Self, DecimalError> {
        let (lhs_mag, rhs_mag, scale) = self.aligned(rhs)?;
        let (negative, magnitude) = if self.negative == rhs.negative {
            let sum = lhs_mag
                .checked_add(rhs_mag)
                .ok_or(DecimalError::Overflow("addition"))?;
            (self.negative, sum)
        } else if lhs_mag >= rhs_mag {
            (self.negative, lhs_mag - rhs_mag)
        } else {
            (rhs.negative, rhs_mag - lhs_mag)
        };
        Self::build(negative, magnitude, scale)
    }

    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, DecimalError> {
        self.checked_add(&rhs.negated())
    }

    pub fn checked_mul(&self, rhs: &Self) -> Result<Self, DecimalError> {
        let magnitude = self
            .magnitude
            .checked_mul(rhs.magnitude)
            .ok_or(DecimalError::Overflow("multiplication"))?;
        let scale = self
            .scale
            .checked_add(rhs.scale)
            .ok_or(DecimalError::Overflow("multiplication"))?;
        Self::build(self.negative != rhs.negative, magnitude, scale)
    }

    /// Quotient with `scale` fractional digits, truncated toward zero.
    pub fn div_truncated(&self, rhs: &Self, scale: u32) -> Result<Self, DecimalError> {
        let (quotient, _) = self.div_rem_at(rhs, scale)?;
        Self::build(self.negative != rhs.negative, quotient, scale)
    }

    /// Exact quotient. Fails with [`DecimalError::Inexact`] when the result
    /// has no terminating decimal expansion within [`MAX_SCALE`] digits.
    pub fn div_exact(&self, rhs: &Self) -> Result<Self, DecimalError> {
        for scale in 0..=MAX_SCALE {
            match self.div_rem_at(rhs, scale) {
                Ok((quotient, remainder)) if remainder.is_zero() => {
                    return Self::build(self.negative != rhs.negative, quotient, scale);
                }
                Ok(_) => continue,
                Err(DecimalError::Overflow(_)) => break,
                Err(e) => return Err(e),
            }
        }
        Err(DecimalError::Inexact {
            dividend: self.to_string(),
            divisor: rhs.to_string(),
        })
    }

    /// Integer quotient and remainder of the magnitudes for a result at `scale`.
    fn div_rem_at(&self, rhs: &Self, scale: u32) -> Result<(U256, U256), DecimalError> {
        if rhs.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        // result = (a / 10^sa) / (b / 10^sb) * 10^scale
        let shift = i64::from(scale) + i64::from(rhs.scale) - i64::from(self.scale);
        let exp = u32::try_from(shift.unsigned_abs())
            .map_err(|_| DecimalError::Overflow("division"))?;
        let factor = checked_pow10(exp)?;
        let (numerator, denominator) = if shift >= 0 {
            let numerator = self
                .magnitude
                .checked_mul(factor)
                .ok_or(DecimalError::Overflow("division"))?;
            (numerator, rhs.magnitude)
        } else {
            let denominator = rhs
                .magnitude
                .checked_mul(factor)
                .ok_or(DecimalError::Overflow("division"))?;
            (self.magnitude, denominator)
        };
        Ok((numerator / denominator, numerator % denominator))
    }

    /// `self^exponent`.
    pub fn pow(&self, exponent: u32) -> Result<Self, DecimalError> {
        let magnitude = self
            .magnitude
            .checked_pow(U256::from(exponent))
            .ok_or(DecimalError::Overflow("exponentiation"))?;
        let scale = self
            .scale
            .checked_mul(exponent)
            .ok_or(DecimalError::Overflow("exponentiation"))?;
        Self::build(self.negative && exponent % 2 == 1, magnitude, scale)
    }

    /// `10^exponent` as an integer value.
    pub fn ten_pow(exponent: u32) -> Result<Self, DecimalError> {
        Ok(Self::from_integer(checked_pow10(exponent)?))
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        let self_unit = pow10(self.scale);
        let other_unit = pow10(other.scale);
        let int_order = (self.magnitude / self_unit).cmp(&(other.magnitude / other_unit));
        int_order.then_with(|| {
            // Fractional parts are < 10^scale <= 10^MAX_SCALE, so lifting them
            // to the common scale cannot overflow.
            let scale = self.scale.max(other.scale);
            let lhs = (self.magnitude % self_unit) * pow10(scale - self.scale);
            let rhs = (other.magnitude % other_unit) * pow10(scale - other.scale);
            lhs.cmp(&rhs)
        })
    }
}

impl Ord for ScaledValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for ScaledValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for ScaledValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u64> for ScaledValue {
    fn from(value: u64) -> Self {
        Self::from_integer(U256::from(value))
    }
}

impl From<U256> for ScaledValue {
    fn from(value: U256) -> Self {
        Self::from_integer(value)
    }
}

impl FromStr for ScaledValue {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ScaledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.magnitude.to_string();
        let scale = self.scale as usize;

        if self.negative {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{int_part}.{frac_part}")
        } else {
            write!(f, "0.{:0>width$}", digits, width = scale)
        }
    }
}

impl Serialize for ScaledValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScaledValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
