//! Fixed-point arithmetic types for precise on-chain and USD-denominated math.
//!
//! All three types here are scaled integers under the hood. Nothing in this
//! crate or `sandwich-amm` ever stores a swap amount, reserve, or profit
//! figure as `f64` — the only floating-point conversions are explicit,
//! one-directional, and confined to display/logging call sites.

use crate::errors::FixedPointError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A raw on-chain token amount (wei, lamports, or any other base unit).
///
/// Deliberately unitless beyond "smallest denomination of some token" — the
/// decimals needed to render it as a human quantity live on [`crate::TokenMeta`],
/// not on the amount itself, so the same type works across 18-decimal WETH
/// and 6-decimal USDC without a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeAmount(pub i128);

impl NativeAmount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(i128::MAX);

    #[inline(always)]
    pub const fn new(raw: i128) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> i128 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i128) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// `self * numerator / denominator`, rounding toward zero, without
    /// overflowing through an i128 intermediate the way a naive
    /// `self * numerator` would for large reserve values.
    pub fn mul_div(self, numerator: i128, denominator: i128) -> Result<Self, FixedPointError> {
        if denominator == 0 {
            return Err(FixedPointError::DivisionByZero);
        }
        let product = self
            .0
            .checked_mul(numerator)
            .ok_or_else(|| FixedPointError::Overflow {
                value: format!("{} * {}", self.0, numerator),
            })?;
        Ok(Self(product / denominator))
    }

    /// Render as a human decimal string given the token's decimal places.
    /// Display/logging only — never parse this back for arithmetic.
    pub fn to_decimal_string(self, decimals: u8) -> String {
        let scale = 10i128.pow(decimals as u32);
        let whole = self.0 / scale;
        let frac = (self.0 % scale).unsigned_abs();
        format!("{whole}.{frac:0width$}", width = decimals as usize)
    }
}

impl Add for NativeAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for NativeAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Basis points (1 bps = 0.01%), stored as `u32` so `Bps(10_000)` is exactly 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bps(pub u32);

impl Bps {
    pub const ZERO: Self = Self(0);
    pub const ONE_PERCENT: Self = Self(100);
    pub const ONE_HUNDRED_PERCENT: Self = Self(10_000);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Validated constructor for values that must not exceed 100%.
    pub fn checked(value: u32) -> Result<Self, FixedPointError> {
        if value > 10_000 {
            return Err(FixedPointError::BpsOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Apply `self` as a fraction to a native amount: `amount * self / 10_000`.
    pub fn apply(self, amount: NativeAmount) -> NativeAmount {
        amount
            .mul_div(self.0 as i128, 10_000)
            .unwrap_or(NativeAmount::ZERO)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

/// Fixed-point USD value with 8 decimal places, the same representation the
/// rest of the workspace uses for dollar-denominated figures.
///
/// - `$1.00`         = `UsdFixedPoint8(100_000_000)`
/// - `$0.01`         = `UsdFixedPoint8(1_000_000)`
/// - `$1000.12345678` = `UsdFixedPoint8(100_012_345_678)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsdFixedPoint8(pub i64);

impl UsdFixedPoint8 {
    pub const SCALE: i64 = 100_000_000;
    pub const ZERO: Self = Self(0);
    pub const ONE_CENT: Self = Self(1_000_000);
    pub const ONE_DOLLAR: Self = Self(100_000_000);

    /// Primary constructor for parsing config, JSON, or relay responses.
    pub fn from_decimal_str(s: &str) -> Result<Self, FixedPointError> {
        let decimal = Decimal::from_str(s).map_err(|_| FixedPointError::InvalidDecimal {
            input: s.to_string(),
        })?;
        let scaled = decimal * Decimal::from(Self::SCALE);
        scaled
            .to_i64()
            .map(Self)
            .ok_or_else(|| FixedPointError::Overflow {
                value: decimal.to_string(),
            })
    }

    /// Boundary conversion from the AMM simulator, which works in `Decimal`
    /// internally. Never call this on a value that hasn't already cleared
    /// overflow checks upstream.
    pub fn from_decimal(decimal: Decimal) -> Result<Self, FixedPointError> {
        let scaled = decimal * Decimal::from(Self::SCALE);
        scaled
            .to_i64()
            .map(Self)
            .ok_or_else(|| FixedPointError::Overflow {
                value: decimal.to_string(),
            })
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(Self::SCALE)
    }

    pub fn raw_value(self) -> i64 {
        self.0
    }

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents * 1_000_000)
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * Self::SCALE)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl Add for UsdFixedPoint8 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for UsdFixedPoint8 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for UsdFixedPoint8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_amount_mul_div_rounds_toward_zero() {
        let amount = NativeAmount::new(1_000_000_000_000_000_000); // 1 WETH
        let out = amount.mul_div(9_970, 10_000).unwrap(); // 0.3% fee taken
        assert_eq!(out.raw(), 997_000_000_000_000_000);
    }

    #[test]
    fn bps_apply_matches_manual_division() {
        let amount = NativeAmount::new(1_000_000);
        let thirty_bps = Bps::new(30);
        assert_eq!(thirty_bps.apply(amount).raw(), 3_000);
    }

    #[test]
    fn bps_checked_rejects_over_100_percent() {
        assert!(Bps::checked(10_001).is_err());
        assert!(Bps::checked(10_000).is_ok());
    }

    #[test]
    fn usd_fixed_point_roundtrips_through_decimal_string() {
        let price = UsdFixedPoint8::from_decimal_str("123.456789").unwrap();
        assert_eq!(price.raw_value(), 12_345_678_900);
    }

    #[test]
    fn native_amount_decimal_string_pads_fraction() {
        let amount = NativeAmount::new(1_500_000); // 1.5 with 6 decimals (USDC)
        assert_eq!(amount.to_decimal_string(6), "1.500000");
    }
}
