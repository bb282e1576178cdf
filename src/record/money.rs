//! Money value type
//!
//! Exact fixed-point decimal with four fractional digits, backed by an
//! `i128` so it occupies exactly 16 bytes in the binary row format.
//! No floating point anywhere: parsing and formatting work on digits.

use std::fmt;
use std::str::FromStr;

/// Number of fractional decimal digits carried by [`Money`]
const SCALE: u32 = 4;

/// Scaling factor: one whole currency unit in raw ticks
const UNIT: i128 = 10_i128.pow(SCALE);

/// Exact fixed-point money amount
///
/// Stored as raw ticks of 1/10_000 of a currency unit. Construct via
/// [`Money::from_raw`], [`Money::from_major`], or string parsing
/// (`"123.45".parse::<Money>()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Money(i128);

impl Money {
    /// Zero amount
    pub const ZERO: Money = Money(0);

    /// Build from raw ticks (1/10_000 units)
    pub const fn from_raw(raw: i128) -> Self {
        Money(raw)
    }

    /// Build from whole currency units
    pub const fn from_major(units: i64) -> Self {
        Money(units as i128 * UNIT)
    }

    /// Raw tick count (1/10_000 units)
    pub const fn raw(self) -> i128 {
        self.0
    }

    /// True for amounts strictly below zero
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Money {
    /// Formats with at least two fractional digits: `100.00`, `0.125`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / UNIT as u128;
        let frac = (abs % UNIT as u128) as u32;

        // Render all four fractional digits, then trim down to two
        let mut digits = format!("{:04}", frac);
        while digits.len() > 2 && digits.ends_with('0') {
            digits.pop();
        }

        write!(f, "{}{}.{}", sign, whole, digits)
    }
}

/// Parse error for [`Money`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoneyError(pub String);

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid money amount: {}", self.0)
    }
}

impl std::error::Error for ParseMoneyError {}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Accepts `123`, `123.45`, `-0.5`; at most four fractional digits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoneyError(s.to_string());

        let (sign, body) = match s.strip_prefix('-') {
            Some(rest) => (-1_i128, rest),
            None => (1_i128, s),
        };

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        if whole.is_empty() || frac.len() > SCALE as usize {
            return Err(err());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let whole: i128 = whole.parse().map_err(|_| err())?;

        // Right-pad the fractional part to SCALE digits: "45" → 4500
        let mut frac_ticks: i128 = 0;
        if !frac.is_empty() {
            let parsed: i128 = frac.parse().map_err(|_| err())?;
            frac_ticks = parsed * 10_i128.pow(SCALE - frac.len() as u32);
        }

        let raw = whole
            .checked_mul(UNIT)
            .and_then(|w| w.checked_add(frac_ticks))
            .and_then(|v| v.checked_mul(sign))
            .ok_or_else(err)?;

        Ok(Money(raw))
    }
}
