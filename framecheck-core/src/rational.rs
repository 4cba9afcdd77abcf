//! Rational number type for frame rates and pixel aspect ratios.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An unsigned ratio such as a frame rate (`30000:1001`) or a pixel aspect
/// ratio (`1:1`).
///
/// A zero numerator or denominator marks the value as unknown, as raw video
/// headers do; use [`Rational::is_unknown`] before doing arithmetic with it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rational {
    /// Numerator
    pub num: u32,
    /// Denominator
    pub den: u32,
}

impl Rational {
    /// Create a new ratio.
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// The unknown ratio `0:0`.
    pub const fn unknown() -> Self {
        Self { num: 0, den: 0 }
    }

    /// A ratio representing one.
    pub const fn one() -> Self {
        Self { num: 1, den: 1 }
    }

    /// Check whether either term is zero.
    pub fn is_unknown(&self) -> bool {
        self.num == 0 || self.den == 0
    }

    /// This ratio, or `fallback` when it is unknown.
    pub fn or(self, fallback: Rational) -> Self {
        if self.is_unknown() {
            fallback
        } else {
            self
        }
    }

    /// Reduce the ratio to its simplest form.
    pub fn reduce(&self) -> Self {
        if self.is_unknown() {
            return *self;
        }
        let g = gcd(self.num, self.den);
        Self {
            num: self.num / g,
            den: self.den / g,
        }
    }

    /// Convert to f64. Unknown ratios convert to NaN.
    pub fn to_f64(&self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        self.num as f64 / self.den as f64
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({}:{})", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.den)
    }
}

impl FromStr for Rational {
    type Err = Error;

    /// Parse the `num:den` notation.
    fn from_str(s: &str) -> Result<Self> {
        let (num, den) = s
            .split_once(':')
            .ok_or_else(|| Error::invalid_param(format!("expected num:den, got {s:?}")))?;
        let num = num
            .parse()
            .map_err(|_| Error::invalid_param(format!("invalid numerator in {s:?}")))?;
        let den = den
            .parse()
            .map_err(|_| Error::invalid_param(format!("invalid denominator in {s:?}")))?;
        Ok(Self::new(num, den))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.den == 0 || other.den == 0 {
            return None;
        }
        let lhs = self.num as u64 * other.den as u64;
        let rhs = other.num as u64 * self.den as u64;
        Some(lhs.cmp(&rhs))
    }
}

impl From<(u32, u32)> for Rational {
    fn from((num, den): (u32, u32)) -> Self {
        Self::new(num, den)
    }
}

/// Calculate the greatest common divisor using Euclidean algorithm.
fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}
