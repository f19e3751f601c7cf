//! Deterministic Fixed-Point Mathematics
//!
//! Bit-exact arithmetic that produces identical results on x86, ARM, WASM or
//! any other target. No IEEE 754 floating point takes part in simulation.
//!
//! # Types
//!
//! - [`FixFloat`]: signed Q47.16 scalar stored in an `i64`
//! - [`FixVec`]: 2D vector of [`FixFloat`] components
//! - [`Rotator`]: cached `(cos, sin)` pair for an angle
//!
//! # Rounding
//!
//! Products and quotients are widened to `i128`, rounded half away from zero
//! and saturated to the `i64` range. Sine and cosine come from a quarter-wave
//! lookup table (1024 samples per turn) with linear interpolation.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of fractional bits in a [`FixFloat`].
pub const FRACTION_BITS: u32 = 16;

const FRACTION_MASK: i64 = (1 << FRACTION_BITS) - 1;

// ============================================================================
// FixFloat (Q47.16)
// ============================================================================

/// Fixed-point scalar: `value = raw / 2^16`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FixFloat(i64);

impl FixFloat {
    /// 0.0
    pub const ZERO: Self = Self(0);
    /// 1.0
    pub const ONE: Self = Self(1 << FRACTION_BITS);
    /// 0.5
    pub const HALF: Self = Self(1 << (FRACTION_BITS - 1));
    /// -1.0
    pub const NEG_ONE: Self = Self(-(1 << FRACTION_BITS));
    /// Smallest positive value (one raw unit).
    pub const EPSILON: Self = Self(1);
    /// Largest representable value.
    pub const MAX: Self = Self(i64::MAX);
    /// Smallest representable value.
    pub const MIN: Self = Self(i64::MIN);
    /// π
    pub const PI: Self = Self(205_887);
    /// π / 2
    pub const HALF_PI: Self = Self(102_944);
    /// 2π
    pub const TWO_PI: Self = Self(411_775);

    /// Create from a raw Q47.16 value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw Q47.16 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Create from an integer.
    #[inline]
    #[must_use]
    pub const fn from_int(n: i64) -> Self {
        Self(n << FRACTION_BITS)
    }

    /// Create from `num / denom`, rounded. Returns zero for a zero denominator.
    #[must_use]
    pub fn from_ratio(num: i64, denom: i64) -> Self {
        Self::from_int(num) / Self::from_int(denom)
    }

    /// Create from f64 (initialization and tests only, not part of simulation).
    #[cfg(feature = "std")]
    #[must_use]
    pub fn from_f64(f: f64) -> Self {
        Self((f * (1i64 << FRACTION_BITS) as f64).round() as i64)
    }

    /// Convert to f64 (debugging only).
    #[cfg(feature = "std")]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1i64 << FRACTION_BITS) as f64
    }

    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Absolute value (saturating at `MAX`).
    #[inline]
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// Clamp into `[lo, hi]`. `lo` wins when the range is inverted.
    #[inline]
    #[must_use]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.min(hi).max(lo)
    }

    /// Exact halving (arithmetic shift).
    #[inline]
    #[must_use]
    pub const fn half(self) -> Self {
        Self(self.0 >> 1)
    }

    /// `self * self`
    #[inline]
    #[must_use]
    pub fn sqr(self) -> Self {
        self * self
    }

    /// `1 / self`, zero when `self` is zero.
    #[inline]
    #[must_use]
    pub fn recip(self) -> Self {
        Self::ONE / self
    }

    /// Square root (floor of the exact root). Zero for non-positive input.
    ///
    /// Deterministic: integer square root on the widened value.
    #[must_use]
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        let widened = (self.0 as u128) << FRACTION_BITS;
        Self(isqrt_u128(widened) as i64)
    }

    /// Multiply by an integer (saturating).
    #[inline]
    #[must_use]
    pub const fn mul_int(self, n: i64) -> Self {
        Self(self.0.saturating_mul(n))
    }

    /// Divide by an integer, rounded. Zero for a zero divisor.
    #[inline]
    #[must_use]
    pub fn div_int(self, n: i64) -> Self {
        if n == 0 {
            return Self::ZERO;
        }
        Self(saturate(div_round(self.0 as i128, n as i128)))
    }
}

/// Shift right by `shift` bits, rounding half away from zero.
#[inline]
fn round_shift(value: i128, shift: u32) -> i128 {
    let half = 1i128 << (shift - 1);
    if value >= 0 {
        (value + half) >> shift
    } else {
        -((-value + half) >> shift)
    }
}

/// Integer division rounding half away from zero. `den` must be non-zero.
#[inline]
pub(crate) fn div_round(num: i128, den: i128) -> i128 {
    let n = num.unsigned_abs();
    let d = den.unsigned_abs();
    let q = ((n + d / 2) / d) as i128;
    if (num < 0) != (den < 0) {
        -q
    } else {
        q
    }
}

#[inline]
pub(crate) fn saturate(value: i128) -> i64 {
    if value > i64::MAX as i128 {
        i64::MAX
    } else if value < i64::MIN as i128 {
        i64::MIN
    } else {
        value as i64
    }
}

/// Floor of the square root, bit by bit.
fn isqrt_u128(n: u128) -> u128 {
    let mut rem = n;
    let mut root = 0u128;
    let mut bit = 1u128 << 126;
    while bit > n {
        bit >>= 2;
    }
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

impl Add for FixFloat {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for FixFloat {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul for FixFloat {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let product = self.0 as i128 * rhs.0 as i128;
        Self(saturate(round_shift(product, FRACTION_BITS)))
    }
}

impl Div for FixFloat {
    type Output = Self;

    /// Division by zero yields zero.
    #[inline]
    fn div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return Self::ZERO;
        }
        let num = (self.0 as i128) << FRACTION_BITS;
        Self(saturate(div_round(num, rhs.0 as i128)))
    }
}

impl Neg for FixFloat {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl AddAssign for FixFloat {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixFloat {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for FixFloat {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl PartialOrd for FixFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FixFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for FixFloat {
    /// Four decimal places, integer arithmetic only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let mut int = abs >> FRACTION_BITS;
        let mut frac = ((abs & FRACTION_MASK as u64) * 10_000 + (1 << (FRACTION_BITS - 1)))
            >> FRACTION_BITS;
        if frac >= 10_000 {
            int += 1;
            frac -= 10_000;
        }
        write!(f, "{sign}{int}.{frac:04}")
    }
}

// ============================================================================
// FixVec — 2D Vector
// ============================================================================

/// 2D vector with [`FixFloat`] components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixVec {
    pub x: FixFloat,
    pub y: FixFloat,
}

impl FixVec {
    /// (0, 0)
    pub const ZERO: Self = Self::new(FixFloat::ZERO, FixFloat::ZERO);
    /// (1, 0)
    pub const UNIT_X: Self = Self::new(FixFloat::ONE, FixFloat::ZERO);
    /// (0, 1)
    pub const UNIT_Y: Self = Self::new(FixFloat::ZERO, FixFloat::ONE);

    #[inline]
    #[must_use]
    pub const fn new(x: FixFloat, y: FixFloat) -> Self {
        Self { x, y }
    }

    /// Create from integer components.
    #[inline]
    #[must_use]
    pub const fn from_int(x: i64, y: i64) -> Self {
        Self::new(FixFloat::from_int(x), FixFloat::from_int(y))
    }

    /// Create from raw Q47.16 components.
    #[inline]
    #[must_use]
    pub const fn from_raw(x: i64, y: i64) -> Self {
        Self::new(FixFloat::from_raw(x), FixFloat::from_raw(y))
    }

    /// Create from f64 components (initialization and tests only).
    #[cfg(feature = "std")]
    #[must_use]
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(FixFloat::from_f64(x), FixFloat::from_f64(y))
    }

    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Dot product, rounded once.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> FixFloat {
        let sum = self.x.raw() as i128 * rhs.x.raw() as i128
            + self.y.raw() as i128 * rhs.y.raw() as i128;
        FixFloat::from_raw(saturate(round_shift(sum, FRACTION_BITS)))
    }

    /// 2D cross product `self.x * rhs.y - self.y * rhs.x`, rounded once.
    #[inline]
    #[must_use]
    pub fn cross(self, rhs: Self) -> FixFloat {
        let diff = self.x.raw() as i128 * rhs.y.raw() as i128
            - self.y.raw() as i128 * rhs.x.raw() as i128;
        FixFloat::from_raw(saturate(round_shift(diff, FRACTION_BITS)))
    }

    /// Exact cross product in `Q.32` (no rounding). Used by orientation
    /// tests where the sign must not be lost to rounding.
    #[inline]
    #[must_use]
    pub fn cross_raw(self, rhs: Self) -> i128 {
        self.x.raw() as i128 * rhs.y.raw() as i128 - self.y.raw() as i128 * rhs.x.raw() as i128
    }

    /// Cross product of a scalar (z-axis) with a vector: `(-s * v.y, s * v.x)`.
    ///
    /// For an angular velocity `w` and lever arm `r` this is the linear
    /// velocity of the point `r` relative to the center.
    #[inline]
    #[must_use]
    pub fn scalar_cross(s: FixFloat, v: Self) -> Self {
        Self::new(-(s * v.y), s * v.x)
    }

    #[inline]
    #[must_use]
    pub fn length_squared(self) -> FixFloat {
        self.dot(self)
    }

    #[inline]
    #[must_use]
    pub fn length(self) -> FixFloat {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, `ZERO` for a zero-length vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        self.normalize_or(Self::ZERO)
    }

    /// Unit vector in the same direction, `fallback` for a zero-length vector.
    #[must_use]
    pub fn normalize_or(self, fallback: Self) -> Self {
        let len = self.length();
        if len.is_zero() {
            fallback
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    #[inline]
    #[must_use]
    pub fn sqr_distance(self, other: Self) -> FixFloat {
        (self - other).length_squared()
    }

    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> FixFloat {
        (self - other).length()
    }

    /// Midpoint between two points.
    #[inline]
    #[must_use]
    pub fn middle(self, other: Self) -> Self {
        Self::new(
            FixFloat::from_raw(((self.x.raw() as i128 + other.x.raw() as i128) >> 1) as i64),
            FixFloat::from_raw(((self.y.raw() as i128 + other.y.raw() as i128) >> 1) as i64),
        )
    }

    /// Perpendicular (90° counter-clockwise): `(-y, x)`.
    #[inline]
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Right-hand perpendicular (90° clockwise): `(y, -x)`.
    #[inline]
    #[must_use]
    pub fn perpendicular_cw(self) -> Self {
        Self::new(self.y, -self.x)
    }

    #[inline]
    #[must_use]
    pub fn scale(self, s: FixFloat) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

impl Add for FixVec {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for FixVec {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<FixFloat> for FixVec {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: FixFloat) -> Self {
        self.scale(rhs)
    }
}

impl Div<FixFloat> for FixVec {
    type Output = Self;

    #[inline]
    fn div(self, rhs: FixFloat) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for FixVec {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl AddAssign for FixVec {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixVec {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

// ============================================================================
// Rotator — sine/cosine by lookup
// ============================================================================

/// Samples per quarter turn.
const QUARTER: usize = 256;
/// Samples per full turn.
const TURN: i128 = 4 * QUARTER as i128;
/// π/2 in Q56, used only to build the table.
const HALF_PI_Q56: i128 = 113_187_804_032_455_044;
/// 2π in Q32, used to map radians onto table positions.
const TWO_PI_Q32: i128 = 26_986_075_409;

/// `sin(i / QUARTER * π/2)` in Q16 for `i = 0..=QUARTER`.
static SINE_TABLE: [i64; QUARTER + 1] = build_sine_table();

/// Taylor series in Q56, rounded to Q16.
const fn build_sine_table() -> [i64; QUARTER + 1] {
    let mut table = [0i64; QUARTER + 1];
    let mut i = 0;
    while i <= QUARTER {
        let x = HALF_PI_Q56 * i as i128 / QUARTER as i128;
        let x2 = (x * x) >> 56;
        let mut term = x;
        let mut sum = x;
        let mut n: i128 = 1;
        while n < 12 {
            term = -(((term * x2) >> 56) / ((2 * n) * (2 * n + 1)));
            sum += term;
            n += 1;
        }
        table[i] = ((sum + (1 << 39)) >> 40) as i64;
        i += 1;
    }
    table
}

/// Sine sample at a table position in `0..TURN`.
#[inline]
fn sine_sample(index: usize) -> i64 {
    let index = index % (4 * QUARTER);
    let k = index % QUARTER;
    match index / QUARTER {
        0 => SINE_TABLE[k],
        1 => SINE_TABLE[QUARTER - k],
        2 => -SINE_TABLE[k],
        _ => -SINE_TABLE[QUARTER - k],
    }
}

/// Precomputed `(cos, sin)` pair for an angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotator {
    pub cos: FixFloat,
    pub sin: FixFloat,
}

impl Rotator {
    /// No rotation.
    pub const IDENTITY: Self = Self {
        cos: FixFloat::ONE,
        sin: FixFloat::ZERO,
    };

    /// Rotator for an angle in radians.
    #[must_use]
    pub fn from_angle(angle: FixFloat) -> Self {
        if angle.is_zero() {
            return Self::IDENTITY;
        }
        // table position in Q16
        let pos = (angle.raw() as i128 * TURN << 32) / TWO_PI_Q32;
        let pos = pos.rem_euclid(TURN << FRACTION_BITS);
        let index = (pos >> FRACTION_BITS) as usize;
        let frac = (pos as i64) & FRACTION_MASK;

        let lerp = |a: i64, b: i64| -> FixFloat {
            let delta = (b - a) as i128 * frac as i128;
            FixFloat::from_raw(a + round_shift(delta, FRACTION_BITS) as i64)
        };

        Self {
            sin: lerp(sine_sample(index), sine_sample(index + 1)),
            cos: lerp(sine_sample(index + QUARTER), sine_sample(index + QUARTER + 1)),
        }
    }

    /// Rotate a vector counter-clockwise by this rotation.
    #[inline]
    #[must_use]
    pub fn rotate(self, v: FixVec) -> FixVec {
        FixVec::new(
            FixVec::new(self.cos, -self.sin).dot(v),
            FixVec::new(self.sin, self.cos).dot(v),
        )
    }

    /// Rotate a vector by the inverse of this rotation.
    #[inline]
    #[must_use]
    pub fn inverse_rotate(self, v: FixVec) -> FixVec {
        FixVec::new(
            FixVec::new(self.cos, self.sin).dot(v),
            FixVec::new(-self.sin, self.cos).dot(v),
        )
    }
}

impl Default for Rotator {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Tests
// ============================================================================
