//! Fixed-point math utilities for deterministic layouts.
//!
//! All placement geometry uses fixed-point arithmetic so that a seed
//! reproduces the same town on every platform. Floating-point values
//! only appear in human-authored configuration and are converted once
//! during validation.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all layout math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector on the ground plane.
///
/// `y` holds the world Z coordinate; height is never modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Z coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Unit vector along +X.
    pub const UNIT_X: Self = Self {
        x: Fixed::ONE,
        y: Fixed::ZERO,
    };

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] once the points are more than about
    /// 46,000 units apart. Use [`Vec2Fixed::within`] for exact range tests.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Exact test of `distance(self, other) < reach`.
    ///
    /// Squares are taken on the raw bits in `i128`, so no pair of
    /// representable points can overflow the comparison.
    #[must_use]
    pub fn within(self, other: Self, reach: Fixed) -> bool {
        if reach <= Fixed::ZERO {
            return false;
        }
        let square = |bits: i128| bits.checked_mul(bits);
        let dx = i128::from(self.x.to_bits()) - i128::from(other.x.to_bits());
        let dy = i128::from(self.y.to_bits()) - i128::from(other.y.to_bits());
        let reach_sq = square(i128::from(reach.to_bits()));
        match (square(dx), square(dy), reach_sq) {
            (Some(dx2), Some(dy2), Some(limit)) => {
                dx2.checked_add(dy2).is_some_and(|dist_sq| dist_sq < limit)
            }
            _ => false,
        }
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Scale both components.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    ///
    /// Returns [`Vec2Fixed::ZERO`] for a zero-length vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        // Halve long vectors first so the squared length stays representable.
        let limit = Fixed::from_num(16_384);
        let mut v = self;
        while v.x.saturating_abs() > limit || v.y.saturating_abs() > limit {
            v = Self::new(v.x / Fixed::from_num(2), v.y / Fixed::from_num(2));
        }
        let len_sq = v.dot(v);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(v.x / len, v.y / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
///
/// Non-positive inputs return zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    // 64 halvings reach the last fractional bit for any in-range input.
    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        if mid == low {
            break;
        }
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::fmt::Display for Vec2Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.2}, {:.2})",
            self.x.to_num::<f64>(),
            self.y.to_num::<f64>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(0));
        let b = Vec2Fixed::new(Fixed::from_num(0), Fixed::from_num(4));
        let dist_sq = a.distance_squared(b);
        // 3² + 4² = 25
        assert_eq!(dist_sq, Fixed::from_num(25));
    }

    #[test]
    fn test_distance_of_pythagorean_triple() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        let dist = a.distance(b);
        let epsilon = Fixed::ONE / Fixed::from_num(100_000);
        assert!((dist - Fixed::from_num(5)).abs() < epsilon);
    }

    #[test]
    fn test_sqrt_small_and_zero() {
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);

        let root = fixed_sqrt(Fixed::from_num(0.25));
        let epsilon = Fixed::ONE / Fixed::from_num(100_000);
        assert!((root - Fixed::from_num(0.5)).abs() < epsilon);
    }

    #[test]
    fn test_sqrt_large_value() {
        let root = fixed_sqrt(Fixed::from_num(40_000));
        let epsilon = Fixed::ONE / Fixed::from_num(10_000);
        assert!((root - Fixed::from_num(200)).abs() < epsilon);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(fixed_sqrt(a), fixed_sqrt(b));
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(4));
        let norm = v.normalize();

        let len_sq = norm.dot(norm);
        let one = Fixed::from_num(1);
        let epsilon = one / Fixed::from_num(10000);
        assert!(
            (len_sq - one).abs() < epsilon,
            "normalized vector length² should be ~1, got {:?}",
            len_sq
        );

        // norm.x * 4 should equal norm.y * 3
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(
            ratio_diff.abs() < epsilon,
            "direction not preserved: {:?}",
            ratio_diff
        );
    }

    #[test]
    fn test_within_is_strict() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        assert!(a.within(b, Fixed::from_num(5.5)));
        assert!(!a.within(b, Fixed::from_num(5)));
        assert!(!a.within(a, Fixed::ZERO));
    }

    #[test]
    fn test_far_points_do_not_overflow() {
        let west = Vec2Fixed::from_ints(-30_000, 0);
        let east = Vec2Fixed::from_ints(30_000, 0);
        assert!(!west.within(east, Fixed::from_num(10)));
        assert!(west.within(east, Fixed::from_num(60_001)));
        assert_eq!(west.distance_squared(east), Fixed::MAX);

        let corner = Vec2Fixed::new(Fixed::MIN, Fixed::MIN);
        let opposite = Vec2Fixed::new(Fixed::MAX, Fixed::MAX);
        assert!(!corner.within(opposite, Fixed::MAX));
    }

    #[test]
    fn test_normalize_long_vector() {
        let norm = Vec2Fixed::from_ints(60_000, 0).normalize();
        let epsilon = Fixed::ONE / Fixed::from_num(10_000);
        assert!((norm.x - Fixed::ONE).abs() < epsilon, "{norm}");
        assert_eq!(norm.y, Fixed::ZERO);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        let v = Vec2Fixed::new(Fixed::from_num(1.5), Fixed::from_num(-2));
        assert_eq!(v.to_string(), "(1.50, -2.00)");
    }
}
