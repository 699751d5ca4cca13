//! Seedable pseudo-random generator for layout jitter and sizing.
//!
//! Every generator takes a `&mut LayoutRng` explicitly; nothing in the
//! core touches system randomness. The same seed always replays the
//! same sequence.

use crate::math::Fixed;

/// Deterministic RNG (xorshift64* with a SplitMix64-scrambled seed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRng {
    state: u64,
}

impl LayoutRng {
    /// Create a generator from a seed. Seed zero is valid.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        // xorshift must never hold an all-zero state
        Self {
            state: if z == 0 { 0x2545_F491_4F6C_DD1D } else { z },
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform fixed-point value in `[0, 1)`.
    pub fn next_fixed(&mut self) -> Fixed {
        // Top 32 bits become the fractional part.
        Fixed::from_bits((self.next_u64() >> 32) as i64)
    }

    /// Uniform fixed-point value in `[min, max)`. Returns `min` when the range is empty.
    pub fn range_fixed(&mut self, min: Fixed, max: Fixed) -> Fixed {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_fixed()
    }

    /// Uniform index into a collection of `len` items, or `None` when empty.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some((self.next_u64() % len as u64) as usize)
        }
    }

    /// Fair coin flip.
    pub fn next_bool(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }
}
