//! Default uniform random source for sampling decisions
//!
//! [`Xorshift64`] is small, `no_std`-friendly and fully reproducible from its
//! seed. It implements [`RngCore`] and [`SeedableRng`], so any filter that
//! accepts a generic generator can be handed this one or any `rand` generator
//! interchangeably.

use rand::{RngCore, SeedableRng};

/// Seed used when the caller does not supply one
pub const DEFAULT_SEED: u64 = 0x12345678;

/// Replacement for the all-zero state, which xorshift can never leave
const ZERO_SEED_REPLACEMENT: u64 = 0x853c49e6748fea9b;

/// Xorshift64 PRNG (shift triple 13/7/17)
///
/// # Example
///
/// ```
/// use flowsample::sampling::Xorshift64;
/// use rand::Rng;
///
/// let mut a = Xorshift64::new(7);
/// let mut b = Xorshift64::new(7);
/// let x: f64 = a.gen();
/// assert!((0.0..1.0).contains(&x));
/// assert_eq!(x, b.gen::<f64>());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Create a generator from a seed; a zero seed is remapped to a fixed constant
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { ZERO_SEED_REPLACEMENT } else { seed },
        }
    }

    #[inline]
    fn step(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl Default for Xorshift64 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for Xorshift64 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Xorshift64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = Xorshift64::new(0);
        assert_ne!(rng.next_u64(), 0);
        assert_eq!(Xorshift64::new(0), Xorshift64::new(ZERO_SEED_REPLACEMENT));
    }

    #[test]
    fn test_reproducibility() {
        let mut a = Xorshift64::seed_from_u64(42);
        let mut b = Xorshift64::from_seed(42u64.to_le_bytes());

        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_unit_interval() {
        let mut rng = Xorshift64::default();
        let mut sum = 0.0;
        let n = 100_000;

        for _ in 0..n {
            let x: f64 = rng.gen();
            assert!((0.0..1.0).contains(&x), "draw {} outside [0, 1)", x);
            sum += x;
        }

        // Mean of U[0,1) is 0.5
        let mean = sum / n as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean {} too far from 0.5", mean);
    }

    #[test]
    fn test_fill_bytes() {
        let mut rng = Xorshift64::new(9);
        let mut buf = [0u8; 13];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
