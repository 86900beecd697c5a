//! Seeded uniform random numbers for the stochastic optimizers.

use heston_core::Real;
use rand_mt::Mt19937GenRand64;

/// A uniform pseudo-random number generator based on the Mersenne Twister
/// MT19937-64 algorithm.
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl MersenneTwisterUniformRng {
    /// Create a new generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Next uniform deviate in `[0, 1)`.
    pub fn next_real(&mut self) -> Real {
        // 53 random mantissa bits
        (self.rng.next_u64() >> 11) as Real / (1u64 << 53) as Real
    }

    /// Next uniform deviate in `[lower, upper)`.
    pub fn next_in(&mut self, lower: Real, upper: Real) -> Real {
        lower + (upper - lower) * self.next_real()
    }

    /// Next uniform index in `0..n`. `n` must be non-zero.
    pub fn next_index(&mut self, n: usize) -> usize {
        ((self.next_real() * n as Real) as usize).min(n - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_range() {
        let mut rng = MersenneTwisterUniformRng::new(42);
        for _ in 0..1_000 {
            let x = rng.next_real();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = MersenneTwisterUniformRng::new(7);
        let mut b = MersenneTwisterUniformRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_real(), b.next_real());
        }
    }

    #[test]
    fn scaled_draws_stay_in_bounds() {
        let mut rng = MersenneTwisterUniformRng::new(1);
        for _ in 0..1_000 {
            let x = rng.next_in(-1.0, 1.0);
            assert!((-1.0..1.0).contains(&x));
            assert!(rng.next_index(5) < 5);
        }
    }
}
