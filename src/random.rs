#![warn(missing_docs)]
//! Seeded random number source shared by samplers, surfaces and partially transmitting boundaries.
//!
//! The state carries an `epoch` counter that is bumped on every reseed (or explicit [`RandomState::update`]).
//! Cached random data (e.g. a sampler buffer) records the epoch it was generated in and can thus detect that it
//! has become stale.
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Default seed of a fresh [`RandomState`].
pub const DEFAULT_SEED: u64 = 0x12345;
/// Number of draws thrown away after seeding.
const DISCARD: usize = 100;

/// Seeded generator with an epoch counter.
#[derive(Debug, Clone)]
pub struct RandomState {
    generator: ChaCha8Rng,
    seed: u64,
    epoch: u64,
}
impl Default for RandomState {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
impl RandomState {
    /// Creates a new [`RandomState`] seeded with the given value.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            generator: ChaCha8Rng::seed_from_u64(seed),
            seed,
            epoch: 0,
        };
        state.set_seed(seed);
        state
    }
    /// Reseed the generator. This increments the epoch.
    pub fn set_seed(&mut self, seed: u64) {
        self.generator = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..DISCARD {
            self.generator.next_u64();
        }
        self.seed = seed;
        self.update();
    }
    /// Mark all data generated so far as outdated without touching the generator.
    pub fn update(&mut self) {
        self.epoch += 1;
    }
    /// Returns the epoch of this [`RandomState`].
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
    /// Returns the seed the generator was last (re)seeded with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
    /// Uniformly distributed value in `[0, 1)`.
    pub fn randu(&mut self) -> f64 {
        self.generator.random::<f64>()
    }
    /// Uniformly distributed value in `[-1, 1)`.
    pub fn randu_sign(&mut self) -> f64 {
        self.generator.random_range(-1.0..1.0)
    }
    /// Normally distributed value (mean 0, standard deviation 1).
    pub fn randn(&mut self) -> f64 {
        StandardNormal.sample(&mut self.generator)
    }
    /// Direct access to the underlying generator, e.g. for sampling other distributions.
    pub fn generator(&mut self) -> &mut ChaCha8Rng {
        &mut self.generator
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn default() {
        let state = RandomState::default();
        assert_eq!(state.seed(), DEFAULT_SEED);
        assert_eq!(state.epoch(), 1);
    }
    #[test]
    fn epoch() {
        let mut state = RandomState::new(1);
        assert_eq!(state.epoch(), 1);
        state.set_seed(2);
        assert_eq!(state.epoch(), 2);
        state.update();
        assert_eq!(state.epoch(), 3);
        state.randu();
        assert_eq!(state.epoch(), 3);
    }
    #[test]
    fn reproducible() {
        let mut a = RandomState::new(42);
        let mut b = RandomState::new(42);
        for _ in 0..10 {
            assert_eq!(a.randu(), b.randu());
            assert_eq!(a.randn(), b.randn());
        }
        a.set_seed(42);
        let mut c = RandomState::new(42);
        assert_eq!(a.randu(), c.randu());
    }
    #[test]
    fn ranges() {
        let mut state = RandomState::default();
        for _ in 0..1000 {
            let u = state.randu();
            assert!((0.0..1.0).contains(&u));
            let s = state.randu_sign();
            assert!((-1.0..1.0).contains(&s));
            assert!(state.randn().is_finite());
        }
    }
}
