//! Thread-local random source for stochastic augmentations.
//!
//! Every random transform draws from `AUGMENT_RNG`. When the calling thread
//! has seeded it via [`seed_augment_rng`], draws are reproducible; otherwise
//! they fall back to `rand::rng()`.

use rand::rngs::StdRng;
use rand::{Rng as _, RngCore, SeedableRng};
use std::cell::RefCell;

thread_local! {
    /// Thread-local RNG for deterministic augmentation.
    pub static AUGMENT_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// Seeds the calling thread's augmentation RNG.
pub fn seed_augment_rng(seed: u64) {
    AUGMENT_RNG.with(|rng| {
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    })
}

/// Drops the calling thread's seeded RNG so draws use `rand::rng()` again.
pub fn clear_augment_rng() {
    AUGMENT_RNG.with(|rng| *rng.borrow_mut() = None)
}

fn with_rng<T>(f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
    AUGMENT_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        match rng_ref.as_mut() {
            Some(rng) => f(rng),
            None => f(&mut rand::rng()),
        }
    })
}

/// Fair coin.
pub fn coin() -> bool {
    with_rng(|rng| rng.random_bool(0.5))
}

/// Uniform draw in `[low, high)`.
///
/// `low > high` is allowed and yields a value in `(high, low]`, matching
/// `low + (high - low) * u`.
pub fn uniform(low: f64, high: f64) -> f64 {
    let u: f64 = with_rng(|rng| rng.random());
    low + (high - low) * u
}

/// Uniform index in `0..len`. `len` must be non-zero.
pub fn choose_index(len: usize) -> usize {
    with_rng(|rng| rng.random_range(0..len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_draws_are_reproducible() {
        seed_augment_rng(7);
        let first: Vec<f64> = (0..8).map(|_| uniform(0.0, 1.0)).collect();
        seed_augment_rng(7);
        let second: Vec<f64> = (0..8).map(|_| uniform(0.0, 1.0)).collect();
        assert_eq!(first, second);
        clear_augment_rng();
    }

    #[test]
    fn test_uniform_reversed_bounds() {
        seed_augment_rng(3);
        for _ in 0..100 {
            let v = uniform(1.0, 0.25);
            assert!(v > 0.25 && v <= 1.0);
        }
    }

    #[test]
    fn test_choose_index_in_range() {
        seed_augment_rng(11);
        for _ in 0..100 {
            assert!(choose_index(6) < 6);
        }
    }
}
