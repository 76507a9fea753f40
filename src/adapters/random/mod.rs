//! RandomSource adapters.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ports::RandomSource;

/// Production source backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible source for tests and replays.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen::<f64>(),
            // A poisoned lock still holds a usable generator.
            Err(poisoned) => poisoned.into_inner().gen::<f64>(),
        }
    }
}

/// Always returns the same value. Pins jitter to a constant in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0.clamp(0.0, 0.999_999)
    }
}
