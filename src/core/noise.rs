use crate::core::estimator::MAX_NOISE_AMPLITUDE;
use crate::domain::ports::NoiseSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform noise drawn from a random number generator.
#[derive(Debug, Clone)]
pub struct UniformNoise<R = StdRng> {
    rng: R,
}

impl UniformNoise<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible noise sequence, for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send> UniformNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> NoiseSource for UniformNoise<R> {
    fn sample(&mut self, amplitude: f64) -> f64 {
        if !amplitude.is_finite() || amplitude <= 0.0 {
            return 0.0;
        }
        // Keeps the sampled span finite for unvalidated estimators.
        let amplitude = amplitude.min(MAX_NOISE_AMPLITUDE);
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Always zero: scores equal the rounded base score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// A fixed offset, clamped to the configured amplitude.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn sample(&mut self, amplitude: f64) -> f64 {
        if amplitude.is_nan() || amplitude <= 0.0 || !self.0.is_finite() {
            return 0.0;
        }
        self.0.clamp(-amplitude, amplitude)
    }
}
