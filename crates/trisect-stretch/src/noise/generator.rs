//! Gaussian white noise for morphing carriers.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Seedable standard-normal noise source.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    rng: Pcg32,
}

impl NoiseGenerator {
    /// Deterministic stream for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, from OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self {
                rng: Pcg32::from_entropy(),
            },
        }
    }

    /// One N(0, 1) sample (Box-Muller).
    pub fn gaussian(&mut self) -> f64 {
        // (0, 1] keeps the logarithm finite
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
    }

    /// `len` Gaussian samples scaled so the largest magnitude is 1.
    pub fn white(&mut self, len: usize) -> Vec<f64> {
        let mut noise: Vec<f64> = (0..len).map(|_| self.gaussian()).collect();
        let peak = noise.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        if peak > 0.0 {
            for v in &mut noise {
                *v /= peak;
            }
        }
        noise
    }
}
