//! Test helpers and fixtures for trisect integration tests.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `RECONSTRUCTION_EPSILON` (1e-9): STFT round trips
//! - `RECONSTRUCTION_DB` (-60dB): sum of separated streams vs input
//! - `SEPARATION_SHARE` (95%): energy routed to the right stream

#![allow(dead_code)]

pub mod tolerances;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use trisect::prelude::*;

/// Default test sample rate
pub const TEST_SAMPLE_RATE: f64 = 44100.0;

/// Impulse spacing of the standard fixture (100 ms at 44.1 kHz).
pub const IMPULSE_SPACING: usize = 4410;

/// Generate a sine wave with the given amplitude.
pub fn generate_sine(frequency: f64, amplitude: f64, sample_rate: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate;
            amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Unit impulses every `spacing` samples, starting at 0.
pub fn impulse_train(len: usize, spacing: usize) -> Vec<f64> {
    let mut out = vec![0.0; len];
    for i in (0..len).step_by(spacing) {
        out[i] = 1.0;
    }
    out
}

/// Reproducible uniform noise in `-amplitude..amplitude`.
pub fn uniform_noise(len: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    let mut rng = Pcg32::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-amplitude..amplitude)).collect()
}

/// Sample-wise sum of equally long parts.
pub fn sum_parts(parts: &[&[f64]]) -> Vec<f64> {
    let len = parts.iter().map(|p| p.len()).max().unwrap_or(0);
    let mut out = vec![0.0; len];
    for part in parts {
        for (o, s) in out.iter_mut().zip(part.iter()) {
            *o += s;
        }
    }
    out
}

/// Sine, impulse train and quiet noise, kept apart for projection checks.
pub struct Fixture {
    pub sine: Vec<f64>,
    pub impulses: Vec<f64>,
    pub noise: Vec<f64>,
    pub mix: Signal,
}

/// One second of 0.5 * sin(440 Hz), unit impulses every 100 ms and
/// uniform noise at +-0.005.
///
/// The noise peaks 40 dB under the sine. The 95% impulse share in the
/// transients stream depends on that: at +-0.05 the frames around each
/// impulse no longer clear the 0.8/0.7 transientness thresholds and the
/// share drops to roughly 20%.
pub fn standard_fixture() -> Fixture {
    let len = TEST_SAMPLE_RATE as usize;
    let sine = generate_sine(440.0, 0.5, TEST_SAMPLE_RATE, len);
    let impulses = impulse_train(len, IMPULSE_SPACING);
    let noise = uniform_noise(len, 0.005, 7);
    let mix = Signal::new(sum_parts(&[&sine, &impulses, &noise]), TEST_SAMPLE_RATE)
        .expect("fixture is finite");
    Fixture {
        sine,
        impulses,
        noise,
        mix,
    }
}

pub fn energy(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s * s).sum()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (energy(samples) / samples.len() as f64).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0f64, |m, s| m.max(s.abs()))
}

/// Energy of `part` relative to `whole`.
pub fn energy_share(part: &[f64], whole: &[f64]) -> f64 {
    energy(part) / energy(whole)
}

/// Energy ratio in decibels.
pub fn ratio_db(numerator: f64, denominator: f64) -> f64 {
    10.0 * (numerator / denominator + 1e-300).log10()
}

/// Index of the largest absolute sample.
pub fn argmax_abs(samples: &[f64]) -> usize {
    samples
        .iter()
        .enumerate()
        .fold((0, 0.0f64), |(bi, bv), (i, s)| {
            if s.abs() > bv {
                (i, s.abs())
            } else {
                (bi, bv)
            }
        })
        .0
}

/// Route pipeline logs to the test writer; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
