//! First-order attack/release envelope follower.

use trisect_core::{ensure_positive, Result};

/// Peak envelope follower with separate attack and release rates.
///
/// Each sample moves the envelope a fixed fraction of the way towards `|x|`:
/// the attack fraction while the input is above the envelope, the release
/// fraction otherwise. The envelope starts at 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeFollower {
    attack_coeff: f64,
    release_coeff: f64,
    envelope: f64,
}

impl EnvelopeFollower {
    /// Follower with raw per-sample coefficients in `(0, 1]`.
    pub fn new(attack_coeff: f64, release_coeff: f64) -> Self {
        Self {
            attack_coeff,
            release_coeff,
            envelope: 0.0,
        }
    }

    /// Follower whose coefficients are `1000 / (sample_rate * time_ms)`.
    pub fn from_times_ms(attack_ms: f64, release_ms: f64, sample_rate: f64) -> Result<Self> {
        ensure_positive("attack time", attack_ms)?;
        ensure_positive("release time", release_ms)?;
        ensure_positive("sample rate", sample_rate)?;
        Ok(Self::new(
            Self::time_to_coeff(attack_ms, sample_rate),
            Self::time_to_coeff(release_ms, sample_rate),
        ))
    }

    #[inline]
    fn time_to_coeff(time_ms: f64, sample_rate: f64) -> f64 {
        (1000.0 / (sample_rate * time_ms)).min(1.0)
    }

    pub fn attack_coeff(&self) -> f64 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f64 {
        self.release_coeff
    }

    pub fn current_envelope(&self) -> f64 {
        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    /// Advance by one sample and return the new envelope.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let level = input.abs();
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope += coeff * (level - self.envelope);
        self.envelope
    }
}
