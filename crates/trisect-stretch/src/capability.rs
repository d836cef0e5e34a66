//! Black-box transforms the pipeline delegates to.
//!
//! The decomposition core only needs these three operations on the
//! sinusoidal and noise streams. [`PhaseVocoder`](crate::PhaseVocoder) and
//! [`SincResampler`](crate::SincResampler) implement them; any other backend
//! can be swapped in.

use trisect_core::{Error, Result};

/// Largest pitch shift accepted, in semitones either way.
pub const MAX_SEMITONES: f64 = 48.0;

/// Change duration without changing pitch.
pub trait TimeStretcher: Send + Sync {
    /// `rate > 1` speeds up (shorter output), `rate < 1` slows down.
    fn time_stretch(&self, samples: &[f64], rate: f64) -> Result<Vec<f64>>;
}

/// Change pitch without changing duration.
pub trait PitchShifter: Send + Sync {
    fn pitch_shift(&self, samples: &[f64], sample_rate: f64, semitones: f64) -> Result<Vec<f64>>;
}

/// Sample rate conversion.
pub trait SampleRateConverter: Send + Sync {
    fn resample(&self, samples: &[f64], source_rate: f64, target_rate: f64) -> Result<Vec<f64>>;
}

/// Frequency ratio `2^(semitones/12)` of a pitch shift.
///
/// Fails for non-finite shifts and shifts beyond [`MAX_SEMITONES`].
pub fn semitones_to_ratio(semitones: f64) -> Result<f64> {
    if !semitones.is_finite() || semitones.abs() > MAX_SEMITONES {
        return Err(Error::InvalidParameter(format!(
            "pitch shift must be finite and within +/-{} semitones, got {}",
            MAX_SEMITONES, semitones
        )));
    }
    Ok(2f64.powf(semitones / 12.0))
}
