//! Phase vocoder for time-stretching and pitch-shifting the sinusoidal stream.
//!
//! ## Algorithm Overview
//!
//! 1. **Analysis**: Hann STFT with hop `Ha`
//! 2. **Phase Unwrapping**: instantaneous frequency of every bin from the
//!    deviation between the measured and the expected phase advance
//! 3. **Phase Propagation**: synthesis phases advance by that frequency over
//!    the synthesis hop `Hs = round(Ha * stretch)`
//! 4. **Synthesis**: inverse STFT with hop `Hs` and weighted overlap-add
//!
//! The input is zero-padded so the last synthesis frame centre lands at or
//! past the final output sample.
//!
//! Pitch shifting stretches by the pitch ratio and resamples back to the
//! original rate, so duration is preserved and every frequency scales.

use std::f64::consts::{PI, TAU};

use tracing::debug;
use trisect_core::{
    ensure_positive, fit_length, Complex64, Result, SpectralGrid, Spectrogram, Stft,
};

use crate::capability::{semitones_to_ratio, PitchShifter, SampleRateConverter, TimeStretcher};
use crate::resample::SincResampler;

/// Default analysis FFT size
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Default analysis hop (75% overlap)
pub const DEFAULT_HOP: usize = DEFAULT_FFT_SIZE / 4;

/// Offline phase vocoder.
#[derive(Debug, Clone)]
pub struct PhaseVocoder {
    fft_size: usize,
    hop: usize,
    resampler: SincResampler,
}

impl Default for PhaseVocoder {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            hop: DEFAULT_HOP,
            resampler: SincResampler::default(),
        }
    }
}

impl PhaseVocoder {
    /// Vocoder with an explicit FFT size and analysis hop.
    pub fn new(fft_size: usize, hop: usize) -> Result<Self> {
        // Validates the pair
        Stft::new(fft_size, hop)?;
        Ok(Self {
            fft_size,
            hop,
            resampler: SincResampler::default(),
        })
    }

    /// Resampler used to undo the stretch when pitch shifting.
    pub fn with_resampler(mut self, resampler: SincResampler) -> Self {
        self.resampler = resampler;
        self
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Stretch duration by `factor` (>1 = longer); output has
    /// `round(len * factor)` samples.
    pub fn stretch(&self, samples: &[f64], factor: f64) -> Result<Vec<f64>> {
        ensure_positive("stretch factor", factor)?;
        let target_len = (samples.len() as f64 * factor).round() as usize;
        if samples.is_empty() || target_len == 0 {
            return Ok(vec![0.0; target_len]);
        }

        // Keep Hs <= fft_size / 2 so synthesis frames still overlap
        let max_hop = ((self.fft_size as f64) / (2.0 * factor)).floor().max(1.0) as usize;
        let analysis_hop = self.hop.min(max_hop);
        let synthesis_hop = ((analysis_hop as f64 * factor).round() as usize).max(1);

        let analysis = Stft::new(self.fft_size, analysis_hop)?;
        let synthesis = Stft::new(self.fft_size, synthesis_hop)?;
        let covered_len = target_len.div_ceil(synthesis_hop) * analysis_hop;
        let spectrum = if covered_len > samples.len() {
            let mut padded = samples.to_vec();
            padded.resize(covered_len, 0.0);
            analysis.forward(&padded)?
        } else {
            analysis.forward(samples)?
        };

        let bins = spectrum.bins();
        let frames = spectrum.frames();
        let hop_ratio = synthesis_hop as f64 / analysis_hop as f64;
        let expected_phase_diff: Vec<f64> = (0..bins)
            .map(|k| TAU * k as f64 * analysis_hop as f64 / self.fft_size as f64)
            .collect();

        let mut last_phase = vec![0.0; bins];
        let mut phase_accumulator = vec![0.0; bins];
        let mut data = Vec::with_capacity(bins * frames);

        for frame in 0..frames {
            for (k, &bin) in spectrum.grid().frame(frame).iter().enumerate() {
                let magnitude = bin.norm();
                let phase = bin.arg();

                if frame == 0 {
                    phase_accumulator[k] = phase;
                } else {
                    let expected = expected_phase_diff[k];
                    let deviation = wrap_phase(phase - last_phase[k] - expected);
                    let true_freq = expected + deviation;
                    phase_accumulator[k] = wrap_phase(phase_accumulator[k] + true_freq * hop_ratio);
                }
                last_phase[k] = phase;
                data.push(Complex64::from_polar(magnitude, phase_accumulator[k]));
            }
        }

        let stretched =
            Spectrogram::from_grid(self.fft_size, SpectralGrid::from_frames(bins, frames, data)?)?;
        debug!(
            factor,
            analysis_hop,
            synthesis_hop,
            frames,
            "phase vocoder stretch"
        );
        synthesis.inverse(&stretched, target_len)
    }
}

impl TimeStretcher for PhaseVocoder {
    fn time_stretch(&self, samples: &[f64], rate: f64) -> Result<Vec<f64>> {
        ensure_positive("rate", rate)?;
        self.stretch(samples, 1.0 / rate)
    }
}

impl PitchShifter for PhaseVocoder {
    fn pitch_shift(&self, samples: &[f64], sample_rate: f64, semitones: f64) -> Result<Vec<f64>> {
        ensure_positive("sample rate", sample_rate)?;
        let ratio = semitones_to_ratio(semitones)?;
        if ratio == 1.0 {
            return Ok(samples.to_vec());
        }
        let stretched = self.stretch(samples, ratio)?;
        let shifted = self
            .resampler
            .resample(&stretched, sample_rate * ratio, sample_rate)?;
        Ok(fit_length(shifted, samples.len()))
    }
}

/// Wrap phase to [-PI, PI)
#[inline]
fn wrap_phase(phase: f64) -> f64 {
    (phase + PI).rem_euclid(TAU) - PI
}
