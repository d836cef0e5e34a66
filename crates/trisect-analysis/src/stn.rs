//! Sines/transients/noise separation.
//!
//! ## Algorithm
//!
//! Each round takes a Hann STFT, estimates percussive energy with a median
//! filter across frequency and tonal energy with a median filter across
//! time, turns their ratio into smooth soft masks and resynthesises the
//! masked spectrograms.
//!
//! [`StnSeparator::separate`] chains two rounds. The coarse window (good
//! frequency resolution) extracts the sines; its transient and noise share is
//! resynthesised and analysed again with the fine window (good time
//! resolution), whose transient mask yields the transients and whose sines
//! and noise masks together yield the noise. Because every mask set sums to
//! one and the STFT pair reconstructs exactly, the three streams always add
//! back up to the input.

use tracing::debug;
use trisect_core::{ensure_positive, Error, RealGrid, Result, Signal, Spectrogram, Stft};

use crate::mask::{SoftMasks, Thresholds};
use crate::median::{horizontal_median, odd_filter_length, vertical_median};

/// Separator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct StnConfig {
    /// Window of the sines round, in samples
    pub coarse_window: usize,
    /// Window of the transients round, in samples
    pub fine_window: usize,
    /// Frames per window; hop = window / overlap
    pub overlap: usize,
    /// Mask thresholds of the sines round
    pub sines_thresholds: Thresholds,
    /// Mask thresholds of the transients round
    pub transient_thresholds: Thresholds,
    /// Span of the horizontal (time) median filter, in seconds
    pub time_resolution: f64,
    /// Span of the vertical (frequency) median filter, in Hz
    pub frequency_resolution: f64,
}

impl Default for StnConfig {
    fn default() -> Self {
        Self {
            coarse_window: 8192,
            fine_window: 512,
            overlap: 8,
            sines_thresholds: Thresholds::default(),
            transient_thresholds: Thresholds::default(),
            time_resolution: 0.2,
            frequency_resolution: 500.0,
        }
    }
}

impl StnConfig {
    /// Same thresholds for both rounds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.sines_thresholds = thresholds;
        self.transient_thresholds = thresholds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("coarse window", self.coarse_window),
            ("fine window", self.fine_window),
        ] {
            if window < 2 || window % 2 != 0 {
                return Err(Error::InvalidParameter(format!(
                    "{} must be even and at least 2, got {}",
                    name, window
                )));
            }
        }
        if self.overlap < 2 || self.overlap > self.fine_window.min(self.coarse_window) {
            return Err(Error::InvalidParameter(format!(
                "overlap must be between 2 and the smallest window, got {}",
                self.overlap
            )));
        }
        ensure_positive("time resolution", self.time_resolution)?;
        ensure_positive("frequency resolution", self.frequency_resolution)?;
        Ok(())
    }
}

/// The three separated streams, each as long as the input.
#[derive(Debug, Clone, PartialEq)]
pub struct StnComponents {
    pub sines: Signal,
    pub transients: Signal,
    pub noise: Signal,
}

impl StnComponents {
    /// Sample-wise sum of the three streams.
    pub fn sum(&self) -> Vec<f64> {
        self.sines
            .samples()
            .iter()
            .zip(self.transients.samples())
            .zip(self.noise.samples())
            .map(|((s, t), n)| s + t + n)
            .collect()
    }
}

/// Median filter lengths of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterLengths {
    pub horizontal: usize,
    pub vertical: usize,
}

/// One STFT/median/mask stage.
#[derive(Debug, Clone)]
struct Round {
    stft: Stft,
    thresholds: Thresholds,
    lengths: FilterLengths,
}

impl Round {
    fn new(config: &StnConfig, window: usize, thresholds: Thresholds, sr: f64) -> Result<Self> {
        let hop = window / config.overlap;
        let lengths = filter_lengths(config, window, hop, sr)?;
        debug!(
            window,
            hop,
            horizontal = lengths.horizontal,
            vertical = lengths.vertical,
            "stn round configured"
        );
        Ok(Self {
            stft: Stft::new(window, hop)?,
            thresholds,
            lengths,
        })
    }

    fn masks(&self, spectrogram: &Spectrogram) -> Result<SoftMasks> {
        let mags = spectrogram.magnitudes();
        let vertical = vertical_median(&mags, self.lengths.vertical)?;
        let horizontal = horizontal_median(&mags, self.lengths.horizontal)?;
        SoftMasks::from_estimates(&vertical, &horizontal, self.thresholds)
    }

    fn synthesize(
        &self,
        spectrogram: &Spectrogram,
        mask: &RealGrid,
        len: usize,
    ) -> Result<Vec<f64>> {
        let out = self.stft.inverse(&spectrogram.apply_mask(mask)?, len)?;
        if out.iter().any(|v| !v.is_finite()) {
            return Err(Error::Computation(
                "resynthesised stream contains non-finite samples".into(),
            ));
        }
        Ok(out)
    }
}

/// Derive both median filter lengths for a window/hop pair.
///
/// `n_h = floor(time_resolution * sr / hop)` frames and
/// `n_v = floor(frequency_resolution * window / sr)` bins, each widened to
/// the next odd length `>= n + 1`.
pub fn filter_lengths(
    config: &StnConfig,
    window: usize,
    hop: usize,
    sample_rate: f64,
) -> Result<FilterLengths> {
    ensure_positive("sample rate", sample_rate)?;
    let n_h = (config.time_resolution * sample_rate / hop as f64).floor() as usize;
    let n_v = (config.frequency_resolution * window as f64 / sample_rate).floor() as usize;
    if n_h == 0 {
        return Err(Error::InvalidParameter(format!(
            "time resolution {} s is shorter than one hop ({} samples at {} Hz)",
            config.time_resolution, hop, sample_rate
        )));
    }
    if n_v == 0 {
        return Err(Error::InvalidParameter(format!(
            "frequency resolution {} Hz is narrower than one bin of a {}-point FFT at {} Hz",
            config.frequency_resolution, window, sample_rate
        )));
    }
    Ok(FilterLengths {
        horizontal: odd_filter_length(n_h),
        vertical: odd_filter_length(n_v),
    })
}

/// Two-round sines/transients/noise separator.
#[derive(Debug, Clone, Default)]
pub struct StnSeparator {
    config: StnConfig,
}

impl StnSeparator {
    pub fn new(config: StnConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StnConfig {
        &self.config
    }

    /// Split `signal` into sines, transients and noise.
    pub fn separate(&self, signal: &Signal) -> Result<StnComponents> {
        Ok(self.analyze(signal)?.components)
    }

    /// Separate `signal` and keep both rounds' masks for later projection.
    pub fn analyze(&self, signal: &Signal) -> Result<StnAnalysis> {
        self.check_length(signal)?;
        let sr = signal.sample_rate();
        let coarse = Round::new(
            &self.config,
            self.config.coarse_window,
            self.config.sines_thresholds,
            sr,
        )?;
        let fine = Round::new(
            &self.config,
            self.config.fine_window,
            self.config.transient_thresholds,
            sr,
        )?;

        let x = signal.samples();
        let coarse_spec = coarse.stft.forward(x)?;
        let coarse_masks = coarse.masks(&coarse_spec)?;
        let sines = coarse.synthesize(&coarse_spec, &coarse_masks.sines, x.len())?;
        let residual = coarse.synthesize(&coarse_spec, &coarse_masks.residual()?, x.len())?;

        let fine_spec = fine.stft.forward(&residual)?;
        let fine_masks = fine.masks(&fine_spec)?;
        let transients = fine.synthesize(&fine_spec, &fine_masks.transients, x.len())?;
        let noise = fine.synthesize(&fine_spec, &fine_masks.non_transient()?, x.len())?;

        debug!(
            samples = x.len(),
            coarse_frames = coarse_spec.frames(),
            fine_frames = fine_spec.frames(),
            "stn separation complete"
        );

        Ok(StnAnalysis {
            components: StnComponents {
                sines: signal.with_samples(sines)?,
                transients: signal.with_samples(transients)?,
                noise: signal.with_samples(noise)?,
            },
            coarse,
            fine,
            coarse_masks,
            fine_masks,
        })
    }

    /// A single coarse-window round: `S`, `T` and `N` masks applied to one
    /// spectrogram.
    pub fn decompose_round(&self, signal: &Signal) -> Result<StnComponents> {
        self.check_length(signal)?;
        let round = Round::new(
            &self.config,
            self.config.coarse_window,
            self.config.sines_thresholds,
            signal.sample_rate(),
        )?;
        let x = signal.samples();
        let spec = round.stft.forward(x)?;
        let masks = round.masks(&spec)?;
        Ok(StnComponents {
            sines: signal.with_samples(round.synthesize(&spec, &masks.sines, x.len())?)?,
            transients: signal.with_samples(round.synthesize(&spec, &masks.transients, x.len())?)?,
            noise: signal.with_samples(round.synthesize(&spec, &masks.noise, x.len())?)?,
        })
    }

    fn check_length(&self, signal: &Signal) -> Result<()> {
        if signal.len() < self.config.coarse_window {
            return Err(Error::Precondition(format!(
                "input has {} samples, shorter than the {}-sample analysis window",
                signal.len(),
                self.config.coarse_window
            )));
        }
        Ok(())
    }
}

/// Result of [`StnSeparator::analyze`]: the separated streams plus the
/// masks that produced them.
#[derive(Debug, Clone)]
pub struct StnAnalysis {
    components: StnComponents,
    coarse: Round,
    fine: Round,
    coarse_masks: SoftMasks,
    fine_masks: SoftMasks,
}

impl StnAnalysis {
    pub fn components(&self) -> &StnComponents {
        &self.components
    }

    pub fn into_components(self) -> StnComponents {
        self.components
    }

    pub fn coarse_masks(&self) -> &SoftMasks {
        &self.coarse_masks
    }

    pub fn fine_masks(&self) -> &SoftMasks {
        &self.fine_masks
    }

    pub fn filter_lengths(&self) -> (FilterLengths, FilterLengths) {
        (self.coarse.lengths, self.fine.lengths)
    }

    /// Route another signal of the same length through the stored masks.
    ///
    /// Projection is linear, so applying it to each additive part of the
    /// analysed signal shows where that part's energy ended up.
    pub fn apply(&self, samples: &[f64]) -> Result<[Vec<f64>; 3]> {
        let len = self.components.sines.len();
        if samples.len() != len {
            return Err(Error::Precondition(format!(
                "projected signal has {} samples, analysis covered {}",
                samples.len(),
                len
            )));
        }
        let coarse_spec = self.coarse.stft.forward(samples)?;
        let sines = self.coarse.synthesize(&coarse_spec, &self.coarse_masks.sines, len)?;
        let residual = self
            .coarse
            .synthesize(&coarse_spec, &self.coarse_masks.residual()?, len)?;
        let fine_spec = self.fine.stft.forward(&residual)?;
        let transients = self
            .fine
            .synthesize(&fine_spec, &self.fine_masks.transients, len)?;
        let noise = self
            .fine
            .synthesize(&fine_spec, &self.fine_masks.non_transient()?, len)?;
        Ok([sines, transients, noise])
    }
}

/// Separate with explicit windows and one threshold pair for both rounds.
pub fn separate(
    signal: &Signal,
    coarse_window: usize,
    fine_window: usize,
    upper: f64,
    lower: f64,
) -> Result<StnComponents> {
    let config = StnConfig {
        coarse_window,
        fine_window,
        ..StnConfig::default()
    }
    .with_thresholds(Thresholds::new(upper, lower)?);
    StnSeparator::new(config)?.separate(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use std::f64::consts::PI;

    const SR: f64 = 44100.0;

    fn noise(len: usize, amp: f64, seed: u64) -> Vec<f64> {
        let mut rng = Pcg32::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(-amp..amp)).collect()
    }

    fn assert_samples_eq(a: &[f64], b: &[f64], epsilon: f64) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
        }
    }

    #[test]
    fn test_filter_lengths_at_44k() {
        let config = StnConfig::default();
        let coarse = filter_lengths(&config, 8192, 1024, SR).unwrap();
        // floor(0.2 * 44100 / 1024) = 8, floor(500 * 8192 / 44100) = 92
        assert_eq!(coarse.horizontal, 9);
        assert_eq!(coarse.vertical, 93);
        let fine = filter_lengths(&config, 512, 64, SR).unwrap();
        assert_eq!(fine.horizontal, 139);
        assert_eq!(fine.vertical, 7);
    }

    #[test]
    fn test_zero_filter_length_is_invalid() {
        let config = StnConfig {
            frequency_resolution: 10.0,
            ..StnConfig::default()
        };
        assert!(matches!(
            filter_lengths(&config, 512, 64, SR),
            Err(Error::InvalidParameter(_))
        ));
        let config = StnConfig {
            time_resolution: 0.001,
            ..StnConfig::default()
        };
        assert!(matches!(
            filter_lengths(&config, 8192, 1024, SR),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(StnSeparator::new(StnConfig::default()).is_ok());
        let odd = StnConfig {
            fine_window: 511,
            ..StnConfig::default()
        };
        assert!(StnSeparator::new(odd).is_err());
        let zero = StnConfig {
            coarse_window: 0,
            ..StnConfig::default()
        };
        assert!(StnSeparator::new(zero).is_err());
        assert!(separate(&Signal::silence(9000, SR).unwrap(), 8192, 512, 0.7, 0.8).is_err());
    }

    #[test]
    fn test_short_input_is_a_precondition_violation() {
        let sep = StnSeparator::default();
        let short = Signal::silence(8191, SR).unwrap();
        assert!(matches!(sep.separate(&short), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_streams_sum_to_input() {
        let x: Vec<f64> = noise(20000, 0.3, 1)
            .iter()
            .enumerate()
            .map(|(i, n)| n + 0.4 * (2.0 * PI * 1000.0 * i as f64 / SR).sin())
            .collect();
        let signal = Signal::new(x.clone(), SR).unwrap();
        let parts = StnSeparator::default().separate(&signal).unwrap();
        assert_eq!(parts.sines.len(), x.len());
        assert_eq!(parts.transients.len(), x.len());
        assert_eq!(parts.noise.len(), x.len());
        assert_samples_eq(&parts.sum(), &x, 1e-9);
    }

    #[test]
    fn test_single_round_sums_to_input() {
        let x = noise(10000, 0.5, 2);
        let signal = Signal::new(x.clone(), SR).unwrap();
        let parts = StnSeparator::default().decompose_round(&signal).unwrap();
        assert_samples_eq(&parts.sum(), &x, 1e-9);
    }

    #[test]
    fn test_silence_stays_silent() {
        let signal = Signal::silence(9000, SR).unwrap();
        let parts = StnSeparator::default().separate(&signal).unwrap();
        assert!(parts.sum().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_steady_sine_goes_to_sines() {
        let x: Vec<f64> = (0..22050)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f64 / SR).sin())
            .collect();
        let signal = Signal::new(x.clone(), SR).unwrap();
        let parts = StnSeparator::default().separate(&signal).unwrap();
        let ratio = parts.sines.energy() / signal.energy();
        assert!(ratio > 0.95, "sine energy ratio {}", ratio);
    }

    #[test]
    fn test_apply_reproduces_components() {
        let x = noise(12000, 0.2, 3);
        let signal = Signal::new(x.clone(), SR).unwrap();
        let analysis = StnSeparator::default().analyze(&signal).unwrap();
        let [s, t, n] = analysis.apply(&x).unwrap();
        let parts = analysis.components();
        assert_samples_eq(&s, parts.sines.samples(), 1e-12);
        assert_samples_eq(&t, parts.transients.samples(), 1e-12);
        assert_samples_eq(&n, parts.noise.samples(), 1e-12);
        assert!(analysis.apply(&x[..100]).is_err());
    }
}
