//! TrisectEngine that separates a signal and transforms each stream

use std::sync::Arc;

use tracing::{debug, warn};
use trisect_analysis::{StnComponents, StnSeparator};
use trisect_core::{ensure_positive, fit_length, mix_padded, Result, Signal};
use trisect_dsp::{RelocatorConfig, TransientRelocator};
use trisect_stretch::{
    semitones_to_ratio, NoiseMorpher, PitchShifter, SampleRateConverter, TimeStretcher,
};

use crate::builder::TrisectEngineBuilder;

/// What to do to the signal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Operation {
    /// Change duration by this factor (2.0 = twice as long), keeping pitch
    TimeStretch(f64),
    /// Shift pitch by this many semitones, keeping duration
    PitchShift(f64),
}

impl Operation {
    /// Fail with `InvalidParameter` before any work is done.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Operation::TimeStretch(ratio) => ensure_positive("stretch ratio", ratio),
            Operation::PitchShift(semitones) => semitones_to_ratio(semitones).map(|_| ()),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ProcessOptions {
    /// Return the separated and transformed streams with the output
    pub keep_streams: bool,
}

/// Intermediate streams of one `process_with` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Streams {
    /// Separator output, before any transform
    pub separated: StnComponents,
    pub sines: Vec<f64>,
    pub transients: Vec<f64>,
    pub noise: Vec<f64>,
}

/// Result of [`TrisectEngine::process_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    pub output: Signal,
    pub streams: Option<Streams>,
}

/// Sines/transients/noise processing pipeline.
///
/// Splits the input with the STN separator, sends the sines to a phase
/// vocoder, the transients to the transient relocator and the noise to the
/// noise morpher, then sums the three results (zero-padding shorter streams,
/// no normalisation).
///
/// # Example
///
/// ```no_run
/// use trisect::prelude::*;
///
/// let engine = TrisectEngine::builder()
///     .coarse_window(8192)
///     .fine_window(512)
///     .thresholds(0.8, 0.7)
///     .build()?;
///
/// let input = Signal::new(vec![0.0; 44100], 44100.0)?;
/// let slower = engine.process(&input, Operation::TimeStretch(2.0))?;
/// assert_eq!(slower.len(), 88200);
/// # Ok::<(), trisect::Error>(())
/// ```
pub struct TrisectEngine {
    separator: StnSeparator,
    relocator: RelocatorConfig,
    morpher: NoiseMorpher,
    time_stretcher: Arc<dyn TimeStretcher>,
    pitch_shifter: Arc<dyn PitchShifter>,
    resampler: Arc<dyn SampleRateConverter>,
    parallel_streams: bool,
}

impl TrisectEngine {
    pub fn builder() -> TrisectEngineBuilder {
        TrisectEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        separator: StnSeparator,
        relocator: RelocatorConfig,
        morpher: NoiseMorpher,
        time_stretcher: Arc<dyn TimeStretcher>,
        pitch_shifter: Arc<dyn PitchShifter>,
        resampler: Arc<dyn SampleRateConverter>,
        parallel_streams: bool,
    ) -> Self {
        Self {
            separator,
            relocator,
            morpher,
            time_stretcher,
            pitch_shifter,
            resampler,
            parallel_streams,
        }
    }

    pub fn separator(&self) -> &StnSeparator {
        &self.separator
    }

    pub fn parallel_streams(&self) -> bool {
        self.parallel_streams
    }

    /// Split `signal` into sines, transients and noise.
    pub fn separate(&self, signal: &Signal) -> Result<StnComponents> {
        self.separator.separate(signal)
    }

    /// Apply `operation` and return the recombined signal.
    pub fn process(&self, signal: &Signal, operation: Operation) -> Result<Signal> {
        Ok(self
            .process_with(signal, operation, &ProcessOptions::default())?
            .output)
    }

    /// Apply `operation`, optionally keeping the intermediate streams.
    pub fn process_with(
        &self,
        signal: &Signal,
        operation: Operation,
        options: &ProcessOptions,
    ) -> Result<ProcessOutput> {
        operation.validate()?;
        let separated = self.separator.separate(signal)?;
        let sr = signal.sample_rate();

        let (sines, transients, noise) = if self.parallel_streams {
            let (sines, (transients, noise)) = rayon::join(
                || self.transform_sines(&separated, operation, sr),
                || {
                    rayon::join(
                        || self.transform_transients(&separated, operation, sr),
                        || self.transform_noise(&separated, operation, sr),
                    )
                },
            );
            (sines?, transients?, noise?)
        } else {
            (
                self.transform_sines(&separated, operation, sr)?,
                self.transform_transients(&separated, operation, sr)?,
                self.transform_noise(&separated, operation, sr)?,
            )
        };

        let mixed = mix_padded(&[&sines, &transients, &noise]);
        if mixed.iter().any(|v| v.abs() > 1.0) {
            warn!("output exceeds full scale; no normalisation is applied");
        }
        debug!(
            ?operation,
            input_len = signal.len(),
            output_len = mixed.len(),
            "processed"
        );

        let output = signal.with_samples(mixed)?;
        let streams = options.keep_streams.then(|| Streams {
            separated,
            sines,
            transients,
            noise,
        });
        Ok(ProcessOutput { output, streams })
    }

    fn transform_sines(
        &self,
        parts: &StnComponents,
        operation: Operation,
        sr: f64,
    ) -> Result<Vec<f64>> {
        let sines = parts.sines.samples();
        match operation {
            Operation::TimeStretch(ratio) => self.time_stretcher.time_stretch(sines, 1.0 / ratio),
            Operation::PitchShift(semitones) => {
                self.pitch_shifter.pitch_shift(sines, sr, semitones)
            }
        }
    }

    fn transform_transients(
        &self,
        parts: &StnComponents,
        operation: Operation,
        sr: f64,
    ) -> Result<Vec<f64>> {
        let transients = parts.transients.samples();
        match operation {
            Operation::TimeStretch(ratio) => {
                TransientRelocator::new(sr, self.relocator)?.relocate(transients, ratio)
            }
            Operation::PitchShift(_) => Ok(transients.to_vec()),
        }
    }

    fn transform_noise(
        &self,
        parts: &StnComponents,
        operation: Operation,
        sr: f64,
    ) -> Result<Vec<f64>> {
        let noise = parts.noise.samples();
        match operation {
            Operation::TimeStretch(ratio) => self.morpher.morph(noise, ratio),
            Operation::PitchShift(semitones) => {
                let ratio = semitones_to_ratio(semitones)?;
                let morphed = self.morpher.morph(noise, ratio)?;
                let resampled = self.resampler.resample(&morphed, sr * ratio, sr)?;
                // Rounding in the two length changes can leave a sample over
                Ok(fit_length(resampled, noise.len()))
            }
        }
    }
}
