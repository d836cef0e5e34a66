//! Builder for configuring and constructing a `TrisectEngine`.

use std::sync::Arc;

use trisect_analysis::{StnConfig, StnSeparator, Thresholds};
use trisect_core::Result;
use trisect_dsp::{OverlapPolicy, RelocatorConfig};
use trisect_stretch::{
    NoiseMorphConfig, NoiseMorpher, PhaseVocoder, PitchShifter, SampleRateConverter,
    SincResampler, TimeStretcher,
};

use crate::TrisectEngine;

/// Every setting has a working default: an 8192/512-sample two-round
/// separator with thresholds 0.8/0.7, the default transient relocator, a
/// 2048/1024 noise morpher and the built-in phase vocoder and sinc
/// resampler.
///
/// # Example
///
/// ```ignore
/// use trisect::prelude::*;
///
/// let engine = TrisectEngine::builder()
///     .thresholds(0.85, 0.75)
///     .overlap_policy(OverlapPolicy::Overwrite)
///     .noise_seed(42)
///     .parallel_streams(true)
///     .build()?;
/// ```
#[derive(Default)]
pub struct TrisectEngineBuilder {
    stn: StnConfig,
    sines_thresholds: Option<(f64, f64)>,
    transient_thresholds: Option<(f64, f64)>,
    relocator: RelocatorConfig,
    noise: NoiseMorphConfig,
    time_stretcher: Option<Arc<dyn TimeStretcher>>,
    pitch_shifter: Option<Arc<dyn PitchShifter>>,
    resampler: Option<Arc<dyn SampleRateConverter>>,
    parallel_streams: bool,
}

impl TrisectEngineBuilder {
    /// Replace the whole separator configuration.
    pub fn stn_config(mut self, config: StnConfig) -> Self {
        self.stn = config;
        self
    }

    /// Default: 8192
    pub fn coarse_window(mut self, samples: usize) -> Self {
        self.stn.coarse_window = samples;
        self
    }

    /// Default: 512
    pub fn fine_window(mut self, samples: usize) -> Self {
        self.stn.fine_window = samples;
        self
    }

    /// Mask thresholds `G1 > G2` for both separation rounds.
    pub fn thresholds(mut self, upper: f64, lower: f64) -> Self {
        self.sines_thresholds = Some((upper, lower));
        self.transient_thresholds = Some((upper, lower));
        self
    }

    /// Thresholds of the second (transient) round only.
    pub fn transient_thresholds(mut self, upper: f64, lower: f64) -> Self {
        self.transient_thresholds = Some((upper, lower));
        self
    }

    pub fn relocator_config(mut self, config: RelocatorConfig) -> Self {
        self.relocator = config;
        self
    }

    /// Default: [`OverlapPolicy::Mix`]
    pub fn overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.relocator.overlap = policy;
        self
    }

    pub fn noise_config(mut self, config: NoiseMorphConfig) -> Self {
        self.noise = config;
        self
    }

    /// Make the noise carrier reproducible.
    pub fn noise_seed(mut self, seed: u64) -> Self {
        self.noise.seed = Some(seed);
        self
    }

    pub fn time_stretcher(mut self, stretcher: Arc<dyn TimeStretcher>) -> Self {
        self.time_stretcher = Some(stretcher);
        self
    }

    pub fn pitch_shifter(mut self, shifter: Arc<dyn PitchShifter>) -> Self {
        self.pitch_shifter = Some(shifter);
        self
    }

    pub fn resampler(mut self, resampler: Arc<dyn SampleRateConverter>) -> Self {
        self.resampler = Some(resampler);
        self
    }

    /// Run the three stream transforms on the rayon pool. Default: false
    pub fn parallel_streams(mut self, enabled: bool) -> Self {
        self.parallel_streams = enabled;
        self
    }

    pub fn build(self) -> Result<TrisectEngine> {
        let mut stn = self.stn;
        if let Some((upper, lower)) = self.sines_thresholds {
            stn.sines_thresholds = Thresholds::new(upper, lower)?;
        }
        if let Some((upper, lower)) = self.transient_thresholds {
            stn.transient_thresholds = Thresholds::new(upper, lower)?;
        }
        let separator = StnSeparator::new(stn)?;
        let morpher = NoiseMorpher::new(self.noise)?;

        let vocoder = Arc::new(PhaseVocoder::default());
        let time_stretcher = self
            .time_stretcher
            .unwrap_or_else(|| vocoder.clone() as Arc<dyn TimeStretcher>);
        let pitch_shifter = self
            .pitch_shifter
            .unwrap_or_else(|| vocoder as Arc<dyn PitchShifter>);
        let resampler = self
            .resampler
            .unwrap_or_else(|| Arc::new(SincResampler::default()) as Arc<dyn SampleRateConverter>);

        Ok(TrisectEngine::from_parts(
            separator,
            self.relocator,
            morpher,
            time_stretcher,
            pitch_shifter,
            resampler,
            self.parallel_streams,
        ))
    }
}
