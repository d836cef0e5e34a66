//! Transient relocation for time-stretching.
//!
//! Two envelope followers run over the transient stream: a fast one that
//! reacts to attacks within a couple of milliseconds and a slow control one.
//! An onset fires when the fast envelope overtakes the control envelope. The
//! stream is cut at every onset and each piece is copied, Tukey-tapered but
//! otherwise unchanged, to `floor(start * ratio)` in an output of
//! `ceil(len * ratio)` samples. Stretching only moves transients apart; it
//! never smears them.

use tracing::debug;
use trisect_core::{ensure_positive, window::tukey, Error, Result};

use crate::envelope_follower::EnvelopeFollower;

/// What happens where a relocated segment lands on already written output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum OverlapPolicy {
    /// Add into the output
    #[default]
    Mix,
    /// Replace what is there
    Overwrite,
}

/// Relocator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct RelocatorConfig {
    pub fast_attack_ms: f64,
    pub fast_release_ms: f64,
    pub control_attack_ms: f64,
    pub control_release_ms: f64,
    /// The detector re-arms once `fast - release_margin < control`
    pub release_margin: f64,
    /// Tukey taper fraction applied to each segment
    pub taper_alpha: f64,
    pub overlap: OverlapPolicy,
}

impl Default for RelocatorConfig {
    fn default() -> Self {
        Self {
            fast_attack_ms: 2.23,
            fast_release_ms: 10.40,
            control_attack_ms: 60.84,
            control_release_ms: 8.67,
            release_margin: 0.0005,
            taper_alpha: 0.5,
            overlap: OverlapPolicy::Mix,
        }
    }
}

/// A run of transient-stream samples between two onsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransientSegment {
    pub start: usize,
    pub len: usize,
}

impl TransientSegment {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// First output sample of this segment after stretching by `ratio`.
    pub fn destination(&self, ratio: f64) -> usize {
        (self.start as f64 * ratio).floor() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    Idle,
    InTransient,
}

/// Dual-envelope onset detector.
#[derive(Debug, Clone)]
pub struct OnsetDetector {
    fast: EnvelopeFollower,
    control: EnvelopeFollower,
    release_margin: f64,
    state: DetectorState,
}

impl OnsetDetector {
    pub fn new(config: &RelocatorConfig, sample_rate: f64) -> Result<Self> {
        if !config.release_margin.is_finite() || config.release_margin < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "release margin must be finite and non-negative, got {}",
                config.release_margin
            )));
        }
        Ok(Self {
            fast: EnvelopeFollower::from_times_ms(
                config.fast_attack_ms,
                config.fast_release_ms,
                sample_rate,
            )?,
            control: EnvelopeFollower::from_times_ms(
                config.control_attack_ms,
                config.control_release_ms,
                sample_rate,
            )?,
            release_margin: config.release_margin,
            state: DetectorState::Idle,
        })
    }

    pub fn in_transient(&self) -> bool {
        self.state == DetectorState::InTransient
    }

    /// Feed one sample; `true` when an onset fires on it.
    pub fn process(&mut self, input: f64) -> Result<bool> {
        let fast = self.fast.process(input);
        let control = self.control.process(input);
        if !(fast.is_finite() && control.is_finite()) {
            return Err(Error::Computation(format!(
                "envelope diverged (fast {}, control {})",
                fast, control
            )));
        }

        if self.state == DetectorState::Idle && fast > control {
            self.state = DetectorState::InTransient;
            Ok(true)
        } else {
            if fast - self.release_margin < control {
                self.state = DetectorState::Idle;
            }
            Ok(false)
        }
    }
}

/// Detects transient segments and lays them out on a stretched time axis.
#[derive(Debug, Clone)]
pub struct TransientRelocator {
    config: RelocatorConfig,
    sample_rate: f64,
}

impl TransientRelocator {
    pub fn new(sample_rate: f64, config: RelocatorConfig) -> Result<Self> {
        ensure_positive("sample rate", sample_rate)?;
        if !config.taper_alpha.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "taper alpha must be finite, got {}",
                config.taper_alpha
            )));
        }
        // Fail early on bad envelope times
        OnsetDetector::new(&config, sample_rate)?;
        Ok(Self {
            config,
            sample_rate,
        })
    }

    pub fn config(&self) -> &RelocatorConfig {
        &self.config
    }

    /// Split `samples` at every onset.
    ///
    /// Segments tile the input: the first starts at 0 and the last one,
    /// still open when the input ends, runs to the final sample.
    pub fn segments(&self, samples: &[f64]) -> Result<Vec<TransientSegment>> {
        let mut detector = OnsetDetector::new(&self.config, self.sample_rate)?;
        let mut segments = Vec::new();
        let mut start = 0;

        for (i, &x) in samples.iter().enumerate() {
            if detector.process(x)? {
                if i > start {
                    segments.push(TransientSegment {
                        start,
                        len: i - start,
                    });
                }
                start = i;
            }
        }
        if samples.len() > start {
            segments.push(TransientSegment {
                start,
                len: samples.len() - start,
            });
        }
        Ok(segments)
    }

    /// Relocate every segment of `samples` for a stretch by `ratio`.
    pub fn relocate(&self, samples: &[f64], ratio: f64) -> Result<Vec<f64>> {
        ensure_positive("stretch ratio", ratio)?;
        let out_len = (samples.len() as f64 * ratio).ceil() as usize;
        let mut output = vec![0.0; out_len];
        let segments = self.segments(samples)?;

        let mut overlapping = 0usize;
        let mut written_to = 0usize;
        for segment in &segments {
            let dest = segment.destination(ratio);
            if dest >= out_len {
                continue;
            }
            if dest < written_to {
                overlapping += 1;
            }
            let taper = tukey(segment.len, self.config.taper_alpha);
            place_segment(
                &mut output,
                &samples[segment.start..segment.end()],
                dest,
                &taper,
                self.config.overlap,
            );
            written_to = written_to.max(dest + segment.len);
        }

        debug!(
            segments = segments.len(),
            overlapping,
            ratio,
            output_len = out_len,
            "transients relocated"
        );
        Ok(output)
    }
}

/// Write `source * taper` at `dest`, truncated at the end of `output`.
fn place_segment(
    output: &mut [f64],
    source: &[f64],
    dest: usize,
    taper: &[f64],
    policy: OverlapPolicy,
) {
    if dest >= output.len() {
        return;
    }
    let end = (dest + source.len()).min(output.len());
    for ((o, &x), &w) in output[dest..end].iter_mut().zip(source).zip(taper) {
        match policy {
            OverlapPolicy::Mix => *o += x * w,
            OverlapPolicy::Overwrite => *o = x * w,
        }
    }
}

/// Relocate transients with the default detector settings.
pub fn relocate_transients(transients: &[f64], sample_rate: f64, ratio: f64) -> Result<Vec<f64>> {
    TransientRelocator::new(sample_rate, RelocatorConfig::default())?.relocate(transients, ratio)
}
