//! # trisect-stretch
//!
//! Per-stream transforms applied after decomposition:
//!
//! - [`NoiseMorpher`] - time-scales noise by stretching its spectral
//!   envelope and re-synthesising it on fresh white noise
//! - [`PhaseVocoder`] - phase-propagating time-stretch and pitch-shift for
//!   the sinusoidal stream
//! - [`SincResampler`] - arbitrary-ratio sample rate conversion
//!
//! The vocoder and resampler sit behind the [`TimeStretcher`],
//! [`PitchShifter`] and [`SampleRateConverter`] traits so other backends can
//! replace them.

pub mod capability;
pub mod noise;
pub mod resample;
pub mod vocoder;

pub use capability::{
    semitones_to_ratio, PitchShifter, SampleRateConverter, TimeStretcher, MAX_SEMITONES,
};
pub use noise::{
    hold_last_frame, imprint, morph_noise, stretch_frames, stretched_frame_count, NoiseGenerator,
    NoiseMorphConfig, NoiseMorpher,
};
pub use resample::{ResampleQuality, SincResampler};
pub use vocoder::PhaseVocoder;
