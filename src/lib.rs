//! # Trisect - Sines/Transients/Noise Time-Scale and Pitch Modification
//!
//! Splits a mono signal into three additive streams and transforms each with
//! a method suited to it, so stretching keeps transients sharp and noise
//! textured.
//!
//! ## Architecture
//!
//! Trisect is an umbrella crate that coordinates:
//! - **trisect-core** - Signal, STFT/ISTFT, windows, error type
//! - **trisect-analysis** - STN separator (median filters, soft masks)
//! - **trisect-dsp** - Envelope followers and the transient relocator
//! - **trisect-stretch** - Noise morpher, phase vocoder, sinc resampler
//!
//! ## Quick Start
//!
//! ```ignore
//! use trisect::prelude::*;
//!
//! let engine = TrisectEngine::builder().build()?;
//! let input = Signal::new(samples, 44100.0)?;
//!
//! let longer = engine.process(&input, Operation::TimeStretch(1.5))?;
//! let higher = engine.process(&input, Operation::PitchShift(3.0))?;
//! ```
//!
//! ## Feature Flags
//!
//! - `serialization` - serde derives on configuration types

mod builder;
mod engine;

pub use builder::TrisectEngineBuilder;
pub use engine::{Operation, ProcessOptions, ProcessOutput, Streams, TrisectEngine};

/// Re-export of trisect-core for direct access
pub use trisect_core as core;
/// Re-export of trisect-analysis
pub use trisect_analysis as analysis;
/// Re-export of trisect-dsp
pub use trisect_dsp as dsp;
/// Re-export of trisect-stretch
pub use trisect_stretch as stretch;

pub use trisect_core::{Error, Result, Signal};

// Component-level entry points
pub use trisect_analysis::{separate, StnComponents, StnConfig, StnSeparator, Thresholds};
pub use trisect_dsp::{relocate_transients, OverlapPolicy, RelocatorConfig, TransientRelocator};
pub use trisect_stretch::{
    morph_noise, NoiseMorphConfig, NoiseMorpher, PhaseVocoder, PitchShifter, ResampleQuality,
    SampleRateConverter, SincResampler, TimeStretcher,
};

/// Process `signal` with a default engine.
pub fn process(signal: &Signal, operation: Operation) -> Result<Signal> {
    TrisectEngine::builder().build()?.process(signal, operation)
}

/// Convenient imports
pub mod prelude {
    pub use crate::{
        Error, Operation, OverlapPolicy, ProcessOptions, Result, Signal, StnComponents,
        TrisectEngine,
    };
}
