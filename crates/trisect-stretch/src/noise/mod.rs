//! Noise stream processing: white-noise carriers and envelope morphing.

mod generator;
mod morph;

pub use generator::NoiseGenerator;
pub use morph::{
    hold_last_frame, imprint, morph_noise, stretch_frames, stretched_frame_count,
    NoiseMorphConfig, NoiseMorpher,
};
