//! # trisect-core
//!
//! Shared building blocks for sines/transients/noise processing:
//!
//! - [`Signal`] - immutable mono buffer with its sample rate
//! - [`SpectralGrid`] / [`Spectrogram`] - frequency x time grids
//! - [`Stft`] - centred STFT with weighted overlap-add inverse
//! - [`window`] - periodic Hann and Tukey windows
//! - [`Error`] / [`Result`] - the error type used across the workspace

pub mod error;
pub mod grid;
pub mod signal;
pub mod stft;
pub mod window;

pub use error::{ensure_positive, Error, Result};
pub use grid::{RealGrid, SpectralGrid};
pub use signal::{energy, fit_length, mix_padded, rms, Signal};
pub use stft::{Spectrogram, Stft, MIN_COVERAGE, NORM_FLOOR};

/// Complex sample type used in spectrograms.
pub use rustfft::num_complex::Complex64;
