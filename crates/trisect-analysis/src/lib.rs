//! # trisect-analysis
//!
//! Sines/transients/noise separation of mono signals:
//! - **Median filters**: vertical (across frequency) and horizontal (across
//!   time) median estimates of a magnitude spectrogram
//! - **Soft masks**: transientness ratio and the smooth `sin^2` mask triple
//! - **STN separator**: two-round decomposition into additive streams
//!
//! ## Example
//!
//! ```rust
//! use trisect_analysis::{StnConfig, StnSeparator};
//! use trisect_core::Signal;
//!
//! let signal = Signal::new(vec![0.0; 16384], 44100.0).unwrap();
//! let parts = StnSeparator::new(StnConfig::default())
//!     .unwrap()
//!     .separate(&signal)
//!     .unwrap();
//! assert_eq!(parts.sines.len(), 16384);
//! ```

pub mod mask;
pub mod median;
pub mod stn;

pub use mask::{transientness, SoftMasks, Thresholds, MASK_SUM_TOLERANCE};
pub use median::{horizontal_median, median_filter, odd_filter_length, vertical_median};
pub use stn::{
    filter_lengths, separate, FilterLengths, StnAnalysis, StnComponents, StnConfig, StnSeparator,
};
