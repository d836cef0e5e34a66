//! Tolerance constants for decomposition and stretching tests.
//!
//! Separation is a soft-mask process, so most checks are energy shares or
//! decibel figures rather than sample-exact comparisons.

/// Floating point rounding through a forward/inverse STFT pair.
pub const RECONSTRUCTION_EPSILON: f64 = 1e-9;

/// Upper bound for the reconstruction error of a full separation, in dB
/// relative to the input energy.
pub const RECONSTRUCTION_DB: f64 = -60.0;

/// Minimum share of a component's energy that must land in its own stream.
pub const SEPARATION_SHARE: f64 = 0.95;

/// Soft masks must partition unity to within this.
pub const MASK_SUM_EPSILON: f64 = 1e-9;

/// Silence threshold (~-80dB).
pub const SILENCE_THRESHOLD: f64 = 1e-4;
