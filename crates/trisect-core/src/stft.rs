//! Short-time Fourier transform and weighted overlap-add inverse.
//!
//! ## Framing
//!
//! Frames are centred: the signal is zero-padded by `fft_size / 2` on both
//! sides and a signal of `len` samples yields `1 + ceil(len / hop)` frames,
//! so the last frame centre is at or past the last sample. The inverse
//! overlap-adds windowed frames, divides by the summed squared window, drops
//! the padding and returns exactly the requested number of samples. An
//! unmodified spectrogram therefore reconstructs its input to floating-point
//! precision whenever `hop <= fft_size / 2`.
//!
//! The divisor is clamped to [`MIN_COVERAGE`] of its peak. For a Hann window
//! with `hop <= fft_size / 2` the summed squared window never drops below
//! half its peak between the first and last frame centres, so the clamp only
//! acts on the thin outer edges, where modified frames would otherwise be
//! divided by almost nothing.

use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::error::{Error, Result};
use crate::grid::{RealGrid, SpectralGrid};
use crate::window::hann;

/// Squared-window sums at or below this are treated as uncovered samples.
pub const NORM_FLOOR: f64 = 1e-10;

/// Smallest overlap-add divisor, as a fraction of the peak squared-window sum.
pub const MIN_COVERAGE: f64 = 0.25;

/// One-sided complex spectrogram: `fft_size / 2 + 1` bins per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    fft_size: usize,
    data: SpectralGrid<Complex64>,
}

impl Spectrogram {
    /// Wrap a complex grid produced outside [`Stft::forward`].
    pub fn from_grid(fft_size: usize, data: SpectralGrid<Complex64>) -> Result<Self> {
        if data.bins() != fft_size / 2 + 1 {
            return Err(Error::Computation(format!(
                "spectrogram has {} bins, expected {} for FFT size {}",
                data.bins(),
                fft_size / 2 + 1,
                fft_size
            )));
        }
        Ok(Self { fft_size, data })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bins(&self) -> usize {
        self.data.bins()
    }

    pub fn frames(&self) -> usize {
        self.data.frames()
    }

    pub fn grid(&self) -> &SpectralGrid<Complex64> {
        &self.data
    }

    pub fn magnitudes(&self) -> RealGrid {
        self.data.map(|c| c.norm())
    }

    /// Keep only the first `frames` frames.
    pub fn truncated(&self, frames: usize) -> Result<Spectrogram> {
        if frames > self.frames() {
            return Err(Error::Computation(format!(
                "cannot keep {} of {} frames",
                frames,
                self.frames()
            )));
        }
        let bins = self.bins();
        let data = self.data.values()[..bins * frames].to_vec();
        Ok(Self {
            fft_size: self.fft_size,
            data: SpectralGrid::from_frames(bins, frames, data)?,
        })
    }

    /// Multiply every cell by the matching real mask value.
    pub fn apply_mask(&self, mask: &RealGrid) -> Result<Spectrogram> {
        Ok(Self {
            fft_size: self.fft_size,
            data: self.data.zip_map(mask, |c, m| c * m)?,
        })
    }
}

/// STFT analysis/synthesis pair sharing one window and hop.
#[derive(Clone)]
pub struct Stft {
    fft_size: usize,
    hop: usize,
    window: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for Stft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stft")
            .field("fft_size", &self.fft_size)
            .field("hop", &self.hop)
            .finish()
    }
}

impl Stft {
    /// Periodic-Hann STFT.
    pub fn new(fft_size: usize, hop: usize) -> Result<Self> {
        Self::with_window(hann(fft_size), hop)
    }

    /// STFT with a caller-supplied analysis/synthesis window whose length is
    /// the FFT size.
    pub fn with_window(window: Vec<f64>, hop: usize) -> Result<Self> {
        let fft_size = window.len();
        if fft_size < 2 || fft_size % 2 != 0 {
            return Err(Error::InvalidParameter(format!(
                "FFT size must be even and at least 2, got {}",
                fft_size
            )));
        }
        if hop == 0 || hop > fft_size {
            return Err(Error::InvalidParameter(format!(
                "hop must be in 1..={}, got {}",
                fft_size, hop
            )));
        }
        if window.iter().any(|w| !w.is_finite()) {
            return Err(Error::invalid("window contains non-finite values"));
        }

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        Ok(Self {
            fft_size,
            hop,
            window,
            forward,
            inverse,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn window(&self) -> &[f64] {
        &self.window
    }

    /// Number of frames [`Stft::forward`] produces for `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len.div_ceil(self.hop)
    }

    fn padded_len(&self, frames: usize) -> usize {
        (frames - 1) * self.hop + self.fft_size
    }

    /// Analyse `samples` into a one-sided spectrogram.
    pub fn forward(&self, samples: &[f64]) -> Result<Spectrogram> {
        let n = self.fft_size;
        let pad = n / 2;
        let frames = self.frame_count(samples.len());
        let bins = self.bins();

        let mut padded = vec![0.0; self.padded_len(frames).max(pad + samples.len())];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let mut data = Vec::with_capacity(bins * frames);
        let mut buffer = vec![Complex64::new(0.0, 0.0); n];
        let mut scratch = vec![Complex64::new(0.0, 0.0); self.forward.get_inplace_scratch_len()];

        for frame in 0..frames {
            let start = frame * self.hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex64::new(padded[start + i] * self.window[i], 0.0);
            }
            self.forward.process_with_scratch(&mut buffer, &mut scratch);
            data.extend_from_slice(&buffer[..bins]);
        }

        Spectrogram::from_grid(n, SpectralGrid::from_frames(bins, frames, data)?)
    }

    /// Resynthesise `len` samples from a one-sided spectrogram.
    pub fn inverse(&self, spectrogram: &Spectrogram, len: usize) -> Result<Vec<f64>> {
        let n = self.fft_size;
        if spectrogram.fft_size() != n {
            return Err(Error::Computation(format!(
                "spectrogram FFT size {} does not match STFT size {}",
                spectrogram.fft_size(),
                n
            )));
        }
        let frames = spectrogram.frames();
        if frames == 0 {
            return Ok(vec![0.0; len]);
        }

        let bins = self.bins();
        let total = self.padded_len(frames);
        let mut out = vec![0.0; total];
        let mut norm = vec![0.0; total];
        let mut buffer = vec![Complex64::new(0.0, 0.0); n];
        let mut scratch = vec![Complex64::new(0.0, 0.0); self.inverse.get_inplace_scratch_len()];
        let scale = 1.0 / n as f64;

        for frame in 0..frames {
            let half = spectrogram.grid().frame(frame);
            buffer[..bins].copy_from_slice(half);
            // Hermitian mirror for a real-valued frame
            for k in bins..n {
                buffer[k] = half[n - k].conj();
            }
            self.inverse.process_with_scratch(&mut buffer, &mut scratch);

            let start = frame * self.hop;
            for (i, &w) in self.window.iter().enumerate() {
                out[start + i] += buffer[i].re * scale * w;
                norm[start + i] += w * w;
            }
        }

        let peak = norm.iter().fold(0.0f64, |m, &v| m.max(v));
        let floor = (peak * MIN_COVERAGE).max(NORM_FLOOR);
        for (o, &w2) in out.iter_mut().zip(norm.iter()) {
            *o /= w2.max(floor);
        }

        let pad = n / 2;
        let mut result: Vec<f64> = out.into_iter().skip(pad).take(len).collect();
        result.resize(len, 0.0);
        Ok(result)
    }
}
