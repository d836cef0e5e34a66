//! Mono sample buffers tagged with their sample rate.

use crate::error::{ensure_positive, Error, Result};

/// An immutable mono signal.
///
/// Samples are real-valued and nominally in [-1, 1], but no range is
/// enforced: intermediate streams routinely exceed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: f64,
}

impl Signal {
    /// Wrap `samples` recorded at `sample_rate` Hz.
    ///
    /// Fails if the rate is not a positive finite number or any sample is
    /// NaN/infinite.
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Result<Self> {
        ensure_positive("sample rate", sample_rate)?;
        if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "sample {} is not finite ({})",
                i, samples[i]
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Silent signal of `len` samples.
    pub fn silence(len: usize, sample_rate: f64) -> Result<Self> {
        Self::new(vec![0.0; len], sample_rate)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    /// Sum of squared samples.
    pub fn energy(&self) -> f64 {
        energy(&self.samples)
    }

    /// New signal at the same rate with different samples.
    pub fn with_samples(&self, samples: Vec<f64>) -> Result<Self> {
        Self::new(samples, self.sample_rate)
    }
}

/// Sum of squared samples.
pub fn energy(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s * s).sum()
}

/// Root mean square, zero for an empty slice.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        (energy(samples) / samples.len() as f64).sqrt()
    }
}

/// Sample-wise sum of `streams`, each zero-padded to the longest.
pub fn mix_padded(streams: &[&[f64]]) -> Vec<f64> {
    let len = streams.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![0.0; len];
    for stream in streams {
        for (o, s) in out.iter_mut().zip(stream.iter()) {
            *o += s;
        }
    }
    out
}

/// Zero-pad or truncate `samples` to exactly `len`.
pub fn fit_length(mut samples: Vec<f64>, len: usize) -> Vec<f64> {
    samples.resize(len, 0.0);
    samples
}
