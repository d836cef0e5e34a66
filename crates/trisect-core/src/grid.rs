//! Dense frequency x time grids.

use crate::error::{Error, Result};

/// A `bins x frames` grid stored frame by frame, so each analysis frame is a
/// contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralGrid<T> {
    bins: usize,
    frames: usize,
    data: Vec<T>,
}

/// Real-valued grid (magnitudes, masks, log spectra).
pub type RealGrid = SpectralGrid<f64>;

impl<T: Copy> SpectralGrid<T> {
    /// Grid filled with `value`.
    pub fn filled(bins: usize, frames: usize, value: T) -> Self {
        Self {
            bins,
            frames,
            data: vec![value; bins * frames],
        }
    }

    /// Build a grid from frame-major data (`data.len() == bins * frames`).
    pub fn from_frames(bins: usize, frames: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != bins * frames {
            return Err(Error::Computation(format!(
                "grid data has {} values, expected {} bins x {} frames",
                data.len(),
                bins,
                frames
            )));
        }
        Ok(Self { bins, frames, data })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn get(&self, bin: usize, frame: usize) -> T {
        self.data[frame * self.bins + bin]
    }

    #[inline]
    pub fn set(&mut self, bin: usize, frame: usize, value: T) {
        self.data[frame * self.bins + bin] = value;
    }

    /// All bins of one frame.
    pub fn frame(&self, frame: usize) -> &[T] {
        &self.data[frame * self.bins..(frame + 1) * self.bins]
    }

    pub fn frame_mut(&mut self, frame: usize) -> &mut [T] {
        &mut self.data[frame * self.bins..(frame + 1) * self.bins]
    }

    /// One bin across all frames (copied, since bins are strided).
    pub fn bin_row(&self, bin: usize) -> Vec<T> {
        (0..self.frames).map(|f| self.get(bin, f)).collect()
    }

    pub fn values(&self) -> &[T] {
        &self.data
    }

    pub fn same_shape<U>(&self, other: &SpectralGrid<U>) -> bool {
        self.bins == other.bins && self.frames == other.frames
    }

    /// Element-wise transform.
    pub fn map<U, F: Fn(T) -> U>(&self, f: F) -> SpectralGrid<U> {
        SpectralGrid {
            bins: self.bins,
            frames: self.frames,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Element-wise combination with a grid of identical shape.
    pub fn zip_map<U: Copy, V, F: Fn(T, U) -> V>(
        &self,
        other: &SpectralGrid<U>,
        f: F,
    ) -> Result<SpectralGrid<V>> {
        if !self.same_shape(other) {
            return Err(Error::Computation(format!(
                "grid shape mismatch: {}x{} vs {}x{}",
                self.bins, self.frames, other.bins, other.frames
            )));
        }
        Ok(SpectralGrid {
            bins: self.bins,
            frames: self.frames,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}

impl RealGrid {
    /// Fail with [`Error::Computation`] naming `what` if any cell is NaN or
    /// infinite.
    pub fn ensure_finite(&self, what: &str) -> Result<()> {
        match self.data.iter().position(|v| !v.is_finite()) {
            None => Ok(()),
            Some(i) => Err(Error::Computation(format!(
                "{} is not finite at bin {}, frame {}",
                what,
                i % self.bins,
                i / self.bins
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_is_frame_major() {
        let g = SpectralGrid::from_frames(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(g.get(0, 1), 4);
        assert_eq!(g.frame(0), &[1, 2, 3]);
        assert_eq!(g.bin_row(2), vec![3, 6]);
    }

    #[test]
    fn test_from_frames_checks_len() {
        assert!(matches!(
            SpectralGrid::from_frames(3, 2, vec![0.0; 5]),
            Err(Error::Computation(_))
        ));
    }

    #[test]
    fn test_zip_map_rejects_shape_mismatch() {
        let a = RealGrid::filled(4, 3, 1.0);
        let b = RealGrid::filled(4, 2, 1.0);
        assert!(a.zip_map(&b, |x, y| x * y).is_err());
        let c = a.zip_map(&a, |x, y| x + y).unwrap();
        assert!(c.values().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_ensure_finite_reports_position() {
        let mut g = RealGrid::filled(4, 3, 0.0);
        assert!(g.ensure_finite("mask").is_ok());
        g.set(2, 1, f64::NAN);
        let err = g.ensure_finite("mask").unwrap_err();
        assert!(err.to_string().contains("bin 2, frame 1"), "{}", err);
    }
}
