//! Directional median filters over magnitude spectrograms.
//!
//! Filtering along frequency (vertical) keeps broadband, percussive energy;
//! filtering along time (horizontal) keeps stationary, tonal energy. Windows
//! are centred and the grid is treated as zero outside its edges.

use trisect_core::{Error, RealGrid, Result};

/// Smallest odd filter length covering `n` neighbours plus the centre cell.
pub fn odd_filter_length(n: usize) -> usize {
    (n + 1) | 1
}

/// Median along the bin axis, independently for every frame.
pub fn vertical_median(mags: &RealGrid, length: usize) -> Result<RealGrid> {
    check_length(length)?;
    let mut out = RealGrid::filled(mags.bins(), mags.frames(), 0.0);
    let mut filter = WindowedMedian::new(length);
    for frame in 0..mags.frames() {
        filter.run(mags.frame(frame), out.frame_mut(frame));
    }
    Ok(out)
}

/// Median along the frame axis, independently for every bin.
pub fn horizontal_median(mags: &RealGrid, length: usize) -> Result<RealGrid> {
    check_length(length)?;
    let frames = mags.frames();
    let mut out = RealGrid::filled(mags.bins(), frames, 0.0);
    let mut filter = WindowedMedian::new(length);
    let mut row_out = vec![0.0; frames];
    for bin in 0..mags.bins() {
        filter.run(&mags.bin_row(bin), &mut row_out);
        for (frame, &v) in row_out.iter().enumerate() {
            out.set(bin, frame, v);
        }
    }
    Ok(out)
}

/// Centred median of a single sequence, zero-padded at both ends.
pub fn median_filter(values: &[f64], length: usize) -> Result<Vec<f64>> {
    check_length(length)?;
    let mut out = vec![0.0; values.len()];
    WindowedMedian::new(length).run(values, &mut out);
    Ok(out)
}

fn check_length(length: usize) -> Result<()> {
    if length == 0 || length % 2 == 0 {
        return Err(Error::InvalidParameter(format!(
            "median filter length must be odd and non-zero, got {}",
            length
        )));
    }
    Ok(())
}

/// Reusable buffers for one filter length.
struct WindowedMedian {
    length: usize,
    padded: Vec<f64>,
    scratch: Vec<f64>,
}

impl WindowedMedian {
    fn new(length: usize) -> Self {
        Self {
            length,
            padded: Vec::new(),
            scratch: Vec::with_capacity(length),
        }
    }

    fn run(&mut self, input: &[f64], output: &mut [f64]) {
        let half = self.length / 2;
        self.padded.clear();
        self.padded.resize(input.len() + 2 * half, 0.0);
        self.padded[half..half + input.len()].copy_from_slice(input);

        for (i, out) in output.iter_mut().enumerate().take(input.len()) {
            self.scratch.clear();
            self.scratch
                .extend_from_slice(&self.padded[i..i + self.length]);
            let (_, median, _) = self
                .scratch
                .select_nth_unstable_by(half, |a, b| a.total_cmp(b));
            *out = *median;
        }
    }
}
