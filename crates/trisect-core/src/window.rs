//! Analysis and taper windows.

use std::f64::consts::PI;

/// Periodic Hann window of length `n` (the DFT-even form used for STFT
/// analysis): `w[i] = 0.5 * (1 - cos(2*pi*i/n))`.
pub fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}

/// Symmetric Tukey (tapered cosine) window.
///
/// `alpha` is the fraction of the window inside the cosine tapers:
/// `alpha <= 0` gives a rectangle, `alpha >= 1` a symmetric Hann window.
/// Lengths 0 and 1 return an empty window and `[1.0]`.
pub fn tukey(n: usize, alpha: f64) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    if alpha <= 0.0 {
        return vec![1.0; n];
    }
    let m = (n - 1) as f64;
    if alpha >= 1.0 {
        return (0..n)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / m).cos()))
            .collect();
    }

    let width = (alpha * m / 2.0).floor() as usize;
    (0..n)
        .map(|i| {
            let x = i as f64;
            if i <= width {
                0.5 * (1.0 + (PI * (-1.0 + 2.0 * x / (alpha * m))).cos())
            } else if i < n - width - 1 {
                1.0
            } else {
                0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * x / (alpha * m))).cos())
            }
        })
        .collect()
}

/// Sum of squared window samples.
pub fn power_sum(window: &[f64]) -> f64 {
    window.iter().map(|w| w * w).sum()
}
