//! Transientness and smooth sines/transients/noise soft masks.

use std::f64::consts::FRAC_PI_2;

use trisect_core::{Error, RealGrid, Result};

/// Largest tolerated deviation of `S + T + N` from one.
pub const MASK_SUM_TOLERANCE: f64 = 1e-9;

/// Soft-mask thresholds `0 < lower < upper < 1`.
///
/// Ratios at or above `upper` map to 1, ratios below `lower` map to 0, and
/// the band in between follows a `sin^2` ramp.
///
/// With `lower < 0.5` a cell can get both masks above zero, and the noise
/// mask `1 - S - T` goes negative wherever they add up to more than one. With
/// `upper <= 0.5` a balanced cell gets `S = T = 1` and `N = -1`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Thresholds {
    upper: f64,
    lower: f64,
}

impl Thresholds {
    /// `upper` is G1, `lower` is G2.
    ///
    /// Thresholds below 0.5 are accepted even though they can drive the noise
    /// mask negative.
    pub fn new(upper: f64, lower: f64) -> Result<Self> {
        if !(upper.is_finite() && lower.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "thresholds must be finite, got G1={} G2={}",
                upper, lower
            )));
        }
        if !(0.0 < lower && lower < upper && upper < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "thresholds must satisfy 0 < G2 < G1 < 1, got G1={} G2={}",
                upper, lower
            )));
        }
        Ok(Self { upper, lower })
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Soft mask value for ratio `r`.
    #[inline]
    pub fn mask(&self, r: f64) -> f64 {
        if r >= self.upper {
            1.0
        } else if r < self.lower {
            0.0
        } else {
            let s = (FRAC_PI_2 / (self.upper - self.lower) * (r - self.lower)).sin();
            s * s
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            upper: 0.8,
            lower: 0.7,
        }
    }
}

/// `Rt = Xv / (Xv + Xh + eps)`.
#[inline]
pub fn transientness(vertical: f64, horizontal: f64) -> f64 {
    vertical / (vertical + horizontal + f64::EPSILON)
}

/// Per-cell masks for one separation round.
///
/// `sines` and `transients` stay in `[0, 1]`. `noise` is the remainder
/// `1 - S - T` and is negative wherever `S + T > 1`. That needs a lower
/// threshold below 0.5; at the defaults (0.8/0.7) it never happens.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftMasks {
    pub sines: RealGrid,
    pub transients: RealGrid,
    pub noise: RealGrid,
}

impl SoftMasks {
    /// Build masks from the two directional median estimates.
    ///
    /// Fails with [`Error::Computation`] if any value is non-finite or the
    /// three masks stop summing to one.
    pub fn from_estimates(
        vertical: &RealGrid,
        horizontal: &RealGrid,
        thresholds: Thresholds,
    ) -> Result<Self> {
        let rt = vertical.zip_map(horizontal, transientness)?;
        rt.ensure_finite("transientness")?;

        let transients = rt.map(|r| thresholds.mask(r));
        let sines = rt.map(|r| thresholds.mask(1.0 - r));
        let noise = sines.zip_map(&transients, |s, t| 1.0 - s - t)?;

        let masks = Self {
            sines,
            transients,
            noise,
        };
        masks.check_partition()?;
        Ok(masks)
    }

    /// Verify `S + T + N == 1` within [`MASK_SUM_TOLERANCE`] everywhere.
    pub fn check_partition(&self) -> Result<()> {
        for (name, grid) in [
            ("sines mask", &self.sines),
            ("transients mask", &self.transients),
            ("noise mask", &self.noise),
        ] {
            grid.ensure_finite(name)?;
        }
        let bins = self.sines.bins();
        let cells = self
            .sines
            .values()
            .iter()
            .zip(self.transients.values())
            .zip(self.noise.values());
        for (i, ((s, t), n)) in cells.enumerate() {
            let deviation = (s + t + n - 1.0).abs();
            if deviation > MASK_SUM_TOLERANCE {
                return Err(Error::Computation(format!(
                    "mask sum deviates from 1 by {:e} at bin {}, frame {}",
                    deviation,
                    i % bins,
                    i / bins
                )));
            }
        }
        Ok(())
    }

    /// `T + N`, the part left after removing sines.
    pub fn residual(&self) -> Result<RealGrid> {
        self.transients.zip_map(&self.noise, |t, n| t + n)
    }

    /// `S + N`, everything that is not transient.
    pub fn non_transient(&self) -> Result<RealGrid> {
        self.sines.zip_map(&self.noise, |s, n| s + n)
    }
}
