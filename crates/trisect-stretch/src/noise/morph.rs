//! Noise morphing.
//!
//! The noise stream's spectral envelope is stretched in time by linear
//! interpolation between log-magnitude frames, then imprinted on the
//! spectrum of fresh white noise. Only the envelope is kept; the phases come
//! from the new carrier, which avoids the periodic phase artifacts a phase
//! vocoder leaves on noise.
//!
//! The carrier spectrum is divided by `sqrt(sum(w^2))` times the carrier's
//! RMS, so every bin has unit expected magnitude and the output level is set
//! by the target envelope alone.
//!
//! When the stretched envelope ends before the output does, its last frame is
//! held until the frame centres reach the final output sample.

use tracing::{debug, warn};
use trisect_core::{
    ensure_positive, rms, window::power_sum, Error, RealGrid, Result, Spectrogram, Stft,
};

use super::generator::NoiseGenerator;

/// Morpher configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NoiseMorphConfig {
    pub fft_size: usize,
    pub hop: usize,
    /// Carrier seed; `None` draws a fresh carrier every call
    pub seed: Option<u64>,
    /// Magnitudes are clamped to this before taking logarithms
    pub magnitude_floor: f64,
}

impl Default for NoiseMorphConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop: 1024,
            seed: None,
            magnitude_floor: 1e-10,
        }
    }
}

/// Number of frames a `frames`-frame envelope occupies after stretching by
/// `ratio`: `ceil(frames * ratio)`, one fewer when `ratio > 1` so the
/// stretched envelope lines up with the STFT of a `(frames - 1) * hop * ratio`
/// sample carrier.
pub fn stretched_frame_count(frames: usize, ratio: f64) -> usize {
    let count = (frames as f64 * ratio).ceil() as usize;
    if ratio > 1.0 {
        count.saturating_sub(1).max(1)
    } else {
        count.max(1)
    }
}

/// Resample a log-magnitude envelope along time.
///
/// Input frame `j` sits at output position `j * ratio`; output frames
/// between two mapped input frames blend them linearly. The first and last
/// output frames are exact copies of the first and last input frames (a
/// single output frame copies the first).
pub fn stretch_frames(frames: &RealGrid, ratio: f64) -> Result<RealGrid> {
    ensure_positive("stretch ratio", ratio)?;
    let in_frames = frames.frames();
    if in_frames == 0 {
        return Err(Error::Precondition("envelope has no frames".into()));
    }
    let bins = frames.bins();
    let out_frames = stretched_frame_count(in_frames, ratio);
    let mut out = RealGrid::filled(bins, out_frames, 0.0);

    for i in 0..out_frames {
        let dest = out.frame_mut(i);
        if in_frames == 1 {
            dest.copy_from_slice(frames.frame(0));
            continue;
        }
        let pos = i as f64 / ratio;
        let prev = (pos.floor() as usize).min(in_frames - 2);
        let frac = (pos - prev as f64).clamp(0.0, 1.0);
        let a = frames.frame(prev);
        let b = frames.frame(prev + 1);
        for ((d, &x), &y) in dest.iter_mut().zip(a).zip(b) {
            *d = x * (1.0 - frac) + y * frac;
        }
    }

    out.frame_mut(out_frames - 1)
        .copy_from_slice(frames.frame(in_frames - 1));
    out.frame_mut(0).copy_from_slice(frames.frame(0));
    Ok(out)
}

/// Extend `envelope` to `frames` frames by repeating its last frame.
///
/// Envelopes that already have at least `frames` frames are returned as is.
pub fn hold_last_frame(envelope: &RealGrid, frames: usize) -> Result<RealGrid> {
    let have = envelope.frames();
    if have == 0 {
        return Err(Error::Precondition("envelope has no frames".into()));
    }
    if have >= frames {
        return Ok(envelope.clone());
    }
    let bins = envelope.bins();
    let last = envelope.frame(have - 1);
    let mut data = Vec::with_capacity(bins * frames);
    data.extend_from_slice(envelope.values());
    for _ in have..frames {
        data.extend_from_slice(last);
    }
    RealGrid::from_frames(bins, frames, data)
}

/// Multiply a carrier spectrum by a target magnitude envelope.
///
/// The two must agree in shape; a mismatch is reported instead of being
/// truncated.
pub fn imprint(target: &RealGrid, carrier: &Spectrogram) -> Result<Spectrogram> {
    if target.frames() != carrier.frames() || target.bins() != carrier.bins() {
        return Err(Error::Computation(format!(
            "carrier has {} frames x {} bins but the target envelope has {} x {}",
            carrier.frames(),
            carrier.bins(),
            target.frames(),
            target.bins()
        )));
    }
    carrier.apply_mask(target)
}

/// Time-scales noise by re-synthesising its stretched envelope.
#[derive(Debug, Clone)]
pub struct NoiseMorpher {
    config: NoiseMorphConfig,
    stft: Stft,
}

impl NoiseMorpher {
    pub fn new(config: NoiseMorphConfig) -> Result<Self> {
        ensure_positive("magnitude floor", config.magnitude_floor)?;
        let stft = Stft::new(config.fft_size, config.hop)?;
        Ok(Self { config, stft })
    }

    pub fn config(&self) -> &NoiseMorphConfig {
        &self.config
    }

    /// `10 * log10(max(|X|, floor))` of every cell.
    pub fn log_magnitudes(&self, spectrum: &Spectrogram) -> RealGrid {
        let floor = self.config.magnitude_floor;
        spectrum.magnitudes().map(|m| 10.0 * m.max(floor).log10())
    }

    /// Unit-magnitude noise spectrum with exactly `frames` frames.
    pub fn carrier(&self, frames: usize, generator: &mut NoiseGenerator) -> Result<Spectrogram> {
        if frames == 0 {
            return Err(Error::Precondition("carrier needs at least one frame".into()));
        }
        let noise = generator.white(frames * self.config.hop);
        let level = rms(&noise);
        if level <= 0.0 {
            return Err(Error::Computation("carrier noise is silent".into()));
        }
        let scale = 1.0 / (power_sum(self.stft.window()).sqrt() * level);
        let spectrum = self.stft.forward(&noise)?.truncated(frames)?;
        spectrum.apply_mask(&RealGrid::filled(spectrum.bins(), frames, scale))
    }

    /// Stretch `noise` by `ratio`; the result has `round(len * ratio)`
    /// samples.
    pub fn morph(&self, noise: &[f64], ratio: f64) -> Result<Vec<f64>> {
        ensure_positive("stretch ratio", ratio)?;
        if noise.len() < self.config.fft_size {
            return Err(Error::Precondition(format!(
                "noise stream has {} samples, shorter than the {}-sample analysis window",
                noise.len(),
                self.config.fft_size
            )));
        }

        let out_len = (noise.len() as f64 * ratio).round() as usize;
        if out_len == 0 {
            return Ok(Vec::new());
        }

        let spectrum = self.stft.forward(noise)?;
        let envelope = stretch_frames(&self.log_magnitudes(&spectrum), ratio)?;
        let envelope = hold_last_frame(&envelope, self.stft.frame_count(out_len))?;
        let target = envelope.map(|db| 10f64.powf(db / 10.0));
        target.ensure_finite("stretched envelope")?;

        if spectrum.magnitudes().values().iter().all(|&m| m <= self.config.magnitude_floor) {
            warn!("noise stream is silent; morphing yields floor-level noise");
        }

        let mut generator = NoiseGenerator::new(self.config.seed);
        let carrier = self.carrier(target.frames(), &mut generator)?;
        let shaped = imprint(&target, &carrier)?;

        debug!(
            ratio,
            frames = spectrum.frames(),
            stretched_frames = target.frames(),
            out_len,
            "noise morphed"
        );
        self.stft.inverse(&shaped, out_len)
    }
}

/// Morph `noise` with the default analysis settings.
pub fn morph_noise(noise: &[f64], ratio: f64) -> Result<Vec<f64>> {
    NoiseMorpher::new(NoiseMorphConfig::default())?.morph(noise, ratio)
}
