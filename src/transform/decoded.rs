use ndarray::{Array2, Axis};

use crate::utils::audio_math::{clamp_sample, db_to_amplitude};

/// Fully decoded audio held as a `(channels, frames)` matrix of normalized
/// `f32` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Array2<f32>,
    sample_rate: u32,
    bits_per_sample: u16,
}

impl DecodedAudio {
    /// Wrap a `(channels, frames)` matrix.
    ///
    /// `bits_per_sample` records the source resolution so the encoder can
    /// keep it; pass 16 when unknown.
    pub fn new(samples: Array2<f32>, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            samples,
            sample_rate,
            bits_per_sample,
        }
    }

    /// Build from interleaved samples (`LRLRLR...`).
    ///
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn from_interleaved(
        interleaved: &[f32],
        channels: usize,
        sample_rate: u32,
        bits_per_sample: u16,
    ) -> Self {
        let channels = channels.max(1);
        let frames = interleaved.len() / channels;
        let samples =
            Array2::from_shape_fn((channels, frames), |(ch, frame)| interleaved[frame * channels + ch]);
        Self::new(samples, sample_rate, bits_per_sample)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.samples.len_of(Axis(0))
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len_of(Axis(1))
    }

    /// Sample rate in Hz.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Source resolution in bits.
    pub const fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// The sample matrix.
    pub fn samples(&self) -> &Array2<f32> {
        &self.samples
    }

    /// Absolute peak across all channels.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()))
    }

    /// Apply a uniform gain in decibels. Samples are clipped to full scale.
    pub fn apply_gain(mut self, gain_db: f64) -> Self {
        let factor = db_to_amplitude(gain_db) as f32;
        self.samples.mapv_inplace(|s| clamp_sample(s * factor));
        self
    }

    /// Iterate samples in interleaved order.
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        // (frames, channels) view, walked row by row
        self.samples.t().into_iter().copied()
    }
}
