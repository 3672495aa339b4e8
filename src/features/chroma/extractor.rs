//! Chroma vector extraction
//!
//! Folds FFT magnitude frames into 12-element pitch-class profiles.
//!
//! # Algorithm
//!
//! 1. Each FFT bin between [`MIN_CHROMA_HZ`] and [`MAX_CHROMA_HZ`] is converted
//!    to a fractional MIDI pitch relative to the reference tuning
//! 2. Hard mapping assigns the bin's power to the nearest semitone; soft mapping
//!    spreads it over neighbouring semitones with a Gaussian of width `sigma`
//! 3. The frame is optionally sharpened, then normalized to a maximum of 1.0
//!
//! The bin-to-pitch-class table is computed once per track.

use super::normalization::{normalize_max, sharpen_chroma};
use super::Chroma;
use crate::config::AnalysisConfig;
use crate::features::stft::bin_frequency;

/// Lowest frequency folded into chroma (C2)
pub const MIN_CHROMA_HZ: f32 = 65.0;

/// Highest frequency folded into chroma
pub const MAX_CHROMA_HZ: f32 = 5000.0;

/// Precomputed bin -> pitch-class mapping
pub struct ChromaExtractor {
    /// `(bin, [(pitch_class, weight)])` for every bin inside the chroma range
    mapping: Vec<(usize, Vec<(usize, f32)>)>,
    sharpening_power: f32,
}

impl ChromaExtractor {
    /// Build the mapping for an STFT geometry
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `frame_size` - FFT frame size
    /// * `config` - Supplies tuning reference, soft-mapping and sharpening settings
    pub fn new(sample_rate: u32, frame_size: usize, config: &AnalysisConfig) -> Self {
        let n_bins = frame_size / 2 + 1;
        let mut mapping = Vec::new();

        for bin in 1..n_bins {
            let freq = bin_frequency(bin, sample_rate, frame_size);
            if !(MIN_CHROMA_HZ..=MAX_CHROMA_HZ).contains(&freq) {
                continue;
            }

            let midi = 69.0 + 12.0 * (freq / config.center_frequency).log2();
            let nearest = midi.round();

            let weights = if config.soft_chroma_mapping {
                let sigma = config.soft_mapping_sigma;
                let raw: Vec<(usize, f32)> = (-1..=1)
                    .map(|offset| {
                        let semitone = nearest + offset as f32;
                        let d = (midi - semitone) / sigma;
                        (pitch_class(semitone), (-0.5 * d * d).exp())
                    })
                    .collect();
                let total: f32 = raw.iter().map(|(_, w)| w).sum();
                raw.into_iter().map(|(pc, w)| (pc, w / total)).collect()
            } else {
                vec![(pitch_class(nearest), 1.0)]
            };

            mapping.push((bin, weights));
        }

        Self {
            mapping,
            sharpening_power: config.chroma_sharpening_power,
        }
    }

    /// Chroma vector of one magnitude frame
    ///
    /// Silent frames produce an all-zero vector.
    pub fn extract(&self, magnitudes: &[f32]) -> Chroma {
        let mut chroma = [0.0f32; 12];
        for (bin, weights) in &self.mapping {
            let Some(&m) = magnitudes.get(*bin) else {
                continue;
            };
            let power = m * m;
            for &(pc, w) in weights {
                chroma[pc] += power * w;
            }
        }

        if (self.sharpening_power - 1.0).abs() > f32::EPSILON {
            chroma = sharpen_chroma(&chroma, self.sharpening_power);
        }
        normalize_max(&chroma)
    }
}

fn pitch_class(midi: f32) -> usize {
    (midi as i32).rem_euclid(12) as usize
}
