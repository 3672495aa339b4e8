//! Mono sample buffer shared by every analysis stage

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Decoded mono waveform
///
/// Samples are `f32` in `[-1.0, 1.0]`. Construction replaces non-finite
/// samples with silence so downstream DSP never sees NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
    /// Channel count of the source before mixdown (1 for synthetic buffers)
    source_channels: usize,
}

impl Waveform {
    /// Wrap mono samples
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `sample_rate` is zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::with_source_channels(samples, sample_rate, 1)
    }

    pub(crate) fn with_source_channels(
        mut samples: Vec<f32>,
        sample_rate: u32,
        source_channels: usize,
    ) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
        }

        let non_finite = samples.iter().filter(|s| !s.is_finite()).count();
        if non_finite > 0 {
            log::warn!("Replacing {} non-finite samples with silence", non_finite);
            for s in samples.iter_mut().filter(|s| !s.is_finite()) {
                *s = 0.0;
            }
        }

        Ok(Self {
            samples,
            sample_rate,
            source_channels: source_channels.max(1),
        })
    }

    /// Mono samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels in the source before mixdown
    pub fn source_channels(&self) -> usize {
        self.source_channels
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds, derived from the buffer length
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Absolute peak amplitude
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    /// Samples between two times in seconds (clamped to the buffer)
    pub fn slice_seconds(&self, start: f32, end: f32) -> &[f32] {
        let to_index = |t: f32| ((t.max(0.0) * self.sample_rate as f32) as usize).min(self.samples.len());
        let (a, b) = (to_index(start), to_index(end));
        &self.samples[a..b.max(a)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_matches_length() {
        let w = Waveform::new(vec![0.0; 44100 * 3], 44100).unwrap();
        assert!((w.duration_seconds() - 3.0).abs() < 1e-6);
        assert_eq!(w.len(), 132300);
    }

    #[test]
    fn test_rejects_zero_rate() {
        assert!(Waveform::new(vec![0.0; 10], 0).is_err());
    }

    #[test]
    fn test_non_finite_samples_are_zeroed() {
        let w = Waveform::new(vec![0.5, f32::NAN, f32::INFINITY, -0.25], 8000).unwrap();
        assert_eq!(w.samples(), &[0.5, 0.0, 0.0, -0.25]);
        assert_eq!(w.peak(), 0.5);
    }

    #[test]
    fn test_slice_seconds_clamps() {
        let w = Waveform::new(vec![0.1; 100], 10).unwrap();
        assert_eq!(w.slice_seconds(2.0, 3.0).len(), 10);
        assert_eq!(w.slice_seconds(9.5, 20.0).len(), 5);
        assert!(w.slice_seconds(5.0, 1.0).is_empty());
    }
}
