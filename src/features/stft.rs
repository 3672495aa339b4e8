//! Short-time Fourier transform
//!
//! Hann-windowed, non-centered frames. Frames are produced one at a time so
//! callers can reduce each spectrum to a handful of features without holding
//! the full spectrogram in memory.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::AnalysisError;

/// Frame-by-frame magnitude spectrum generator
pub struct Stft {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// Plan an STFT
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `frame_size` or `hop_size` is zero.
    pub fn new(frame_size: usize, hop_size: usize) -> Result<Self, AnalysisError> {
        if frame_size == 0 || hop_size == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid STFT parameters: frame_size={}, hop_size={}",
                frame_size, hop_size
            )));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        Ok(Self {
            frame_size,
            hop_size,
            window: hann_window(frame_size),
            fft,
        })
    }

    /// Number of magnitude bins per frame (`frame_size / 2 + 1`)
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples
    ///
    /// Signals shorter than one frame still produce a single zero-padded frame.
    pub fn num_frames(&self, len: usize) -> usize {
        if len <= self.frame_size {
            1
        } else {
            1 + (len - self.frame_size) / self.hop_size
        }
    }

    /// Run the transform, calling `f(frame_index, time_domain_frame, magnitudes)`
    /// for every frame
    ///
    /// `time_domain_frame` is the raw (unwindowed, zero-padded) frame.
    pub fn process<F>(&self, samples: &[f32], mut f: F)
    where
        F: FnMut(usize, &[f32], &[f32]),
    {
        let n_frames = self.num_frames(samples.len());
        let n_bins = self.num_bins();

        let mut raw = vec![0.0f32; self.frame_size];
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.frame_size];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut magnitudes = vec![0.0f32; n_bins];

        for idx in 0..n_frames {
            let start = idx * self.hop_size;
            let end = (start + self.frame_size).min(samples.len());

            raw.iter_mut().for_each(|x| *x = 0.0);
            if start < end {
                raw[..end - start].copy_from_slice(&samples[start..end]);
            }

            for ((c, &x), &w) in buffer.iter_mut().zip(&raw).zip(&self.window) {
                *c = Complex::new(x * w, 0.0);
            }
            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (m, c) in magnitudes.iter_mut().zip(&buffer[..n_bins]) {
                *m = c.norm();
            }

            f(idx, &raw, &magnitudes);
        }
    }
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        .collect()
}

/// Center frequency of an FFT bin in Hz
pub fn bin_frequency(bin: usize, sample_rate: u32, frame_size: usize) -> f32 {
    bin as f32 * sample_rate as f32 / frame_size as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        let stft = Stft::new(2048, 512).unwrap();
        assert_eq!(stft.num_frames(0), 1);
        assert_eq!(stft.num_frames(2048), 1);
        assert_eq!(stft.num_frames(2048 + 512), 2);
        assert_eq!(stft.num_frames(22050), 1 + (22050 - 2048) / 512);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sr = 22050;
        let freq = 1000.0;
        let samples: Vec<f32> = (0..sr)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let stft = Stft::new(2048, 512).unwrap();

        let mut peak_bins = Vec::new();
        stft.process(&samples, |_, _, mags| {
            let (bin, _) = mags
                .iter()
                .enumerate()
                .fold((0, 0.0f32), |acc, (i, &m)| if m > acc.1 { (i, m) } else { acc });
            peak_bins.push(bin);
        });

        let expected = (freq * 2048.0 / sr as f32).round() as usize;
        assert!(peak_bins.iter().all(|&b| (b as i32 - expected as i32).abs() <= 1));
    }

    #[test]
    fn test_rejects_zero_hop() {
        assert!(Stft::new(2048, 0).is_err());
    }
}
