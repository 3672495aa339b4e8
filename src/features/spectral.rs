//! Per-frame spectral descriptors
//!
//! Centroid, rolloff and bandwidth from a magnitude spectrum, RMS and
//! zero-crossing rate from the time-domain frame, and MFCCs from a mel
//! filterbank.

use super::stats::EPSILON;
use super::stft::bin_frequency;

/// Fraction of spectral energy below the rolloff frequency
pub const ROLLOFF_PERCENT: f32 = 0.85;

/// Number of mel bands feeding the cepstrum
pub const N_MELS: usize = 40;

/// Number of cepstral coefficients kept
pub const N_MFCC: usize = 13;

/// Spectral shape of one frame (all in Hz, 0.0 for silent frames)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralShape {
    /// Magnitude-weighted mean frequency
    pub centroid: f32,
    /// Frequency below which [`ROLLOFF_PERCENT`] of the magnitude lies
    pub rolloff: f32,
    /// Magnitude-weighted standard deviation around the centroid
    pub bandwidth: f32,
}

/// Compute centroid, rolloff and bandwidth of a magnitude spectrum
pub fn spectral_shape(magnitudes: &[f32], sample_rate: u32, frame_size: usize) -> SpectralShape {
    let total: f32 = magnitudes.iter().sum();
    if total <= EPSILON {
        return SpectralShape::default();
    }

    let freq = |bin: usize| bin_frequency(bin, sample_rate, frame_size);

    let centroid = magnitudes
        .iter()
        .enumerate()
        .map(|(bin, &m)| freq(bin) * m)
        .sum::<f32>()
        / total;

    let bandwidth = (magnitudes
        .iter()
        .enumerate()
        .map(|(bin, &m)| {
            let d = freq(bin) - centroid;
            m * d * d
        })
        .sum::<f32>()
        / total)
        .sqrt();

    let target = ROLLOFF_PERCENT * total;
    let mut cumulative = 0.0f32;
    let mut rolloff = freq(magnitudes.len().saturating_sub(1));
    for (bin, &m) in magnitudes.iter().enumerate() {
        cumulative += m;
        if cumulative >= target {
            rolloff = freq(bin);
            break;
        }
    }

    SpectralShape {
        centroid,
        rolloff,
        bandwidth,
    }
}

/// Root-mean-square amplitude of a frame
pub fn frame_rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|&x| x * x).sum::<f32>() / frame.len() as f32).sqrt()
}

/// Fraction of adjacent sample pairs that change sign
pub fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank followed by a DCT-II
///
/// Built once per track; [`Mfcc::compute`] is then applied to every frame.
pub struct Mfcc {
    /// Sparse filters: `(first_bin, weights)` per mel band
    filters: Vec<(usize, Vec<f32>)>,
    /// Orthonormal DCT-II basis, `N_MFCC x N_MELS`
    dct: Vec<[f32; N_MELS]>,
}

impl Mfcc {
    /// Build the filterbank for a given STFT geometry (0 Hz to Nyquist)
    pub fn new(sample_rate: u32, frame_size: usize) -> Self {
        let n_bins = frame_size / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;
        let mel_max = hz_to_mel(nyquist);

        let edges: Vec<f32> = (0..N_MELS + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (N_MELS + 1) as f32))
            .collect();

        let filters = (0..N_MELS)
            .map(|band| {
                let (lo, center, hi) = (edges[band], edges[band + 1], edges[band + 2]);
                let mut first = None;
                let mut weights = Vec::new();
                for bin in 0..n_bins {
                    let f = bin_frequency(bin, sample_rate, frame_size);
                    let w = if f > lo && f <= center {
                        (f - lo) / (center - lo).max(EPSILON)
                    } else if f > center && f < hi {
                        (hi - f) / (hi - center).max(EPSILON)
                    } else {
                        0.0
                    };
                    if w > 0.0 {
                        first.get_or_insert(bin);
                        weights.push(w);
                    } else if first.is_some() {
                        break;
                    }
                }
                (first.unwrap_or(0), weights)
            })
            .collect();

        let dct = (0..N_MFCC)
            .map(|k| {
                let scale = if k == 0 {
                    (1.0 / N_MELS as f32).sqrt()
                } else {
                    (2.0 / N_MELS as f32).sqrt()
                };
                let mut row = [0.0f32; N_MELS];
                for (n, v) in row.iter_mut().enumerate() {
                    *v = scale
                        * (std::f32::consts::PI * k as f32 * (n as f32 + 0.5) / N_MELS as f32).cos();
                }
                row
            })
            .collect();

        Self { filters, dct }
    }

    /// Cepstral coefficients of one magnitude frame
    pub fn compute(&self, magnitudes: &[f32]) -> [f32; N_MFCC] {
        let mut log_mel = [0.0f32; N_MELS];
        for (out, (first, weights)) in log_mel.iter_mut().zip(&self.filters) {
            let energy: f32 = weights
                .iter()
                .enumerate()
                .filter_map(|(i, &w)| magnitudes.get(first + i).map(|&m| w * m * m))
                .sum();
            *out = (energy + EPSILON).ln();
        }

        let mut coeffs = [0.0f32; N_MFCC];
        for (c, row) in coeffs.iter_mut().zip(&self.dct) {
            *c = row.iter().zip(&log_mel).map(|(a, b)| a * b).sum();
        }
        coeffs
    }
}
