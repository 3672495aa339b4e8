//! Perceptual loudness measurement (ITU-R BS.1770-4)
//!
//! Integrated loudness in LUFS plus sample-peak and RMS levels in dBFS.
//!
//! # Example
//!
//! ```
//! use tunescore::preprocessing::loudness::LoudnessMeter;
//!
//! let sample_rate = 48000;
//! let samples: Vec<f32> = (0..sample_rate * 2)
//!     .map(|i| (2.0 * std::f32::consts::PI * 997.0 * i as f32 / sample_rate as f32).sin())
//!     .collect();
//!
//! let meter = LoudnessMeter::default();
//! let lufs = meter.integrated_loudness(&samples, sample_rate)?;
//! assert!((lufs + 3.0).abs() < 0.5);
//! # Ok::<(), tunescore::AnalysisError>(())
//! ```

use crate::error::AnalysisError;

/// Numerical stability epsilon for divisions and logarithms
const EPSILON: f64 = 1e-12;

/// Absolute gate threshold (ITU-R BS.1770-4)
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate offset below the absolute-gated loudness
pub const RELATIVE_GATE_LU: f64 = -10.0;

/// Gating block duration
const BLOCK_DURATION_MS: f64 = 400.0;

/// Overlap between consecutive gating blocks
const BLOCK_OVERLAP: f64 = 0.75;

/// Biquad section in transposed Direct Form II
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    fn from_coefficients(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// K-weighting filter (ITU-R BS.1770-4 Annex 1)
///
/// Stage 1 is a high shelf (+4 dB above ~1.7 kHz) modelling the acoustic
/// effect of the head; stage 2 is the RLB high-pass (~38 Hz). Coefficients are
/// derived from the analog prototypes so any sample rate is supported.
struct KWeightingFilter {
    shelf: Biquad,
    high_pass: Biquad,
}

impl KWeightingFilter {
    fn new(sample_rate: u32) -> Self {
        let fs = sample_rate as f64;

        // Stage 1: high shelf
        let gain_db = 3.999_843_853_973_347;
        let q = 0.707_175_236_955_419_3;
        let fc = 1_681.974_450_955_531_9;
        let a = 10f64.powf(gain_db / 40.0);
        let w0 = 2.0 * std::f64::consts::PI * fc / fs;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let sqrt_a = a.sqrt();
        let shelf = Biquad::from_coefficients(
            [
                a * ((a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                a * ((a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
            ],
            [
                (a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                (a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
            ],
        );

        // Stage 2: RLB high-pass
        let q = 0.500_327_037_325_395_3;
        let fc = 38.135_470_876_139_82;
        let w0 = 2.0 * std::f64::consts::PI * fc / fs;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let high_pass = Biquad::from_coefficients(
            [(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        );

        Self { shelf, high_pass }
    }

    fn process(&mut self, sample: f64) -> f64 {
        self.high_pass.process(self.shelf.process(sample))
    }
}

/// Loudness meter configuration and measurement entry point
///
/// The meter holds no per-track state; one instance can be shared across
/// threads and reused for every track.
#[derive(Debug, Clone)]
pub struct LoudnessMeter {
    block_duration_ms: f64,
    block_overlap: f64,
}

impl Default for LoudnessMeter {
    fn default() -> Self {
        Self {
            block_duration_ms: BLOCK_DURATION_MS,
            block_overlap: BLOCK_OVERLAP,
        }
    }
}

impl LoudnessMeter {
    /// Integrated loudness in LUFS of a mono signal
    ///
    /// Algorithm:
    /// 1. Apply K-weighting filter
    /// 2. Mean square over 400 ms blocks with 75% overlap
    /// 3. Absolute gate at -70 LUFS
    /// 4. Relative gate 10 LU below the absolute-gated loudness
    /// 5. Integrate surviving blocks
    ///
    /// Returns `f32::NEG_INFINITY` when every block is below the absolute gate.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for empty input or a zero sample rate.
    pub fn integrated_loudness(&self, samples: &[f32], sample_rate: u32) -> Result<f32, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
        }

        let mut filter = KWeightingFilter::new(sample_rate);
        let filtered: Vec<f64> = samples.iter().map(|&s| filter.process(s as f64)).collect();

        let block_size = ((sample_rate as f64 * self.block_duration_ms / 1000.0) as usize).max(1);
        let step = ((block_size as f64 * (1.0 - self.block_overlap)) as usize).max(1);

        let block_energies: Vec<f64> = if filtered.len() <= block_size {
            vec![mean_square(&filtered)]
        } else {
            (0..=(filtered.len() - block_size) / step)
                .map(|i| mean_square(&filtered[i * step..i * step + block_size]))
                .collect()
        };

        let absolute_linear = lufs_to_energy(ABSOLUTE_GATE_LUFS);
        let above_absolute: Vec<f64> = block_energies
            .iter()
            .copied()
            .filter(|&e| e > absolute_linear)
            .collect();

        if above_absolute.is_empty() {
            log::warn!("All audio blocks below LUFS gate threshold (-70 LUFS)");
            return Ok(f32::NEG_INFINITY);
        }

        let relative_threshold = energy_to_lufs(mean(&above_absolute)) + RELATIVE_GATE_LU;
        let relative_linear = lufs_to_energy(relative_threshold);
        let gated: Vec<f64> = above_absolute
            .into_iter()
            .filter(|&e| e > relative_linear)
            .collect();

        if gated.is_empty() {
            return Err(AnalysisError::NumericalError(
                "No blocks survived the relative gate".to_string(),
            ));
        }

        let lufs = energy_to_lufs(mean(&gated));
        log::debug!(
            "Integrated loudness: {:.2} LUFS ({} of {} blocks gated in)",
            lufs,
            gated.len(),
            block_energies.len()
        );
        Ok(lufs as f32)
    }

    /// Sample-peak level in dBFS (`-inf` for digital silence)
    pub fn peak_db(&self, samples: &[f32]) -> f32 {
        let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
        amplitude_to_db(peak)
    }

    /// RMS level in dBFS (`-inf` for digital silence)
    pub fn rms_db(&self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return f32::NEG_INFINITY;
        }
        let ms = samples.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>() / samples.len() as f64;
        amplitude_to_db(ms.sqrt() as f32)
    }
}

/// Linear amplitude to dBFS
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude as f64 > EPSILON {
        20.0 * amplitude.log10()
    } else {
        f32::NEG_INFINITY
    }
}

fn mean_square(block: &[f64]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }
    block.iter().map(|&x| x * x).sum::<f64>() / block.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len().max(1) as f64
}

fn energy_to_lufs(energy: f64) -> f64 {
    -0.691 + 10.0 * energy.max(EPSILON).log10()
}

fn lufs_to_energy(lufs: f64) -> f64 {
    10f64.powf((lufs + 0.691) / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amplitude: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_full_scale_sine_reads_minus_three() {
        // BS.1770 calibration: 0 dBFS 997 Hz sine in one channel reads -3.01 LUFS
        let samples = sine(997.0, 1.0, 3.0, 48000);
        let lufs = LoudnessMeter::default()
            .integrated_loudness(&samples, 48000)
            .unwrap();
        assert!((lufs + 3.01).abs() < 0.3, "got {:.2} LUFS", lufs);
    }

    #[test]
    fn test_gain_shifts_loudness() {
        let meter = LoudnessMeter::default();
        let loud = meter.integrated_loudness(&sine(997.0, 0.5, 3.0, 44100), 44100).unwrap();
        let quiet = meter.integrated_loudness(&sine(997.0, 0.05, 3.0, 44100), 44100).unwrap();
        assert!(((loud - quiet) - 20.0).abs() < 0.5, "difference {:.2}", loud - quiet);
    }

    #[test]
    fn test_silence_is_negative_infinity() {
        let lufs = LoudnessMeter::default()
            .integrated_loudness(&vec![0.0; 44100], 44100)
            .unwrap();
        assert_eq!(lufs, f32::NEG_INFINITY);
    }

    #[test]
    fn test_short_signal_single_block() {
        let samples = sine(997.0, 0.5, 0.1, 22050);
        let lufs = LoudnessMeter::default()
            .integrated_loudness(&samples, 22050)
            .unwrap();
        assert!(lufs.is_finite());
    }

    #[test]
    fn test_peak_and_rms() {
        let meter = LoudnessMeter::default();
        let samples = sine(440.0, 0.5, 1.0, 44100);
        assert!((meter.peak_db(&samples) + 6.02).abs() < 0.1);
        assert!((meter.rms_db(&samples) + 9.03).abs() < 0.1);
        assert_eq!(meter.peak_db(&[0.0; 16]), f32::NEG_INFINITY);
    }

    #[test]
    fn test_invalid_input() {
        let meter = LoudnessMeter::default();
        assert!(meter.integrated_loudness(&[], 44100).is_err());
        assert!(meter.integrated_loudness(&[0.1], 0).is_err());
    }
}
