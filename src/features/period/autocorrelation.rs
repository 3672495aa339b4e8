//! Autocorrelation-based tempo estimation
//!
//! Finds periodicity in the onset strength envelope using FFT-accelerated
//! autocorrelation.
//!
//! # Algorithm
//!
//! 1. Remove the envelope mean
//! 2. Compute autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`
//! 3. Weight every lag inside the BPM range by a log-normal tempo prior
//!    centred on [`PRIOR_CENTER_BPM`] (one octave standard deviation)
//! 4. Refine the best lag with parabolic interpolation and convert it to BPM:
//!    `BPM = 60 * frames_per_second / lag`
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::TempoEstimate;
use crate::error::AnalysisError;
use crate::features::stats::{mean, EPSILON};

/// Center of the tempo prior in BPM
pub const PRIOR_CENTER_BPM: f32 = 120.0;

/// Standard deviation of the tempo prior in octaves
pub const PRIOR_OCTAVE_STD: f32 = 1.0;

/// Tempo reported when the envelope carries no periodicity
pub const FALLBACK_BPM: f32 = 120.0;

/// Estimate the dominant tempo of an onset strength envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength (one value per frame)
/// * `frames_per_second` - Envelope frame rate (`sample_rate / hop_size`)
/// * `min_bpm` - Minimum BPM to consider (default: 60.0)
/// * `max_bpm` - Maximum BPM to consider (default: 180.0)
///
/// # Returns
///
/// Tempo estimate; a flat or too-short envelope yields [`FALLBACK_BPM`] with
/// confidence 0.0
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a non-positive frame rate or an
/// inverted BPM range.
///
/// # Example
///
/// ```
/// use tunescore::features::period::autocorrelation::estimate_tempo;
///
/// // one impulse every 20 frames at 40 frames/s = 120 BPM
/// let envelope: Vec<f32> = (0..800).map(|i| if i % 20 == 0 { 1.0 } else { 0.0 }).collect();
/// let tempo = estimate_tempo(&envelope, 40.0, 60.0, 180.0)?;
/// assert!((tempo.bpm - 120.0).abs() < 1.0);
/// # Ok::<(), tunescore::AnalysisError>(())
/// ```
pub fn estimate_tempo(
    envelope: &[f32],
    frames_per_second: f32,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<TempoEstimate, AnalysisError> {
    log::debug!(
        "Estimating tempo: {} frames at {:.2} fps, range=[{:.1}, {:.1}] BPM",
        envelope.len(),
        frames_per_second,
        min_bpm,
        max_bpm
    );

    if frames_per_second <= 0.0 {
        return Err(AnalysisError::InvalidInput(
            "Frame rate must be positive".to_string(),
        ));
    }
    if min_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    let m = mean(envelope);
    let centered: Vec<f32> = envelope.iter().map(|&x| x - m).collect();
    let acf = compute_autocorrelation_fft(&centered);

    let energy = acf.first().copied().unwrap_or(0.0);
    if energy <= EPSILON {
        log::debug!("Flat onset envelope, falling back to {} BPM", FALLBACK_BPM);
        return Ok(TempoEstimate::fallback());
    }

    let lag_min = ((60.0 * frames_per_second) / max_bpm).ceil().max(1.0) as usize;
    let lag_max = ((60.0 * frames_per_second) / min_bpm).floor() as usize;
    if lag_min >= lag_max || lag_max + 1 >= acf.len() {
        log::debug!(
            "Envelope too short for lag range [{}, {}] (ACF length {})",
            lag_min,
            lag_max,
            acf.len()
        );
        return Ok(TempoEstimate::fallback());
    }

    let weighted = |lag: usize| {
        let bpm = 60.0 * frames_per_second / lag as f32;
        acf[lag].max(0.0) * tempo_prior(bpm)
    };

    let best_lag = (lag_min..=lag_max)
        .max_by(|&a, &b| {
            weighted(a)
                .partial_cmp(&weighted(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(lag_min);

    if acf[best_lag] <= EPSILON {
        return Ok(TempoEstimate::fallback());
    }

    let refined_lag = parabolic_peak(&acf, best_lag);
    let bpm = (60.0 * frames_per_second / refined_lag).clamp(min_bpm, max_bpm);
    let confidence = (acf[best_lag] / energy).clamp(0.0, 1.0);

    log::debug!(
        "Tempo {:.2} BPM (lag {:.2} frames, confidence {:.3})",
        bpm,
        refined_lag,
        confidence
    );

    Ok(TempoEstimate { bpm, confidence })
}

/// Log-normal tempo prior, 1.0 at [`PRIOR_CENTER_BPM`]
pub fn tempo_prior(bpm: f32) -> f32 {
    let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_OCTAVE_STD;
    (-0.5 * octaves * octaves).exp()
}

/// Fractional position of the peak at `idx` from its two neighbours
fn parabolic_peak(signal: &[f32], idx: usize) -> f32 {
    if idx == 0 || idx + 1 >= signal.len() {
        return idx as f32;
    }
    let (a, b, c) = (signal[idx - 1], signal[idx], signal[idx + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() <= EPSILON {
        return idx as f32;
    }
    let offset = (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
    idx as f32 + offset
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²)
///
/// # Arguments
///
/// * `signal` - Input signal
///
/// # Returns
///
/// Autocorrelation function (same length as input, lag 0 first)
pub fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    // FFT size: next power of 2 >= 2*n (zero-padding avoids circular wrap)
    let fft_size = (2 * n).next_power_of_two();

    let mut fft_input: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft_input.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut fft_input);

    for x in &mut fft_input {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut fft_input);

    let scale = 1.0 / (fft_size as f32);
    fft_input[..n].iter().map(|x| x.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_train(period: usize, len: usize) -> Vec<f32> {
        (0..len).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_autocorrelation_of_impulse_train() {
        let acf = compute_autocorrelation_fft(&impulse_train(10, 100));
        assert!(acf[10] > acf[5]);
        assert!(acf[0] >= acf[10]);
    }

    #[test]
    fn test_estimate_tempo_100_bpm() {
        // 43.066 fps (22050 / 512); 100 BPM = 25.84 frames per beat
        let fps = 22050.0 / 512.0;
        let mut env = vec![0.0f32; 1500];
        let period = 60.0 * fps / 100.0;
        let mut t = 0.0f32;
        while (t as usize) < env.len() {
            env[t as usize] = 1.0;
            t += period;
        }
        let tempo = estimate_tempo(&env, fps, 60.0, 180.0).unwrap();
        assert!((tempo.bpm - 100.0).abs() < 3.0, "got {}", tempo.bpm);
        assert!(tempo.confidence > 0.3);
    }

    #[test]
    fn test_flat_envelope_falls_back() {
        let tempo = estimate_tempo(&[0.5; 500], 43.0, 60.0, 180.0).unwrap();
        assert_eq!(tempo.bpm, FALLBACK_BPM);
        assert_eq!(tempo.confidence, 0.0);
    }

    #[test]
    fn test_invalid_range() {
        assert!(estimate_tempo(&[0.0; 10], 43.0, 180.0, 60.0).is_err());
    }

    #[test]
    fn test_prior_peaks_at_center() {
        assert!((tempo_prior(120.0) - 1.0).abs() < 1e-6);
        assert!(tempo_prior(60.0) < tempo_prior(100.0));
    }
}
