//! Sample-rate conversion into the analysis domain
//!
//! High-quality sinc resampling via rubato. All DSP stages run at a single
//! fixed rate so frame and hop sizes mean the same thing for every track.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::waveform::Waveform;
use crate::error::AnalysisError;

/// Sinc interpolation filter length (input frames)
const SINC_LEN: usize = 256;

/// Resample a waveform to `target_rate`
///
/// Returns a clone when the rates already match. The output length is
/// `round(len * target / source)` so the duration is preserved.
///
/// # Algorithm
/// - Sinc interpolation with BlackmanHarris2 window
/// - 256-tap filter, 0.95 cutoff to prevent aliasing
/// - Input zero-padded by one filter length and the output shifted by the
///   resampler's delay, so the first and last input samples survive
///
/// # Errors
///
/// Returns `AnalysisError::Decode` if the resampler cannot be built or fails:
/// a buffer that cannot be brought to the analysis rate is unusable downstream.
pub fn resample(waveform: &Waveform, target_rate: u32) -> Result<Waveform, AnalysisError> {
    let source_rate = waveform.sample_rate();
    if source_rate == target_rate || waveform.is_empty() {
        return Waveform::with_source_channels(
            waveform.samples().to_vec(),
            target_rate,
            waveform.source_channels(),
        );
    }

    let num_frames = waveform.len();
    let ratio = target_rate as f64 / source_rate as f64;
    let expected = (num_frames as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    // Trailing zeros push the filter's delayed tail out of the single chunk
    let chunk = num_frames + SINC_LEN;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk, 1)
        .map_err(|e| AnalysisError::Decode(format!("Failed to create resampler: {}", e)))?;

    let mut padded = Vec::with_capacity(chunk);
    padded.extend_from_slice(waveform.samples());
    padded.resize(chunk, 0.0);

    let mut output = resampler
        .process(&[padded], None)
        .map_err(|e| AnalysisError::Decode(format!("Resampling failed: {}", e)))?;

    let delay = resampler.output_delay();
    let mut samples: Vec<f32> = output
        .pop()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(expected)
        .collect();
    if samples.len() < expected {
        log::warn!(
            "Resampler produced {} of {} frames, padding with silence",
            samples.len(),
            expected
        );
        samples.resize(expected, 0.0);
    }

    log::debug!(
        "Resampled {} frames ({} Hz) -> {} frames ({} Hz)",
        num_frames,
        source_rate,
        samples.len(),
        target_rate
    );

    Waveform::with_source_channels(samples, target_rate, waveform.source_channels())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_rates_match() {
        let w = Waveform::new(vec![0.1, 0.2, 0.3], 22050).unwrap();
        let r = resample(&w, 22050).unwrap();
        assert_eq!(r.samples(), w.samples());
    }

    #[test]
    fn test_downsample_preserves_duration() {
        let samples: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin() * 0.5)
            .collect();
        let w = Waveform::new(samples, 44100).unwrap();
        let r = resample(&w, 22050).unwrap();
        assert_eq!(r.sample_rate(), 22050);
        assert_eq!(r.len(), 22050);
        assert!((r.duration_seconds() - w.duration_seconds()).abs() < 1e-3);
    }

    #[test]
    fn test_constant_level_reaches_last_sample() {
        let w = Waveform::new(vec![0.5; 44100], 44100).unwrap();
        let r = resample(&w, 22050).unwrap();
        assert_eq!(r.len(), 22050);
        // skip the ramp-in; only the final edge samples may ring
        let n = r.len();
        for (i, &s) in r.samples()[..n - 3].iter().enumerate().skip(200) {
            assert!((s - 0.5).abs() < 0.06, "sample {} = {}", i, s);
        }
        let tail = &r.samples()[n - 10..];
        assert!(tail.iter().sum::<f32>() / 10.0 > 0.4);
        assert!(r.samples()[n - 1] > 0.1);
    }

    #[test]
    fn test_short_tone_keeps_energy() {
        let samples: Vec<f32> = (0..100)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44100.0).sin() * 0.5)
            .collect();
        let w = Waveform::new(samples, 44100).unwrap();
        let r = resample(&w, 22050).unwrap();
        assert_eq!(r.len(), 50);
        assert!(r.peak() > 0.2, "peak {}", r.peak());
    }
}
