//! Dominant pitch tracking
//!
//! Per frame, the strongest spectral peak between [`MIN_PITCH_HZ`] and
//! [`MAX_PITCH_HZ`] is taken as the dominant pitch and refined with parabolic
//! interpolation. A frame counts as voiced when its peak magnitude reaches
//! [`VOICING_RATIO`] of the strongest in-band peak of the whole track, so the
//! voicing decision is made after all frames are seen.

use super::stft::bin_frequency;

/// Lowest tracked pitch in Hz
pub const MIN_PITCH_HZ: f32 = 80.0;

/// Highest tracked pitch in Hz
pub const MAX_PITCH_HZ: f32 = 1000.0;

/// Voicing threshold relative to the track's strongest in-band peak
pub const VOICING_RATIO: f32 = 0.1;

/// Strongest in-band peak of one magnitude frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchPeak {
    /// Interpolated frequency in Hz
    pub frequency: f32,
    /// Peak magnitude
    pub magnitude: f32,
}

/// Strongest peak between [`MIN_PITCH_HZ`] and [`MAX_PITCH_HZ`]
///
/// Returns `None` when the band carries no energy.
pub fn dominant_peak(magnitudes: &[f32], sample_rate: u32, frame_size: usize) -> Option<PitchPeak> {
    let bin_hz = bin_frequency(1, sample_rate, frame_size);
    let lo = ((MIN_PITCH_HZ / bin_hz).ceil() as usize).max(1);
    let hi = ((MAX_PITCH_HZ / bin_hz).floor() as usize).min(magnitudes.len().saturating_sub(2));
    if lo > hi {
        return None;
    }

    let (bin, magnitude) = (lo..=hi)
        .map(|b| (b, magnitudes[b]))
        .fold((lo, 0.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });
    if magnitude <= 0.0 {
        return None;
    }

    let (a, b, c) = (magnitudes[bin - 1], magnitudes[bin], magnitudes[bin + 1]);
    let denom = a - 2.0 * b + c;
    let offset = if denom.abs() > f32::EPSILON {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    Some(PitchPeak {
        frequency: (bin as f32 + offset) * bin_hz,
        magnitude,
    })
}

/// Apply the track-relative voicing rule to per-frame peaks
///
/// # Returns
///
/// Frequency in Hz for voiced frames, `None` otherwise (same length as input)
pub fn voiced_track(peaks: &[Option<PitchPeak>]) -> Vec<Option<f32>> {
    let max = peaks
        .iter()
        .flatten()
        .map(|p| p.magnitude)
        .fold(0.0f32, f32::max);
    let threshold = VOICING_RATIO * max;

    peaks
        .iter()
        .map(|p| match p {
            Some(peak) if max > 0.0 && peak.magnitude >= threshold => Some(peak.frequency),
            _ => None,
        })
        .collect()
}

/// Frequency to pitch class (0 = C) using A4 = `reference_hz`
pub fn frequency_to_pitch_class(frequency: f32, reference_hz: f32) -> usize {
    let midi = 69.0 + 12.0 * (frequency / reference_hz).log2();
    (midi.round() as i32).rem_euclid(12) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stft::Stft;

    #[test]
    fn test_dominant_peak_of_sine() {
        let sr = 22050;
        let samples: Vec<f32> = (0..4096)
            .map(|i| (2.0 * std::f32::consts::PI * 330.0 * i as f32 / sr as f32).sin())
            .collect();
        let stft = Stft::new(2048, 512).unwrap();
        let mut peaks = Vec::new();
        stft.process(&samples, |_, _, mags| peaks.push(dominant_peak(mags, sr, 2048)));

        for p in peaks.into_iter().flatten() {
            assert!((p.frequency - 330.0).abs() < 6.0, "got {}", p.frequency);
        }
    }

    #[test]
    fn test_voicing_is_relative() {
        let loud = PitchPeak { frequency: 220.0, magnitude: 10.0 };
        let soft = PitchPeak { frequency: 440.0, magnitude: 0.5 };
        let track = voiced_track(&[Some(loud), Some(soft), None]);
        assert_eq!(track, vec![Some(220.0), None, None]);
    }

    #[test]
    fn test_pitch_class() {
        assert_eq!(frequency_to_pitch_class(440.0, 440.0), 9);
        assert_eq!(frequency_to_pitch_class(261.63, 440.0), 0);
    }
}
