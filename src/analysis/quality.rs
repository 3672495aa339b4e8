//! Musical execution quality
//!
//! Three independent assessments, each on a 0-100 scale:
//!
//! 1. **Pitch accuracy**: spread (in cents) of the dominant pitch around its
//!    median, banded, plus a small reward for frames with a detected pitch
//! 2. **Timing precision**: coefficient of variation of beat-to-beat intervals,
//!    banded, then lifted when the track looks like intentional syncopation
//!    rather than sloppy playing
//! 3. **Harmonic coherence**: peak-to-mean ratio of the summed chroma profile
//!    (clarity) blended with the stability of chroma over time (consistency)

use serde::{Deserialize, Serialize};

use crate::error::{ensure_range, AnalysisError};
use crate::features::bands::{at_least, below};
use crate::features::chroma::normalization::sum_chroma;
use crate::features::chroma::smoothing::smooth_chroma;
use crate::features::stats::{coefficient_of_variation, mean, median, pearson, std_dev, variance, EPSILON};
use crate::features::{Summary, TrackFeatures};

/// Weight of pitch accuracy in the overall quality
pub const PITCH_WEIGHT: f32 = 0.35;
/// Weight of timing precision in the overall quality
pub const TIMING_WEIGHT: f32 = 0.35;
/// Weight of harmonic coherence in the overall quality
pub const HARMONIC_WEIGHT: f32 = 0.30;

/// Cents standard deviation -> stability score
pub const PITCH_STABILITY_BANDS: [(f32, f32); 4] = [(30.0, 100.0), (50.0, 80.0), (80.0, 60.0), (120.0, 40.0)];
/// Stability score beyond the last band
pub const PITCH_STABILITY_FLOOR: f32 = 20.0;

/// Beat-interval CV -> timing score
pub const TIMING_CV_BANDS: [(f32, f32); 9] = [
    (0.02, 100.0),
    (0.04, 90.0),
    (0.06, 80.0),
    (0.08, 70.0),
    (0.10, 60.0),
    (0.12, 50.0),
    (0.15, 40.0),
    (0.20, 30.0),
    (0.25, 20.0),
];
/// Timing score for CV >= 0.25
pub const TIMING_CV_FLOOR: f32 = 15.0;
/// Timing score when too few beats were tracked
pub const TIMING_NEUTRAL: f32 = 50.0;

/// CV range in which syncopation is considered
pub const SYNCOPATION_CV_RANGE: (f32, f32) = (0.06, 0.12);
/// Bonus per production signal indicating intentional syncopation
pub const SYNCOPATION_BONUS: f32 = 10.0;
/// Cap on a syncopation-adjusted timing score
pub const SYNCOPATION_CAP: f32 = 85.0;

/// Peak/mean chroma ratio -> clarity score
pub const CLARITY_BANDS: [(f32, f32); 5] = [(4.0, 100.0), (3.0, 85.0), (2.5, 70.0), (2.0, 55.0), (1.5, 40.0)];
/// Clarity score below the last band
pub const CLARITY_FLOOR: f32 = 25.0;

/// Overall quality -> grade
pub const GRADE_BANDS: [(f32, QualityGrade); 4] = [
    (85.0, QualityGrade::Professional),
    (70.0, QualityGrade::Advanced),
    (55.0, QualityGrade::Intermediate),
    (40.0, QualityGrade::Developing),
];

/// Execution quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    /// Overall >= 85
    Professional,
    /// Overall >= 70
    Advanced,
    /// Overall >= 55
    Intermediate,
    /// Overall >= 40
    Developing,
    /// Below 40
    Amateur,
}

/// Pitch stability measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchAssessment {
    /// Combined pitch accuracy (0-100)
    pub score: f32,
    /// Banded stability score (0-100)
    pub stability: f32,
    /// Standard deviation of voiced pitch around its median, in cents
    pub cents_std: f32,
    /// Fraction of frames with a detected pitch
    pub voiced_ratio: f32,
}

/// Timing precision measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingAssessment {
    /// Timing precision (0-100)
    pub score: f32,
    /// Beat-interval coefficient of variation (`None` with fewer than 4 beats)
    pub interval_cv: Option<f32>,
    /// True when the syncopation lift was applied
    pub syncopation_adjusted: bool,
}

/// Harmonic coherence measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicAssessment {
    /// Harmonic coherence (0-100)
    pub score: f32,
    /// Peak-to-mean ratio of the summed chroma profile
    pub clarity_ratio: f32,
    /// Banded clarity score (0-100)
    pub clarity: f32,
    /// Stability of chroma over time (0-100)
    pub consistency: f32,
}

/// Execution quality of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Pitch accuracy (0-100)
    pub pitch_accuracy: f32,
    /// Timing precision (0-100)
    pub timing_precision: f32,
    /// Harmonic coherence (0-100)
    pub harmonic_coherence: f32,
    /// Weighted overall quality (0-100)
    pub overall_quality: f32,
    /// Grade of the overall quality
    pub quality_grade: QualityGrade,
    /// Pitch measurement details
    pub pitch: PitchAssessment,
    /// Timing measurement details
    pub timing: TimingAssessment,
    /// Harmonic measurement details
    pub harmonic: HarmonicAssessment,
}

impl QualityMetrics {
    /// Check every score is inside `[0, 100]`
    pub fn validate(&self) -> Result<(), AnalysisError> {
        ensure_range("pitch_accuracy", self.pitch_accuracy, 0.0, 100.0)?;
        ensure_range("timing_precision", self.timing_precision, 0.0, 100.0)?;
        ensure_range("harmonic_coherence", self.harmonic_coherence, 0.0, 100.0)?;
        ensure_range("overall_quality", self.overall_quality, 0.0, 100.0)
    }
}

/// Grade an overall quality score
pub fn quality_grade(overall: f32) -> QualityGrade {
    at_least(overall, &GRADE_BANDS, QualityGrade::Amateur)
}

/// Measure execution quality
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` for silent tracks and
/// `AnalysisError::NumericalError` if a score leaves its range.
pub fn analyze_quality(features: &TrackFeatures) -> Result<QualityMetrics, AnalysisError> {
    features.ensure_audible("quality")?;

    let pitch = pitch_accuracy(features);
    let timing = timing_precision(features);
    let harmonic = harmonic_coherence(features);

    let overall_quality = (PITCH_WEIGHT * pitch.score
        + TIMING_WEIGHT * timing.score
        + HARMONIC_WEIGHT * harmonic.score)
        .min(100.0);

    let metrics = QualityMetrics {
        pitch_accuracy: pitch.score,
        timing_precision: timing.score,
        harmonic_coherence: harmonic.score,
        overall_quality,
        quality_grade: quality_grade(overall_quality),
        pitch,
        timing,
        harmonic,
    };

    log::debug!(
        "Quality: pitch {:.1}, timing {:.1}, harmonic {:.1} -> {:.1} ({:?})",
        metrics.pitch_accuracy,
        metrics.timing_precision,
        metrics.harmonic_coherence,
        metrics.overall_quality,
        metrics.quality_grade
    );

    metrics.validate()?;
    Ok(metrics)
}

/// Pitch stability of the dominant pitch track
pub fn pitch_accuracy(features: &TrackFeatures) -> PitchAssessment {
    let voiced: Vec<f32> = features.pitch.iter().flatten().copied().collect();
    let voiced_ratio = if features.pitch.is_empty() {
        0.0
    } else {
        voiced.len() as f32 / features.pitch.len() as f32
    };

    let (cents_std, stability) = if voiced.len() < 2 {
        (0.0, PITCH_STABILITY_FLOOR)
    } else {
        let reference = median(&voiced);
        let cents: Vec<f32> = voiced
            .iter()
            .map(|&f| 1200.0 * (f / reference).log2())
            .collect();
        let spread = std_dev(&cents);
        (spread, below(spread, &PITCH_STABILITY_BANDS, PITCH_STABILITY_FLOOR))
    };

    let score = (0.8 * stability + 0.2 * voiced_ratio * 100.0).clamp(0.0, 100.0);

    PitchAssessment {
        score,
        stability,
        cents_std,
        voiced_ratio,
    }
}

/// Beat-interval regularity with the syncopation lift
pub fn timing_precision(features: &TrackFeatures) -> TimingAssessment {
    let intervals = features.beat_intervals();
    if intervals.len() < 3 {
        return TimingAssessment {
            score: TIMING_NEUTRAL,
            interval_cv: None,
            syncopation_adjusted: false,
        };
    }

    let cv = coefficient_of_variation(&intervals);
    let base = below(cv, &TIMING_CV_BANDS, TIMING_CV_FLOOR);

    let (lo, hi) = SYNCOPATION_CV_RANGE;
    if !(lo..hi).contains(&cv) {
        return TimingAssessment {
            score: base,
            interval_cv: Some(cv),
            syncopation_adjusted: false,
        };
    }

    let mut bonus: f32 = 0.0;
    if Summary::of(&features.rms).cv() < 0.5 {
        bonus += SYNCOPATION_BONUS;
    }
    if half_sequence_correlation(&intervals) >= 0.5 {
        bonus += SYNCOPATION_BONUS;
    }

    let score = if bonus > 0.0 {
        (base + bonus).min(SYNCOPATION_CAP).max(base)
    } else {
        base
    };

    log::debug!(
        "Timing CV {:.3} in syncopation band: base {:.0} + {:.0} -> {:.0}",
        cv,
        base,
        bonus,
        score
    );

    TimingAssessment {
        score,
        interval_cv: Some(cv),
        syncopation_adjusted: bonus > 0.0,
    }
}

/// Correlation of the first and second half of an interval sequence
///
/// A repeating rhythmic pattern correlates strongly with itself one phrase later.
pub fn half_sequence_correlation(intervals: &[f32]) -> f32 {
    let half = intervals.len() / 2;
    if half < 2 {
        return 0.0;
    }
    pearson(&intervals[..half], &intervals[half..2 * half])
}

/// Chroma clarity blended with temporal consistency
pub fn harmonic_coherence(features: &TrackFeatures) -> HarmonicAssessment {
    let profile = sum_chroma(&features.chroma);
    let profile_mean = mean(&profile);
    let clarity_ratio = if profile_mean <= EPSILON {
        0.0
    } else {
        profile.iter().copied().fold(0.0f32, f32::max) / profile_mean
    };
    let clarity = at_least(clarity_ratio, &CLARITY_BANDS, CLARITY_FLOOR);

    let smoothed = smooth_chroma(&features.chroma, 5);
    let bin_variance = mean(
        &(0..12)
            .map(|pc| variance(&smoothed.iter().map(|frame| frame[pc]).collect::<Vec<f32>>()))
            .collect::<Vec<f32>>(),
    );
    let consistency = 100.0 / (1.0 + 10.0 * bin_variance);

    HarmonicAssessment {
        score: (0.6 * clarity + 0.4 * consistency).clamp(0.0, 100.0),
        clarity_ratio,
        clarity,
        consistency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::io::Waveform;

    fn features_with_beats(beats: Vec<f32>) -> TrackFeatures {
        let w = Waveform::new(vec![0.1; 22050], 22050).unwrap();
        let mut f = TrackFeatures::compute(&w, &AnalysisConfig::default()).unwrap();
        f.beats = beats;
        f
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(quality_grade(85.0), QualityGrade::Professional);
        assert_eq!(quality_grade(84.9), QualityGrade::Advanced);
        assert_eq!(quality_grade(55.0), QualityGrade::Intermediate);
        assert_eq!(quality_grade(40.0), QualityGrade::Developing);
        assert_eq!(quality_grade(10.0), QualityGrade::Amateur);
    }

    #[test]
    fn test_perfect_timing() {
        let f = features_with_beats((0..20).map(|i| i as f32 * 0.5).collect());
        let t = timing_precision(&f);
        assert_eq!(t.score, 100.0);
        assert!(!t.syncopation_adjusted);
    }

    #[test]
    fn test_few_beats_is_neutral() {
        let f = features_with_beats(vec![0.0, 0.5, 1.0]);
        let t = timing_precision(&f);
        assert_eq!(t.score, TIMING_NEUTRAL);
        assert!(t.interval_cv.is_none());
    }

    #[test]
    fn test_syncopation_lift_for_repeating_pattern() {
        // long-short pattern repeated: CV ~0.095, halves correlate perfectly
        let pattern = [0.54f32, 0.46, 0.54, 0.46, 0.56, 0.44];
        let mut beats = vec![0.0f32];
        for _ in 0..4 {
            for &d in &pattern {
                let last = *beats.last().unwrap();
                beats.push(last + d);
            }
        }
        let f = features_with_beats(beats);
        let t = timing_precision(&f);
        let cv = t.interval_cv.unwrap();
        assert!((0.06..0.12).contains(&cv), "cv {}", cv);
        assert!(t.syncopation_adjusted);
        assert!(t.score <= SYNCOPATION_CAP);
        assert!(t.score > below(cv, &TIMING_CV_BANDS, TIMING_CV_FLOOR));
    }

    #[test]
    fn test_octave_jumps_count_as_deviation() {
        let mut f = features_with_beats(Vec::new());
        f.pitch = (0..100)
            .map(|i| Some(if i % 4 == 0 { 440.0 } else { 220.0 }))
            .collect();
        let p = pitch_accuracy(&f);
        assert!(p.cents_std > 500.0);
        assert_eq!(p.stability, PITCH_STABILITY_FLOOR);
        assert!(p.score < 40.0);
    }

    #[test]
    fn test_steady_sine_has_stable_pitch() {
        let samples: Vec<f32> = (0..22050 * 3)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 22050.0).sin())
            .collect();
        let w = Waveform::new(samples, 22050).unwrap();
        let f = TrackFeatures::compute(&w, &AnalysisConfig::default()).unwrap();
        let p = pitch_accuracy(&f);
        assert_eq!(p.stability, 100.0);
        assert!(p.voiced_ratio > 0.9);
        assert!(p.score > 95.0);
    }

    #[test]
    fn test_silent_track_fails() {
        let w = Waveform::new(vec![0.0; 22050], 22050).unwrap();
        let f = TrackFeatures::compute(&w, &AnalysisConfig::default()).unwrap();
        assert!(matches!(
            analyze_quality(&f),
            Err(AnalysisError::FeatureExtraction { .. })
        ));
    }
}
