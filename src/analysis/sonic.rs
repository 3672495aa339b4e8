//! Sonic genome extraction
//!
//! Summarizes the frame features of a track into tempo, key, spectral
//! statistics and four perceptual features in `[0, 1]`:
//!
//! - **energy**: loudness and brightness
//! - **danceability**: tempo band and beat regularity, scaled by a timing
//!   multiplier so sloppy playing is not mistaken for groove
//! - **acousticness**: dark, low-ZCR spectra, discounted when the dynamics look
//!   compressed or synthesized
//! - **valence**: major/minor tonality blended with spectral brightness
//!
//! Extraction is all-or-nothing: any failure returns an error and no partial
//! genome.

use serde::{Deserialize, Serialize};

use super::quality::{harmonic_coherence, timing_precision};
use super::result::{Key, Mode};
use crate::error::{ensure_finite, ensure_range, AnalysisError};
use crate::features::bands::{at_least, below, in_range};
use crate::features::key::{detect_key, KeyTemplates};
use crate::features::stats::{clamp01, coefficient_of_variation};
use crate::features::{Summary, TrackFeatures};
use crate::preprocessing::loudness::amplitude_to_db;

/// Tempo bands `[lo, hi)` -> danceability tempo sub-score, the last band closed at its top
pub const DANCE_TEMPO_BANDS: [(f32, f32, f32); 7] = [
    (60.0, 70.0, 0.30),
    (70.0, 80.0, 0.45),
    (80.0, 100.0, 0.65),
    (100.0, 130.0, 1.00),
    (130.0, 145.0, 0.85),
    (145.0, 160.0, 0.65),
    (160.0, 180.0, 0.45),
];
/// Tempo sub-score outside every band
pub const DANCE_TEMPO_FLOOR: f32 = 0.20;

/// Timing precision -> danceability multiplier
pub const TIMING_MULTIPLIER_BANDS: [(f32, f32); 4] = [(80.0, 0.98), (70.0, 0.80), (60.0, 0.60), (50.0, 0.40)];
/// Multiplier for timing precision below 50
pub const TIMING_MULTIPLIER_FLOOR: f32 = 0.10;

/// Regularity used when too few beats were tracked
pub const NEUTRAL_REGULARITY: f32 = 0.5;

/// Full-scale RMS reference for energy
pub const ENERGY_RMS_REFERENCE: f32 = 0.25;

/// Rolloff (Hz) at which the spectral acousticness term reaches zero
pub const ACOUSTIC_ROLLOFF_REFERENCE: f32 = 8000.0;
/// ZCR at which the ZCR acousticness term reaches zero
pub const ACOUSTIC_ZCR_REFERENCE: f32 = 0.15;

/// Centroid (Hz) treated as fully bright for valence
pub const VALENCE_BRIGHTNESS_REFERENCE: f32 = 3000.0;

/// RMS CV -> electronic-confidence contribution
const ELECTRONIC_RMS_CV: [(f32, f32); 2] = [(0.3, 0.35), (0.5, 0.15)];
/// Centroid CV -> electronic-confidence contribution
const ELECTRONIC_CENTROID_CV: [(f32, f32); 2] = [(0.25, 0.35), (0.4, 0.15)];
/// Mean ZCR -> electronic-confidence contribution
const ELECTRONIC_ZCR: [(f32, f32); 2] = [(0.10, 0.30), (0.07, 0.10)];

/// Structured acoustic description of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SonicGenome {
    /// Duration in seconds
    pub duration: f32,
    /// Tempo in BPM
    pub tempo: f32,
    /// Tempo confidence (0-1)
    pub tempo_confidence: f32,
    /// Number of tracked beats
    pub beat_count: usize,
    /// Tonic pitch class (0 = C)
    pub key: u32,
    /// Key name in compact notation ("C", "Am")
    pub key_name: String,
    /// Major or minor
    pub mode: Mode,
    /// Spectral centroid (Hz)
    pub spectral_centroid: Summary,
    /// 85% spectral rolloff (Hz)
    pub spectral_rolloff: Summary,
    /// Spectral bandwidth (Hz)
    pub spectral_bandwidth: Summary,
    /// Frame RMS amplitude
    pub rms: Summary,
    /// Mean frame RMS in dBFS
    pub loudness: f32,
    /// Zero-crossing rate
    pub zero_crossing_rate: Summary,
    /// Per-coefficient MFCC means
    pub mfcc_means: Vec<f32>,
    /// Per-coefficient MFCC standard deviations
    pub mfcc_stds: Vec<f32>,
    /// Energy (0-1)
    pub energy: f32,
    /// Danceability (0-1)
    pub danceability: f32,
    /// Valence (0-1)
    pub valence: f32,
    /// Acousticness (0-1)
    pub acousticness: f32,
    /// Confidence that the production is electronic/compressed (0-1)
    pub electronic_confidence: f32,
    /// Timing precision (0-100)
    pub timing_precision_score: f32,
    /// Harmonic coherence (0-100)
    pub harmonic_coherence_score: f32,
}

impl SonicGenome {
    /// Check every bounded field
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.duration <= 0.0 || self.tempo <= 0.0 {
            return Err(AnalysisError::NumericalError(format!(
                "duration ({}) and tempo ({}) must be positive",
                self.duration, self.tempo
            )));
        }
        if self.key > 11 {
            return Err(AnalysisError::NumericalError(format!("key {} outside 0..=11", self.key)));
        }
        ensure_range("energy", self.energy, 0.0, 1.0)?;
        ensure_range("danceability", self.danceability, 0.0, 1.0)?;
        ensure_range("valence", self.valence, 0.0, 1.0)?;
        ensure_range("acousticness", self.acousticness, 0.0, 1.0)?;
        ensure_range("timing_precision_score", self.timing_precision_score, 0.0, 100.0)?;
        ensure_range("harmonic_coherence_score", self.harmonic_coherence_score, 0.0, 100.0)?;
        ensure_finite("loudness", self.loudness)?;
        ensure_finite("spectral_centroid", self.spectral_centroid.mean)
    }
}

/// Extract the sonic genome of a track
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` for silent or atonal input and
/// `AnalysisError::NumericalError` if a derived field leaves its range.
pub fn extract_sonic_genome(
    features: &TrackFeatures,
    templates: &KeyTemplates,
) -> Result<SonicGenome, AnalysisError> {
    features.ensure_audible("sonic")?;

    let centroid = Summary::of(&features.centroid);
    let rolloff = Summary::of(&features.rolloff);
    let bandwidth = Summary::of(&features.bandwidth);
    let rms = Summary::of(&features.rms);
    let zcr = Summary::of(&features.zcr);
    let (mfcc_means, mfcc_stds) = features.mfcc_summary();

    let key_result = detect_key(&features.chroma, templates)
        .map_err(|e| AnalysisError::extraction("sonic", e.to_string()))?;
    let key: Key = key_result.key;

    let timing = timing_precision(features);
    let harmonic = harmonic_coherence(features);

    let nyquist = features.sample_rate as f32 / 2.0;
    let energy = clamp01(
        0.7 * (rms.mean / ENERGY_RMS_REFERENCE).min(1.0) + 0.3 * (centroid.mean / nyquist * 4.0).min(1.0),
    );

    let danceability = danceability(features.tempo.bpm, &features.beat_intervals(), timing.score);

    let electronic_confidence = electronic_confidence(rms.cv(), centroid.cv(), zcr.mean);
    let acousticness = acousticness(rolloff.mean, zcr.mean, electronic_confidence);

    let mode_score = clamp01(0.5 + key_result.major_correlation - key_result.minor_correlation);
    let brightness = clamp01(centroid.mean / VALENCE_BRIGHTNESS_REFERENCE);
    let valence = clamp01(0.6 * mode_score + 0.4 * brightness);

    let genome = SonicGenome {
        duration: features.duration,
        tempo: features.tempo.bpm,
        tempo_confidence: features.tempo.confidence,
        beat_count: features.beats.len(),
        key: key.tonic(),
        key_name: key.name(),
        mode: key.mode(),
        spectral_centroid: centroid,
        spectral_rolloff: rolloff,
        spectral_bandwidth: bandwidth,
        rms,
        loudness: amplitude_to_db(rms.mean),
        zero_crossing_rate: zcr,
        mfcc_means,
        mfcc_stds,
        energy,
        danceability,
        valence,
        acousticness,
        electronic_confidence,
        timing_precision_score: timing.score,
        harmonic_coherence_score: harmonic.score,
    };

    log::debug!(
        "Sonic genome: {:.1} BPM, key {}, energy {:.2}, dance {:.2}, valence {:.2}, acoustic {:.2}",
        genome.tempo,
        genome.key_name,
        genome.energy,
        genome.danceability,
        genome.valence,
        genome.acousticness
    );

    genome.validate()?;
    Ok(genome)
}

/// Tempo band and regularity, scaled by the timing multiplier
///
/// # Arguments
///
/// * `bpm` - Track tempo
/// * `beat_intervals` - Seconds between consecutive beats
/// * `timing_score` - Timing precision (0-100)
pub fn danceability(bpm: f32, beat_intervals: &[f32], timing_score: f32) -> f32 {
    let tempo_score = match DANCE_TEMPO_BANDS.last() {
        Some(&(_, top, score)) if bpm == top => score,
        _ => in_range(bpm, &DANCE_TEMPO_BANDS, DANCE_TEMPO_FLOOR),
    };
    let regularity = if beat_intervals.len() < 3 {
        NEUTRAL_REGULARITY
    } else {
        clamp01(1.0 - coefficient_of_variation(beat_intervals) / 0.5)
    };
    let raw = 0.6 * tempo_score + 0.4 * regularity;
    clamp01(raw * timing_multiplier(timing_score))
}

/// Danceability multiplier for a timing precision score
pub fn timing_multiplier(timing_score: f32) -> f32 {
    at_least(timing_score, &TIMING_MULTIPLIER_BANDS, TIMING_MULTIPLIER_FLOOR)
}

/// Likelihood of compressed/synthesized production from dynamics and noise
pub fn electronic_confidence(rms_cv: f32, centroid_cv: f32, zcr_mean: f32) -> f32 {
    clamp01(
        below(rms_cv, &ELECTRONIC_RMS_CV, 0.0)
            + below(centroid_cv, &ELECTRONIC_CENTROID_CV, 0.0)
            + at_least(zcr_mean, &ELECTRONIC_ZCR, 0.0),
    )
}

/// Spectral acousticness estimate discounted by electronic confidence
pub fn acousticness(rolloff_mean: f32, zcr_mean: f32, electronic_confidence: f32) -> f32 {
    let base = clamp01(
        0.7 * clamp01(1.0 - rolloff_mean / ACOUSTIC_ROLLOFF_REFERENCE)
            + 0.3 * clamp01(1.0 - zcr_mean / ACOUSTIC_ZCR_REFERENCE),
    );
    let discount = if electronic_confidence > 0.5 {
        0.3
    } else if electronic_confidence >= 0.2 {
        0.75
    } else {
        1.0
    };
    clamp01(base * discount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::io::Waveform;

    #[test]
    fn test_danceability_tempo_bands() {
        let steady = vec![0.5f32; 16];
        let peak = danceability(120.0, &steady, 90.0);
        let slow = danceability(65.0, &steady, 90.0);
        assert!((peak - 0.98).abs() < 1e-5);
        assert!(slow < peak);
    }

    #[test]
    fn test_fastest_band_includes_its_top() {
        let steady = vec![0.5f32; 16];
        let expected = (0.6 * 0.45 + 0.4) * timing_multiplier(90.0);
        assert!((danceability(180.0, &steady, 90.0) - expected).abs() < 1e-5);
        assert!((danceability(170.0, &steady, 90.0) - expected).abs() < 1e-5);
        let beyond = (0.6 * DANCE_TEMPO_FLOOR + 0.4) * timing_multiplier(90.0);
        assert!((danceability(180.5, &steady, 90.0) - beyond).abs() < 1e-5);
    }

    #[test]
    fn test_poor_timing_suppresses_danceability() {
        let steady = vec![0.5f32; 16];
        let tight = danceability(120.0, &steady, 85.0);
        let sloppy = danceability(120.0, &steady, 30.0);
        assert!(sloppy < 0.15 * tight + 1e-6);
    }

    #[test]
    fn test_timing_multiplier_is_monotonic() {
        let scores = [0.0, 45.0, 50.0, 65.0, 75.0, 80.0, 100.0];
        for pair in scores.windows(2) {
            assert!(timing_multiplier(pair[0]) <= timing_multiplier(pair[1]));
        }
    }

    #[test]
    fn test_electronic_confidence_discounts_acousticness() {
        let flat = electronic_confidence(0.1, 0.1, 0.12);
        assert!((flat - 1.0).abs() < 1e-6);
        let dynamic = electronic_confidence(0.9, 0.9, 0.02);
        assert_eq!(dynamic, 0.0);

        let raw = acousticness(1000.0, 0.02, dynamic);
        let discounted = acousticness(1000.0, 0.02, flat);
        assert!((discounted - raw * 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_genome_of_tone_is_valid() {
        // A major arpeggio-like tone with a pulse: 220 Hz + 277 Hz + 330 Hz
        let sr = 22050;
        let samples: Vec<f32> = (0..sr * 6)
            .map(|i| {
                let t = i as f32 / sr as f32;
                let env = if (t * 2.0).fract() < 0.3 { 1.0 } else { 0.4 };
                let tone = (2.0 * std::f32::consts::PI * 220.0 * t).sin()
                    + 0.6 * (2.0 * std::f32::consts::PI * 277.18 * t).sin()
                    + 0.6 * (2.0 * std::f32::consts::PI * 329.63 * t).sin();
                0.2 * env * tone
            })
            .collect();
        let w = Waveform::new(samples, sr as u32).unwrap();
        let features = TrackFeatures::compute(&w, &AnalysisConfig::default()).unwrap();
        let genome = extract_sonic_genome(&features, &KeyTemplates::new()).unwrap();

        assert!((genome.duration - 6.0).abs() < 1e-3);
        assert_eq!(genome.key, 9);
        assert_eq!(genome.mfcc_means.len(), 13);
        assert!(genome.validate().is_ok());
    }

    #[test]
    fn test_silent_genome_fails() {
        let w = Waveform::new(vec![0.0; 22050], 22050).unwrap();
        let features = TrackFeatures::compute(&w, &AnalysisConfig::default()).unwrap();
        assert!(matches!(
            extract_sonic_genome(&features, &KeyTemplates::new()),
            Err(AnalysisError::FeatureExtraction { .. })
        ));
    }
}
