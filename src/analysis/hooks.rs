//! Hook and viral-segment scoring
//!
//! A fixed-length window slides over the track. Each window gets five
//! normalized sub-scores that are blended into a 0-100 composite:
//!
//! | factor          | weight | measure                                   |
//! |-----------------|--------|-------------------------------------------|
//! | onset density   | 0.15   | onsets per second                         |
//! | beat regularity | 0.20   | 1 - CV of beat intervals in the window    |
//! | energy          | 0.25   | mean RMS relative to the loudest window   |
//! | novelty         | 0.20   | mean spectral flux relative to the max    |
//! | memorability    | 0.20   | voiced share times pitch-class focus      |
//!
//! Windows clear of the intro and outro get a 10% bonus. A separate primary
//! hook is picked from a blended energy and novelty curve.

use serde::{Deserialize, Serialize};

use super::sonic::NEUTRAL_REGULARITY;
use crate::config::AnalysisConfig;
use crate::error::{ensure_range, AnalysisError};
use crate::features::pitch::frequency_to_pitch_class;
use crate::features::stats::{clamp01, coefficient_of_variation, mean};
use crate::features::TrackFeatures;

/// Weight of onset density in the composite
pub const ONSET_DENSITY_WEIGHT: f32 = 0.15;
/// Weight of beat regularity in the composite
pub const BEAT_REGULARITY_WEIGHT: f32 = 0.20;
/// Weight of relative energy in the composite
pub const ENERGY_WEIGHT: f32 = 0.25;
/// Weight of spectral novelty in the composite
pub const NOVELTY_WEIGHT: f32 = 0.20;
/// Weight of melodic memorability in the composite
pub const MEMORABILITY_WEIGHT: f32 = 0.20;

/// Multiplier for windows clear of intro and outro
pub const PLACEMENT_BONUS: f32 = 1.1;
/// Sub-score above which a factor is cited as a reason
pub const REASON_THRESHOLD: f32 = 0.7;

/// Onsets per second that saturate the density factor
const ONSET_DENSITY_REFERENCE: f32 = 4.0;
/// Beat-interval CV at which regularity reaches zero
const REGULARITY_CV_SCALE: f32 = 0.5;
/// Voiced share that saturates the voicing part of memorability
const VOICED_SATURATION: f32 = 0.5;

/// Energy weight of the primary hook curve
pub const PRIMARY_ENERGY_WEIGHT: f32 = 0.6;
/// Novelty weight of the primary hook curve
pub const PRIMARY_NOVELTY_WEIGHT: f32 = 0.4;

/// Normalized (0-1) hook sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HookFactors {
    /// Onset density
    pub onset_density: f32,
    /// Beat regularity
    pub beat_regularity: f32,
    /// Energy relative to the loudest window
    pub energy: f32,
    /// Spectral novelty relative to the most active window
    pub novelty: f32,
    /// Pitch/melodic consistency
    pub memorability: f32,
}

impl HookFactors {
    /// Weighted blend on a 0-1 scale
    pub fn weighted(&self) -> f32 {
        ONSET_DENSITY_WEIGHT * self.onset_density
            + BEAT_REGULARITY_WEIGHT * self.beat_regularity
            + ENERGY_WEIGHT * self.energy
            + NOVELTY_WEIGHT * self.novelty
            + MEMORABILITY_WEIGHT * self.memorability
    }

    /// Reasons for every factor above [`REASON_THRESHOLD`]
    pub fn reasons(&self) -> Vec<String> {
        let labelled = [
            (self.onset_density, "High rhythmic activity"),
            (self.beat_regularity, "Steady, danceable groove"),
            (self.energy, "High-energy section"),
            (self.novelty, "Distinctive sonic change"),
            (self.memorability, "Consistent, memorable melody"),
        ];
        let mut reasons: Vec<String> = labelled
            .iter()
            .filter(|(score, _)| *score > REASON_THRESHOLD)
            .map(|(_, reason)| reason.to_string())
            .collect();
        if reasons.is_empty() {
            reasons.push("Balanced musical section".to_string());
            reasons.push("Works as a short-form clip".to_string());
        }
        reasons
    }
}

/// A ranked hook window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookCandidate {
    /// Window start (seconds)
    pub start_time: f32,
    /// Window end (seconds)
    pub end_time: f32,
    /// Window length (seconds)
    pub duration: f32,
    /// Composite score (0-100)
    pub score: f32,
    /// Sub-scores
    pub factors: HookFactors,
    /// Human-readable reasons
    pub reasons: Vec<String>,
}

/// Single best hook by energy and novelty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimaryHook {
    /// Window start (seconds)
    pub start_time: f32,
    /// Window end (seconds)
    pub end_time: f32,
    /// Mean blended curve value in the window (0-1)
    pub strength: f32,
}

/// Rank hook windows of a track
///
/// # Returns
///
/// Up to `config.hooks.top_n` candidates, best first, ties broken by the
/// earlier start. Tracks shorter than one window yield a single
/// full-length candidate.
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` for silent tracks.
pub fn score_hooks(
    features: &TrackFeatures,
    config: &AnalysisConfig,
) -> Result<Vec<HookCandidate>, AnalysisError> {
    features.ensure_audible("hooks")?;
    let hooks = &config.hooks;
    let duration = features.duration;

    let windows = window_starts(duration, hooks.window_seconds, hooks.step_seconds);

    let raw: Vec<(f32, f32, WindowMeasures)> = windows
        .iter()
        .map(|&(start, end)| (start, end, measure_window(features, start, end, config.center_frequency)))
        .collect();

    let max_energy = raw.iter().map(|(_, _, m)| m.energy).fold(0.0f32, f32::max);
    let max_flux = raw.iter().map(|(_, _, m)| m.flux).fold(0.0f32, f32::max);

    let mut candidates: Vec<HookCandidate> = raw
        .into_iter()
        .map(|(start, end, m)| {
            let factors = HookFactors {
                onset_density: m.onset_density,
                beat_regularity: m.beat_regularity,
                energy: ratio(m.energy, max_energy),
                novelty: ratio(m.flux, max_flux),
                memorability: m.memorability,
            };
            let mut score = factors.weighted() * 100.0;
            if start > hooks.intro_guard_seconds && end < duration - hooks.outro_guard_seconds {
                score *= PLACEMENT_BONUS;
            }
            HookCandidate {
                start_time: start,
                end_time: end,
                duration: end - start,
                score: score.min(100.0),
                reasons: factors.reasons(),
                factors,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.start_time.total_cmp(&b.start_time))
    });
    candidates.truncate(hooks.top_n);

    for candidate in &candidates {
        ensure_range("hooks.score", candidate.score, 0.0, 100.0)?;
    }

    log::debug!(
        "Hooks: {} windows scored, best {:?}",
        windows.len(),
        candidates.first().map(|c| (c.start_time, c.score))
    );

    Ok(candidates)
}

/// Pick the single window with the highest blended energy and novelty
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` for silent tracks.
pub fn primary_hook(
    features: &TrackFeatures,
    config: &AnalysisConfig,
) -> Result<PrimaryHook, AnalysisError> {
    features.ensure_audible("primary_hook")?;

    let rms_max = features.rms.iter().cloned().fold(0.0f32, f32::max);
    let flux_max = features.onset_envelope.iter().cloned().fold(0.0f32, f32::max);
    let curve: Vec<f32> = features
        .rms
        .iter()
        .zip(features.onset_envelope.iter())
        .map(|(&r, &f)| PRIMARY_ENERGY_WEIGHT * ratio(r, rms_max) + PRIMARY_NOVELTY_WEIGHT * ratio(f, flux_max))
        .collect();

    let fps = features.frames_per_second();
    let window = ((config.hooks.primary_window_seconds * fps).round() as usize).clamp(1, curve.len().max(1));
    if curve.len() <= window {
        return Ok(PrimaryHook {
            start_time: 0.0,
            end_time: features.duration,
            strength: mean(&curve),
        });
    }

    // running window sum
    let mut sum: f32 = curve[..window].iter().sum();
    let mut best = (0usize, sum);
    for start in 1..=(curve.len() - window) {
        sum += curve[start + window - 1] - curve[start - 1];
        if sum > best.1 + 1e-6 {
            best = (start, sum);
        }
    }

    let start_time = features.frame_time(best.0);
    Ok(PrimaryHook {
        start_time,
        end_time: (start_time + config.hooks.primary_window_seconds).min(features.duration),
        strength: clamp01(best.1 / window as f32),
    })
}

struct WindowMeasures {
    onset_density: f32,
    beat_regularity: f32,
    energy: f32,
    flux: f32,
    memorability: f32,
}

fn window_starts(duration: f32, window: f32, step: f32) -> Vec<(f32, f32)> {
    if duration <= window {
        return vec![(0.0, duration)];
    }
    let count = ((duration - window) / step).floor() as usize + 1;
    (0..count)
        .map(|i| {
            let start = i as f32 * step;
            (start, start + window)
        })
        .collect()
}

fn measure_window(features: &TrackFeatures, start: f32, end: f32, reference_hz: f32) -> WindowMeasures {
    let frames = features.frame_range(start, end);
    let length = (end - start).max(f32::EPSILON);

    let onset_count = features.onsets.iter().filter(|&&o| frames.contains(&o)).count();
    let onset_density = clamp01(onset_count as f32 / length / ONSET_DENSITY_REFERENCE);

    let beats: Vec<f32> = features
        .beats
        .iter()
        .cloned()
        .filter(|&b| b >= start && b < end)
        .collect();
    let intervals: Vec<f32> = beats.windows(2).map(|w| w[1] - w[0]).collect();
    let beat_regularity = if intervals.len() >= 2 {
        clamp01(1.0 - coefficient_of_variation(&intervals) / REGULARITY_CV_SCALE)
    } else {
        NEUTRAL_REGULARITY
    };

    let energy = mean(&features.rms[frames.clone()]);
    let flux = mean(&features.onset_envelope[frames.clone()]);

    let pitches = &features.pitch[frames];
    let mut histogram = [0usize; 12];
    let mut voiced = 0usize;
    for frequency in pitches.iter().flatten() {
        histogram[frequency_to_pitch_class(*frequency, reference_hz)] += 1;
        voiced += 1;
    }
    let memorability = if voiced == 0 {
        0.0
    } else {
        histogram.sort_unstable_by(|a, b| b.cmp(a));
        let focus = histogram[..3].iter().sum::<usize>() as f32 / voiced as f32;
        let voiced_share = voiced as f32 / pitches.len().max(1) as f32;
        clamp01(voiced_share / VOICED_SATURATION) * focus
    };

    WindowMeasures {
        onset_density,
        beat_regularity,
        energy,
        flux,
        memorability,
    }
}

fn ratio(value: f32, max: f32) -> f32 {
    if max > 0.0 {
        clamp01(value / max)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::period::TempoEstimate;

    const FPS_HOP: usize = 512;
    const SR: u32 = 22050;

    /// Synthetic features: quiet track with a loud, busy section between `loud.0` and `loud.1` seconds
    fn features(duration: f32, loud: (f32, f32)) -> TrackFeatures {
        let fps = SR as f32 / FPS_HOP as f32;
        let n = (duration * fps) as usize;
        let in_loud = |i: usize| {
            let t = i as f32 / fps;
            t >= loud.0 && t < loud.1
        };
        let rms: Vec<f32> = (0..n).map(|i| if in_loud(i) { 0.5 } else { 0.1 }).collect();
        let onset_envelope: Vec<f32> = (0..n)
            .map(|i| if in_loud(i) && i % 10 == 0 { 2.0 } else { 0.05 })
            .collect();
        let onsets: Vec<usize> = (0..n).filter(|&i| in_loud(i) && i % 10 == 0).collect();
        let pitch: Vec<Option<f32>> = (0..n).map(|i| if in_loud(i) { Some(440.0) } else { None }).collect();
        let beats: Vec<f32> = (0..(duration * 2.0) as usize).map(|b| b as f32 * 0.5).collect();

        TrackFeatures {
            sample_rate: SR,
            frame_size: 2048,
            hop_size: FPS_HOP,
            duration,
            peak: 0.8,
            centroid: vec![1500.0; n],
            rolloff: vec![4000.0; n],
            bandwidth: vec![1000.0; n],
            rms,
            zcr: vec![0.05; n],
            mfcc: vec![[0.0; 13]; n],
            chroma: vec![[0.0; 12]; n],
            onset_envelope,
            onsets,
            pitch,
            tempo: TempoEstimate { bpm: 120.0, confidence: 0.8 },
            beats,
        }
    }

    #[test]
    fn test_window_starts() {
        assert_eq!(window_starts(10.0, 15.0, 1.0), vec![(0.0, 10.0)]);
        let w = window_starts(20.0, 15.0, 1.0);
        assert_eq!(w.len(), 6);
        assert_eq!(w[5], (5.0, 20.0));
    }

    #[test]
    fn test_loud_section_ranks_first() {
        // outside the placement-bonus zone so scores stay below the cap
        let f = features(120.0, (95.0, 110.0));
        let hooks = score_hooks(&f, &AnalysisConfig::default()).unwrap();

        assert_eq!(hooks.len(), 5);
        assert!((hooks[0].start_time - 95.0).abs() < 1.01);
        assert!(hooks[0].reasons.contains(&"High-energy section".to_string()));
        for pair in hooks.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(hooks.iter().all(|h| h.score <= 100.0));
    }

    #[test]
    fn test_placement_bonus_applies_only_mid_track() {
        let f = features(120.0, (200.0, 201.0));
        let hooks = score_hooks(&f, &AnalysisConfig::default()).unwrap();
        let top = &hooks[0];
        assert!(top.start_time > 15.0 && top.end_time < 90.0);
        assert!((top.score - top.factors.weighted() * 100.0 * PLACEMENT_BONUS).abs() < 1e-3);
    }

    #[test]
    fn test_generic_reasons_when_nothing_stands_out() {
        let factors = HookFactors {
            onset_density: 0.1,
            beat_regularity: 0.5,
            energy: 0.6,
            novelty: 0.2,
            memorability: 0.0,
        };
        assert_eq!(
            factors.reasons(),
            vec!["Balanced musical section", "Works as a short-form clip"]
        );
    }

    #[test]
    fn test_short_track_single_candidate() {
        let f = features(8.0, (0.0, 8.0));
        let hooks = score_hooks(&f, &AnalysisConfig::default()).unwrap();
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].start_time, 0.0);
        assert!((hooks[0].end_time - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_primary_hook_finds_loud_section() {
        let f = features(90.0, (30.0, 45.0));
        let hook = primary_hook(&f, &AnalysisConfig::default()).unwrap();
        assert!((hook.start_time - 30.0).abs() < 0.5, "start {}", hook.start_time);
        assert!(hook.strength > 0.5);
    }

    #[test]
    fn test_silent_track_fails() {
        let mut f = features(30.0, (0.0, 0.0));
        f.peak = 0.0;
        assert!(score_hooks(&f, &AnalysisConfig::default()).is_err());
        assert!(primary_hook(&f, &AnalysisConfig::default()).is_err());
    }
}
