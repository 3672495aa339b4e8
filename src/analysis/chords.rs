//! Chord and harmony analysis
//!
//! Matches 2-second chroma windows (50% overlap) against 24 binary triad
//! templates, names the progression relative to the detected key, scores
//! harmonic complexity and familiarity, and reports modulations between
//! equal track segments.

use serde::{Deserialize, Serialize};

use super::result::Mode;
use crate::config::ChordConfig;
use crate::error::{ensure_range, AnalysisError};
use crate::features::bands::at_least;
use crate::features::chroma::{Chroma, PITCH_CLASS_NAMES};
use crate::features::key::{detect_key, detect_key_changes, KeyTemplates};
use crate::features::stats::{clamp01, cosine_similarity, mean};
use crate::features::TrackFeatures;

/// Familiarity awarded to any recognized named progression
pub const NAMED_PROGRESSION_FAMILIARITY: f32 = 85.0;

/// Complexity weight of the unique-chord band
pub const UNIQUE_CHORD_WEIGHT: f32 = 0.4;
/// Complexity weight of the chord change rate
pub const CHANGE_RATE_WEIGHT: f32 = 0.3;
/// Complexity weight of chroma activity
pub const ACTIVITY_WEIGHT: f32 = 0.3;

/// Unique chord count -> complexity sub-score
const UNIQUE_CHORD_BANDS: [(f32, f32); 5] = [(8.0, 100.0), (6.0, 85.0), (5.0, 70.0), (4.0, 55.0), (3.0, 40.0)];
const UNIQUE_CHORD_FLOOR: f32 = 20.0;

/// Chroma bins above this (max-normalized) level count as active
pub const ACTIVITY_THRESHOLD: f32 = 0.5;
/// Mean active pitch classes that saturate the activity sub-score
const ACTIVITY_SATURATION: f32 = 7.0;

/// Scale-degree numerals by semitone distance from the tonic
const NUMERALS: [&str; 12] = [
    "I", "bII", "II", "bIII", "III", "IV", "#IV", "V", "bVI", "VI", "bVII", "VII",
];

/// Named progressions over key-relative numerals; `*` matches any chord
const NAMED_PROGRESSIONS: [(&[&str], &str, &str); 9] = [
    (
        &["I", "V", "vi", "IV"],
        "Pop (Axis)",
        "The most common progression in modern pop; bright and resolved",
    ),
    (
        &["I", "vi", "IV", "V"],
        "50s Doo-Wop",
        "Classic doo-wop and ballad changes with a nostalgic feel",
    ),
    (
        &["vi", "IV", "I", "V"],
        "Pop (Sensitive)",
        "Axis progression started on the relative minor; emotional and anthemic",
    ),
    (
        &["I", "IV", "V", "I"],
        "Rock / Blues",
        "Primary-chord cadence at the root of rock, blues and country",
    ),
    (
        &["I", "IV", "I", "V"],
        "Folk",
        "Simple tonic-subdominant-dominant motion typical of folk songs",
    ),
    (
        &["I", "bVII", "IV", "I"],
        "Mixolydian Rock",
        "Borrowed flat-seven chord giving a classic rock swagger",
    ),
    (
        &["ii", "V", "I", "*"],
        "Jazz ii-V-I",
        "The cornerstone cadence of jazz harmony",
    ),
    (
        &["i", "bVI", "bIII", "bVII"],
        "Minor Pop (Aeolian)",
        "Dark, driving minor-key progression common in modern pop and rock",
    ),
    (
        &["i", "iv", "v", "i"],
        "Minor Folk",
        "Natural-minor cadence with a modal, traditional character",
    ),
];

/// Chords most often found in major-key songs
const COMMON_MAJOR_NUMERALS: [&str; 7] = ["I", "ii", "iii", "IV", "V", "vi", "bVII"];
/// Chords most often found in minor-key songs
const COMMON_MINOR_NUMERALS: [&str; 7] = ["i", "iv", "v", "V", "bIII", "bVI", "bVII"];

/// Triad quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    /// Root, major third, fifth
    Major,
    /// Root, minor third, fifth
    Minor,
}

/// One chord window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Window start (seconds)
    pub time: f32,
    /// Chord label ("C", "Am")
    pub chord: String,
    /// Root pitch class
    pub root: u32,
    /// Triad quality
    pub quality: ChordQuality,
    /// Cosine similarity with the winning template (0-1)
    pub confidence: f32,
}

/// Key change between track segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modulation {
    /// Start of the segment in the new key (seconds)
    pub time: f32,
    /// Previous key ("C major")
    pub from_key: String,
    /// New key ("A minor")
    pub to_key: String,
}

/// Chord and harmony report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordReport {
    /// Chord per window, in time order
    pub chord_sequence: Vec<ChordEvent>,
    /// Key tonic name ("C", "F#")
    pub key: String,
    /// Key mode
    pub mode: Mode,
    /// First four distinct chords as key-relative numerals
    pub progression: Vec<String>,
    /// Named progression, or "Custom progression"
    pub progression_name: String,
    /// Short description of the progression
    pub progression_description: String,
    /// Number of distinct chords
    pub unique_chord_count: usize,
    /// Harmonic complexity (0-100)
    pub harmonic_complexity: f32,
    /// Familiarity (0-100)
    pub familiarity_score: f32,
    /// 100 - familiarity
    pub novelty_score: f32,
    /// Segment-to-segment key changes
    pub modulations: Vec<Modulation>,
}

impl ChordReport {
    /// Check range invariants
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` on an out-of-range score.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        ensure_range("chords.harmonic_complexity", self.harmonic_complexity, 0.0, 100.0)?;
        ensure_range("chords.familiarity_score", self.familiarity_score, 0.0, 100.0)?;
        ensure_range("chords.novelty_score", self.novelty_score, 0.0, 100.0)?;
        for event in &self.chord_sequence {
            ensure_range("chords.confidence", event.confidence, 0.0, 1.0 + 1e-4)?;
        }
        Ok(())
    }
}

/// 24 binary triad templates: 12 major roots then 12 minor roots
pub struct TriadTemplates {
    templates: [Chroma; 24],
}

impl TriadTemplates {
    /// Build the template bank
    pub fn new() -> Self {
        Self {
            templates: std::array::from_fn(|i| {
                let root = i % 12;
                let third = if i < 12 { 4 } else { 3 };
                let mut t = [0.0f32; 12];
                for interval in [0, third, 7] {
                    t[(root + interval) % 12] = 1.0;
                }
                t
            }),
        }
    }

    /// Best-matching triad: `(root, quality, similarity)`
    ///
    /// Ties resolve to the lower template index (majors first).
    pub fn best_match(&self, chroma: &Chroma) -> (u32, ChordQuality, f32) {
        let mut best = (0usize, f32::MIN);
        for (idx, template) in self.templates.iter().enumerate() {
            let similarity = cosine_similarity(chroma, template);
            if similarity > best.1 {
                best = (idx, similarity);
            }
        }
        let quality = if best.0 < 12 {
            ChordQuality::Major
        } else {
            ChordQuality::Minor
        };
        ((best.0 % 12) as u32, quality, best.1.max(0.0))
    }
}

impl Default for TriadTemplates {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze chords of a track
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` for silent tracks or when no
/// window carries tonal energy.
pub fn analyze_chords(
    features: &TrackFeatures,
    config: &ChordConfig,
    templates: &KeyTemplates,
) -> Result<ChordReport, AnalysisError> {
    features.ensure_audible("chords")?;
    analyze_chroma_sequence(&features.chroma, features.frames_per_second(), config, templates)
}

/// Analyze chords of a chroma sequence at `frames_per_second`
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` when no window carries tonal energy.
pub fn analyze_chroma_sequence(
    chroma: &[Chroma],
    frames_per_second: f32,
    config: &ChordConfig,
    templates: &KeyTemplates,
) -> Result<ChordReport, AnalysisError> {
    let key = detect_key(chroma, templates)?.key;
    let chord_sequence = chord_windows(chroma, frames_per_second, config, &TriadTemplates::new());
    if chord_sequence.is_empty() {
        return Err(AnalysisError::extraction("chords", "no tonal windows"));
    }

    let distinct = dedup_chords(&chord_sequence);
    let numerals: Vec<String> = distinct
        .iter()
        .map(|e| roman_numeral(key.tonic(), e.root, e.quality))
        .collect();

    let progression: Vec<String> = numerals.iter().take(4).cloned().collect();
    let (progression_name, progression_description) = match name_progression(&progression) {
        Some((name, description)) => (name.to_string(), description.to_string()),
        None => (
            "Custom progression".to_string(),
            "Progression outside the common named patterns".to_string(),
        ),
    };
    let named = progression_name != "Custom progression";

    let mut unique: Vec<&str> = chord_sequence.iter().map(|e| e.chord.as_str()).collect();
    unique.sort_unstable();
    unique.dedup();
    let unique_chord_count = unique.len();

    let harmonic_complexity = harmonic_complexity(unique_chord_count, &chord_sequence, chroma);
    let familiarity_score = if named {
        NAMED_PROGRESSION_FAMILIARITY
    } else {
        common_chord_share(&numerals, key.mode()) * 100.0
    };

    let modulations = detect_key_changes(
        chroma,
        frames_per_second,
        config.modulation_segments,
        templates,
    )?
    .into_iter()
    .map(|change| Modulation {
        time: change.time,
        from_key: change.from_key.long_name(),
        to_key: change.to_key.long_name(),
    })
    .collect();

    let report = ChordReport {
        chord_sequence,
        key: PITCH_CLASS_NAMES[key.tonic() as usize].to_string(),
        mode: key.mode(),
        progression,
        progression_name,
        progression_description,
        unique_chord_count,
        harmonic_complexity,
        familiarity_score,
        novelty_score: 100.0 - familiarity_score,
        modulations,
    };

    log::debug!(
        "Chords: key {} {}, {} windows, {} unique, progression {:?} ({})",
        report.key,
        report.mode.as_str(),
        report.chord_sequence.len(),
        report.unique_chord_count,
        report.progression,
        report.progression_name
    );

    report.validate()?;
    Ok(report)
}

/// Label every analysis window with its best triad
///
/// Windows span `window_seconds` and advance by `window_seconds * (1 - overlap)`;
/// the last window is clipped to the end of the track. Silent windows are skipped.
pub fn chord_windows(
    chroma: &[Chroma],
    frames_per_second: f32,
    config: &ChordConfig,
    triads: &TriadTemplates,
) -> Vec<ChordEvent> {
    let window = ((config.window_seconds * frames_per_second).round() as usize).max(1);
    let step = ((window as f32 * (1.0 - config.overlap)).round() as usize).max(1);

    let mut events = Vec::new();
    let mut start = 0;
    while start < chroma.len() {
        let end = (start + window).min(chroma.len());
        let mut avg = [0.0f32; 12];
        for frame in &chroma[start..end] {
            for (a, v) in avg.iter_mut().zip(frame.iter()) {
                *a += v;
            }
        }
        if avg.iter().any(|&v| v > 0.0) {
            let (root, quality, confidence) = triads.best_match(&avg);
            events.push(ChordEvent {
                time: start as f32 / frames_per_second,
                chord: chord_name(root, quality),
                root,
                quality,
                confidence,
            });
        }
        if end == chroma.len() {
            break;
        }
        start += step;
    }
    events
}

/// Chord label ("C", "F#m")
pub fn chord_name(root: u32, quality: ChordQuality) -> String {
    let name = PITCH_CLASS_NAMES[root as usize % 12];
    match quality {
        ChordQuality::Major => name.to_string(),
        ChordQuality::Minor => format!("{}m", name),
    }
}

/// Key-relative numeral, lowercase for minor chords ("IV", "vi", "bVII")
pub fn roman_numeral(tonic: u32, root: u32, quality: ChordQuality) -> String {
    let degree = ((root + 12 - tonic % 12) % 12) as usize;
    let numeral = NUMERALS[degree];
    match quality {
        ChordQuality::Major => numeral.to_string(),
        // accidentals stay as-is, only the degree letters are lowered
        ChordQuality::Minor => numeral.to_lowercase(),
    }
}

/// Look up a progression in the named table
pub fn name_progression(numerals: &[String]) -> Option<(&'static str, &'static str)> {
    NAMED_PROGRESSIONS
        .iter()
        .find(|(pattern, _, _)| {
            numerals.len() >= pattern.len()
                && pattern
                    .iter()
                    .zip(numerals)
                    .all(|(p, n)| *p == "*" || *p == n.as_str())
        })
        .map(|&(_, name, description)| (name, description))
}

fn dedup_chords(events: &[ChordEvent]) -> Vec<&ChordEvent> {
    let mut out: Vec<&ChordEvent> = Vec::new();
    for event in events {
        if out.last().map_or(true, |last| last.chord != event.chord) {
            out.push(event);
        }
    }
    out
}

fn harmonic_complexity(unique: usize, events: &[ChordEvent], chroma: &[Chroma]) -> f32 {
    let unique_score = at_least(unique as f32, &UNIQUE_CHORD_BANDS, UNIQUE_CHORD_FLOOR);

    let change_rate = if events.len() > 1 {
        let changes = events.windows(2).filter(|w| w[0].chord != w[1].chord).count();
        changes as f32 / (events.len() - 1) as f32
    } else {
        0.0
    };

    let active: Vec<f32> = chroma
        .iter()
        .filter(|frame| frame.iter().any(|&v| v > 0.0))
        .map(|frame| frame.iter().filter(|&&v| v > ACTIVITY_THRESHOLD).count() as f32)
        .collect();
    let activity = clamp01(mean(&active) / ACTIVITY_SATURATION);

    (UNIQUE_CHORD_WEIGHT * unique_score
        + CHANGE_RATE_WEIGHT * change_rate * 100.0
        + ACTIVITY_WEIGHT * activity * 100.0)
        .min(100.0)
}

fn common_chord_share(numerals: &[String], mode: Mode) -> f32 {
    if numerals.is_empty() {
        return 0.0;
    }
    let common: &[&str] = match mode {
        Mode::Major => &COMMON_MAJOR_NUMERALS,
        Mode::Minor => &COMMON_MINOR_NUMERALS,
    };
    let hits = numerals.iter().filter(|n| common.contains(&n.as_str())).count();
    hits as f32 / numerals.len() as f32
}
