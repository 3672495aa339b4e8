//! Analysis result types

use serde::{Deserialize, Serialize};

use super::chords::ChordReport;
use super::genre::GenrePrediction;
use super::hooks::{HookCandidate, PrimaryHook};
use super::lyrics::LyricalGenome;
use super::mastering::MasteringReport;
use super::metadata::AnalysisMetadata;
use super::quality::QualityMetrics;
use super::sonic::SonicGenome;
use super::tunescore::TuneScore;
use crate::features::chroma::PITCH_CLASS_NAMES;

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Build a key from a tonic pitch class and mode
    pub fn new(tonic: u32, mode: Mode) -> Self {
        match mode {
            Mode::Major => Key::Major(tonic % 12),
            Mode::Minor => Key::Minor(tonic % 12),
        }
    }

    /// Get key name in compact notation (e.g., "C", "Am", "F#", "D#m")
    ///
    /// # Example
    ///
    /// ```
    /// use tunescore::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Minor(1).name(), "C#m");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(i) => PITCH_CLASS_NAMES[*i as usize % 12].to_string(),
            Key::Minor(i) => format!("{}m", PITCH_CLASS_NAMES[*i as usize % 12]),
        }
    }

    /// Get key name with the mode spelled out (e.g., "C major", "A minor")
    pub fn long_name(&self) -> String {
        format!(
            "{} {}",
            PITCH_CLASS_NAMES[self.tonic() as usize],
            self.mode().as_str()
        )
    }

    /// Tonic pitch class (0 = C, ..., 11 = B)
    pub fn tonic(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// Key mode
    pub fn mode(&self) -> Mode {
        match self {
            Key::Major(_) => Mode::Major,
            Key::Minor(_) => Mode::Minor,
        }
    }
}

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Major (ionian)
    Major,
    /// Natural minor (aeolian)
    Minor,
}

impl Mode {
    /// Lowercase display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

/// A component that failed and fell back to its neutral default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    /// Component name ("sonic", "quality", "mastering", "hooks", "chords", "genre", "lyrics")
    pub component: String,
    /// Rendered error
    pub error: String,
}

impl Degradation {
    /// Record a component failure
    pub fn new(component: &str, error: &crate::error::AnalysisError) -> Self {
        Self {
            component: component.to_string(),
            error: error.to_string(),
        }
    }
}

/// Complete analysis result for one track
///
/// Component records are `None` when that component degraded; the matching
/// entry is listed in `metadata.degradations`. `tunescore` is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisBundle {
    /// Acoustic feature genome
    pub sonic_genome: Option<SonicGenome>,

    /// Musicianship quality metrics
    pub quality_metrics: Option<QualityMetrics>,

    /// Loudness and dynamics report
    pub mastering_report: Option<MasteringReport>,

    /// Ranked viral-segment candidates (best first)
    pub hook_candidates: Vec<HookCandidate>,

    /// Single best hook by energy and novelty
    pub primary_hook: Option<PrimaryHook>,

    /// Chord and harmony report
    pub chord_report: Option<ChordReport>,

    /// Genre ensemble prediction
    pub genre_prediction: Option<GenrePrediction>,

    /// Lyrical genome, when lyrics were supplied and non-empty
    pub lyrical_genome: Option<LyricalGenome>,

    /// Composite score
    pub tunescore: TuneScore,

    /// Run metadata
    pub metadata: AnalysisMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name_major() {
        assert_eq!(Key::Major(0).name(), "C");
        assert_eq!(Key::Major(1).name(), "C#");
        assert_eq!(Key::Major(6).name(), "F#");
        assert_eq!(Key::Major(11).name(), "B");
    }

    #[test]
    fn test_key_name_minor() {
        assert_eq!(Key::Minor(0).name(), "Cm");
        assert_eq!(Key::Minor(9).name(), "Am");
        assert_eq!(Key::Minor(11).name(), "Bm");
    }

    #[test]
    fn test_long_name_and_parts() {
        assert_eq!(Key::Major(7).long_name(), "G major");
        assert_eq!(Key::Minor(9).long_name(), "A minor");
        assert_eq!(Key::new(14, Mode::Minor), Key::Minor(2));
        assert_eq!(Key::Minor(4).tonic(), 4);
        assert_eq!(Key::Minor(4).mode(), Mode::Minor);
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Major).unwrap(), "\"major\"");
        assert_eq!(serde_json::to_string(&Mode::Minor).unwrap(), "\"minor\"");
    }
}
