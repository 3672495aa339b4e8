//! Configuration parameters for track analysis

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::ChannelMixMode;

/// Analysis configuration parameters
///
/// All fields have defaults; a partial JSON document can be deserialized on
/// top of them thanks to `#[serde(default)]`.
///
/// ```
/// let config: tunescore::AnalysisConfig =
///     serde_json::from_str(r#"{ "hop_size": 256 }"#).unwrap();
/// assert_eq!(config.hop_size, 256);
/// assert_eq!(config.frame_size, 2048);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Front-end
    /// Sample rate every waveform is resampled to before analysis (default: 22050)
    pub target_sample_rate: u32,

    /// How multi-channel audio is folded to mono (default: Average)
    pub channel_mix: ChannelMixMode,

    // STFT parameters
    /// Frame size for STFT (default: 2048)
    pub frame_size: usize,

    /// Hop size for STFT (default: 512)
    pub hop_size: usize,

    // Tempo
    /// Minimum BPM to consider (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM to consider (default: 180.0)
    pub max_bpm: f32,

    // Chroma
    /// Reference tuning frequency (default: 440.0 Hz, A4)
    pub center_frequency: f32,

    /// Enable soft chroma mapping (default: true)
    /// Soft mapping spreads frequency bins to neighboring semitones for robustness
    pub soft_chroma_mapping: bool,

    /// Soft mapping standard deviation in semitones (default: 0.5)
    pub soft_mapping_sigma: f32,

    /// Chroma sharpening power (default: 1.0 = no sharpening)
    pub chroma_sharpening_power: f32,

    /// Hook scorer settings
    pub hooks: HookConfig,
    /// Chord analyzer settings
    pub chords: ChordConfig,
    /// Genre ensemble settings
    pub genre: GenreConfig,
    /// Mastering analyzer settings
    pub mastering: MasteringConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 22050,
            channel_mix: ChannelMixMode::Average,
            frame_size: 2048,
            hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 180.0,
            center_frequency: 440.0,
            soft_chroma_mapping: true,
            soft_mapping_sigma: 0.5,
            chroma_sharpening_power: 1.0,
            hooks: HookConfig::default(),
            chords: ChordConfig::default(),
            genre: GenreConfig::default(),
            mastering: MasteringConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check parameter consistency
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] naming the first bad field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: &str| Err(AnalysisError::InvalidInput(msg.to_string()));

        if self.target_sample_rate < 8000 {
            return invalid("target_sample_rate must be at least 8000 Hz");
        }
        if self.frame_size < 256 || !self.frame_size.is_power_of_two() {
            return invalid("frame_size must be a power of two >= 256");
        }
        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return invalid("hop_size must be in 1..=frame_size");
        }
        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return invalid("min_bpm must be positive and below max_bpm");
        }
        if self.center_frequency <= 0.0 {
            return invalid("center_frequency must be positive");
        }
        if self.soft_mapping_sigma <= 0.0 || self.chroma_sharpening_power <= 0.0 {
            return invalid("chroma mapping parameters must be positive");
        }
        if self.hooks.window_seconds <= 0.0 || self.hooks.step_seconds <= 0.0 {
            return invalid("hook window and step must be positive");
        }
        if self.hooks.primary_window_seconds <= 0.0 {
            return invalid("primary hook window must be positive");
        }
        if self.chords.window_seconds <= 0.0 || !(0.0..1.0).contains(&self.chords.overlap) {
            return invalid("chord window must be positive and overlap in [0, 1)");
        }
        if self.chords.modulation_segments < 2 {
            return invalid("modulation_segments must be at least 2");
        }
        if self.genre.top_n == 0 {
            return invalid("genre top_n must be at least 1");
        }
        if self.mastering.segment_seconds <= 0.0 {
            return invalid("mastering segment length must be positive");
        }
        Ok(())
    }
}

/// Hook / viral-segment scorer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Candidate clip length in seconds (default: 15.0)
    pub window_seconds: f32,
    /// Step between candidate starts in seconds (default: 1.0)
    pub step_seconds: f32,
    /// Number of ranked candidates returned (default: 5)
    pub top_n: usize,
    /// Windows must start after this many seconds to earn the placement bonus (default: 15.0)
    pub intro_guard_seconds: f32,
    /// Windows must end this many seconds before the end for the bonus (default: 30.0)
    pub outro_guard_seconds: f32,
    /// Window length for the single primary hook (default: 15.0)
    pub primary_window_seconds: f32,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            window_seconds: 15.0,
            step_seconds: 1.0,
            top_n: 5,
            intro_guard_seconds: 15.0,
            outro_guard_seconds: 30.0,
            primary_window_seconds: 15.0,
        }
    }
}

/// Chord / harmonic analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordConfig {
    /// Template-matching window in seconds (default: 2.0)
    pub window_seconds: f32,
    /// Fractional overlap between windows (default: 0.5)
    pub overlap: f32,
    /// Number of equal segments compared for modulations (default: 4)
    pub modulation_segments: usize,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            window_seconds: 2.0,
            overlap: 0.5,
            modulation_segments: 4,
        }
    }
}

/// Genre ensemble settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenreConfig {
    /// Number of genres returned (default: 5)
    pub top_n: usize,
    /// Instrument presence above which a boost applies (default: 0.01)
    pub presence_threshold: f32,
}

impl Default for GenreConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            presence_threshold: 0.01,
        }
    }
}

/// Mastering analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MasteringConfig {
    /// Segment length for the dynamic-range median (default: 3.0 s)
    pub segment_seconds: f32,
    /// Half-width of the "optimal" band around a platform target (default: 1.0 LU)
    pub platform_tolerance_lu: f32,
}

impl Default for MasteringConfig {
    fn default() -> Self {
        Self {
            segment_seconds: 3.0,
            platform_tolerance_lu: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_hop() {
        let config = AnalysisConfig {
            hop_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_bpm_range() {
        let config = AnalysisConfig {
            min_bpm: 200.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_override() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "hooks": { "top_n": 3 } }"#).unwrap();
        assert_eq!(config.hooks.top_n, 3);
        assert_eq!(config.hooks.window_seconds, 15.0);
        assert_eq!(config.target_sample_rate, 22050);
    }
}
