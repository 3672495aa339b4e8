//! Analysis metadata structures

use serde::{Deserialize, Serialize};

use super::result::Degradation;

/// Metadata describing one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate the DSP components ran at (Hz)
    pub sample_rate: u32,

    /// Sample rate of the decoded input (Hz)
    pub source_sample_rate: u32,

    /// Channel count of the decoded input
    pub channels: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Track title supplied by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Artist name supplied by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    /// Components that fell back to defaults
    pub degradations: Vec<Degradation>,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            source_sample_rate: 0,
            channels: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            artist: None,
            degradations: vec![],
        }
    }
}

impl AnalysisMetadata {
    /// True when the named component degraded
    pub fn is_degraded(&self, component: &str) -> bool {
        self.degradations.iter().any(|d| d.component == component)
    }
}
