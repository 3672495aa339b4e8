//! Key detection modules
//!
//! Detect musical key using:
//! - Krumhansl-Kessler templates (24 keys)
//! - Tonic from summed chroma energy, mode from template correlation
//! - Segment-wise key change detection

pub mod detector;
pub mod key_changes;
pub mod templates;

pub use detector::{detect_key, detect_key_from_profile};
pub use key_changes::{detect_key_changes, KeyChange};
pub use templates::KeyTemplates;

use crate::analysis::result::Key;

/// Key detection result
#[derive(Debug, Clone)]
pub struct KeyDetectionResult {
    /// Detected key
    pub key: Key,

    /// Confidence score (0.0-1.0), the winning template correlation
    pub confidence: f32,

    /// Pearson correlation with the major template at the detected tonic
    pub major_correlation: f32,

    /// Pearson correlation with the minor template at the detected tonic
    pub minor_correlation: f32,

    /// All 24 key correlations (ranked, highest first)
    pub all_scores: Vec<(Key, f32)>,
}
