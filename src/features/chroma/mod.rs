//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Chroma vector computation
//! - Normalization strategies
//! - Temporal smoothing

pub mod extractor;
pub mod normalization;
pub mod smoothing;

pub use extractor::ChromaExtractor;

/// One 12-bin pitch-class profile (index 0 = C)
pub type Chroma = [f32; 12];

/// Pitch-class names, index 0 = C
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
