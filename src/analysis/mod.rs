//! Scoring components and their result records
//!
//! Each component consumes the shared [`crate::features::TrackFeatures`] (or
//! the waveform, for mastering) and returns a typed record or an
//! [`crate::AnalysisError`]:
//! - Sonic genome, quality, mastering, chords, hooks
//! - Genre ensemble over the sonic genome and optional external sources
//! - Lyrical genome from lyrics text
//! - TuneScore aggregation over all of the above

pub mod chords;
pub mod genre;
pub mod hooks;
pub mod lyrics;
pub mod mastering;
pub mod metadata;
pub mod quality;
pub mod result;
pub mod sonic;
pub mod tunescore;
