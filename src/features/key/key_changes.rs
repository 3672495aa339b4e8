//! Key change detection
//!
//! Detects key changes (modulations) by detecting the key of equal-length
//! segments of the track and flagging every segment-to-segment change.
//!
//! # Algorithm
//!
//! 1. Divide track into `segments` equal, non-overlapping parts
//! 2. Detect key for each segment (silent segments are skipped)
//! 3. Report a change at the start of every segment whose key or mode differs
//!    from the previous detected segment

use serde::{Deserialize, Serialize};

use super::{detector::detect_key, templates::KeyTemplates};
use crate::analysis::result::Key;
use crate::error::AnalysisError;
use crate::features::chroma::Chroma;

/// Key change information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyChange {
    /// Timestamp of key change (start of the new segment, in seconds)
    pub time: f32,

    /// Key before change
    pub from_key: Key,

    /// Key after change
    pub to_key: Key,
}

/// Detect key changes in a chroma sequence
///
/// # Arguments
///
/// * `chroma_vectors` - Sequence of 12-element chroma vectors (one per frame)
/// * `frames_per_second` - Chroma frame rate (`sample_rate / hop_size`)
/// * `segments` - Number of equal segments compared (default: 4)
/// * `templates` - Key templates
///
/// # Returns
///
/// Key changes sorted by time; empty when the track has fewer frames than segments
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `segments` < 2 or the frame rate is not positive
pub fn detect_key_changes(
    chroma_vectors: &[Chroma],
    frames_per_second: f32,
    segments: usize,
    templates: &KeyTemplates,
) -> Result<Vec<KeyChange>, AnalysisError> {
    if segments < 2 {
        return Err(AnalysisError::InvalidInput(format!(
            "Need at least 2 segments for key change detection, got {}",
            segments
        )));
    }
    if frames_per_second <= 0.0 {
        return Err(AnalysisError::InvalidInput(
            "Frame rate must be positive".to_string(),
        ));
    }

    let segment_frames = chroma_vectors.len() / segments;
    if segment_frames == 0 {
        log::debug!(
            "Track too short for {} key segments ({} frames)",
            segments,
            chroma_vectors.len()
        );
        return Ok(Vec::new());
    }

    let mut changes = Vec::new();
    let mut previous: Option<Key> = None;

    for segment_idx in 0..segments {
        let start = segment_idx * segment_frames;
        let end = if segment_idx + 1 == segments {
            chroma_vectors.len()
        } else {
            start + segment_frames
        };

        let key = match detect_key(&chroma_vectors[start..end], templates) {
            Ok(result) => result.key,
            Err(e) => {
                log::debug!("Skipping key segment {}: {}", segment_idx, e);
                continue;
            }
        };

        if let Some(prev) = previous {
            if prev != key {
                changes.push(KeyChange {
                    time: start as f32 / frames_per_second,
                    from_key: prev,
                    to_key: key,
                });
            }
        }
        previous = Some(key);
    }

    log::debug!("Detected {} key changes over {} segments", changes.len(), segments);

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triad(root: usize, minor: bool) -> Chroma {
        let mut c = [0.05f32; 12];
        c[root] = 1.0;
        c[(root + if minor { 3 } else { 4 }) % 12] = 0.8;
        c[(root + 7) % 12] = 0.9;
        c
    }

    #[test]
    fn test_detect_key_changes_invalid_segments() {
        let templates = KeyTemplates::new();
        assert!(detect_key_changes(&[], 43.0, 1, &templates).is_err());
    }

    #[test]
    fn test_detect_key_changes_short_input() {
        let templates = KeyTemplates::new();
        let changes = detect_key_changes(&[triad(0, false); 3], 43.0, 4, &templates).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_stable_key_has_no_changes() {
        let templates = KeyTemplates::new();
        let frames = vec![triad(0, false); 400];
        assert!(detect_key_changes(&frames, 43.0, 4, &templates).unwrap().is_empty());
    }

    #[test]
    fn test_modulation_detected_at_segment_boundary() {
        let templates = KeyTemplates::new();
        let mut frames = vec![triad(0, false); 200];
        frames.extend(vec![triad(2, false); 200]);

        let changes = detect_key_changes(&frames, 40.0, 4, &templates).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from_key, Key::Major(0));
        assert_eq!(changes[0].to_key, Key::Major(2));
        assert!((changes[0].time - 5.0).abs() < 1e-6);
    }
}
