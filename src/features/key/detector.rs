//! Key detection algorithm
//!
//! Sums chroma energy over time, takes the strongest pitch class as the tonic
//! and decides the mode by correlating the profile against the major and minor
//! Krumhansl-Kessler templates rooted on that tonic.

use super::templates::KeyTemplates;
use super::KeyDetectionResult;
use crate::analysis::result::Key;
use crate::error::AnalysisError;
use crate::features::chroma::normalization::sum_chroma;
use crate::features::chroma::Chroma;
use crate::features::stats::{clamp01, pearson, EPSILON};

/// Detect musical key from chroma vectors
///
/// # Arguments
///
/// * `chroma_vectors` - Sequence of 12-element chroma vectors (one per frame)
/// * `templates` - Key templates (Krumhansl-Kessler profiles)
///
/// # Returns
///
/// Key detection result with:
/// - Detected key (tonic = chroma-energy argmax, mode = higher template correlation)
/// - Confidence score (0.0-1.0)
/// - Major/minor correlations at the detected tonic
/// - All 24 key correlations (ranked)
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` if there are no frames or the
/// summed chroma carries no energy.
///
/// # Example
///
/// ```
/// use tunescore::features::key::{detect_key, KeyTemplates};
/// use tunescore::analysis::result::Key;
///
/// let mut c_major = [0.05f32; 12];
/// c_major[0] = 1.0;
/// c_major[4] = 0.8;
/// c_major[7] = 0.9;
/// let result = detect_key(&[c_major; 8], &KeyTemplates::new())?;
/// assert_eq!(result.key, Key::Major(0));
/// # Ok::<(), tunescore::AnalysisError>(())
/// ```
pub fn detect_key(
    chroma_vectors: &[Chroma],
    templates: &KeyTemplates,
) -> Result<KeyDetectionResult, AnalysisError> {
    log::debug!("Detecting key from {} chroma vectors", chroma_vectors.len());

    if chroma_vectors.is_empty() {
        return Err(AnalysisError::extraction("key", "no chroma frames"));
    }

    detect_key_from_profile(&sum_chroma(chroma_vectors), templates)
}

/// Detect the key of an already-summed pitch-class profile
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` when the profile is all zeros.
pub fn detect_key_from_profile(
    profile: &Chroma,
    templates: &KeyTemplates,
) -> Result<KeyDetectionResult, AnalysisError> {
    let total: f32 = profile.iter().sum();
    if total <= EPSILON || !total.is_finite() {
        return Err(AnalysisError::extraction("key", "no tonal energy in chroma"));
    }

    let tonic = profile
        .iter()
        .enumerate()
        .fold((0usize, f32::MIN), |best, (pc, &v)| if v > best.1 { (pc, v) } else { best })
        .0 as u32;

    let major_correlation = pearson(profile, templates.major_template(tonic));
    let minor_correlation = pearson(profile, templates.minor_template(tonic));

    let key = if minor_correlation > major_correlation {
        Key::Minor(tonic)
    } else {
        Key::Major(tonic)
    };

    let mut all_scores: Vec<(Key, f32)> = (0..12u32)
        .map(|k| (Key::Major(k), pearson(profile, templates.major_template(k))))
        .chain((0..12u32).map(|k| (Key::Minor(k), pearson(profile, templates.minor_template(k)))))
        .collect();
    all_scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let confidence = clamp01(major_correlation.max(minor_correlation));

    log::debug!(
        "Key {} (major r={:.3}, minor r={:.3}, confidence {:.3})",
        key.name(),
        major_correlation,
        minor_correlation,
        confidence
    );

    Ok(KeyDetectionResult {
        key,
        confidence,
        major_correlation,
        minor_correlation,
        all_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(weights: &[(usize, f32)]) -> Chroma {
        let mut c = [0.05f32; 12];
        for &(pc, w) in weights {
            c[pc] = w;
        }
        c
    }

    #[test]
    fn test_c_major_triad() {
        let templates = KeyTemplates::new();
        let result = detect_key_from_profile(&profile(&[(0, 1.0), (4, 0.8), (7, 0.9)]), &templates).unwrap();
        assert_eq!(result.key, Key::Major(0));
        assert!(result.major_correlation > result.minor_correlation);
        assert_eq!(result.all_scores.len(), 24);
    }

    #[test]
    fn test_a_minor_triad() {
        let templates = KeyTemplates::new();
        let result = detect_key_from_profile(&profile(&[(9, 1.0), (0, 0.8), (4, 0.9)]), &templates).unwrap();
        assert_eq!(result.key, Key::Minor(9));
    }

    #[test]
    fn test_silent_profile_fails() {
        let templates = KeyTemplates::new();
        assert!(detect_key_from_profile(&[0.0; 12], &templates).is_err());
        assert!(detect_key(&[], &templates).is_err());
    }
}
