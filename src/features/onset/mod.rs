//! Onset detection modules
//!
//! - Spectral flux onset strength envelope
//! - Median + MAD adaptive threshold
//! - Peak picking into onset frames

pub mod spectral_flux;
pub mod threshold;

use crate::features::period::peak_picking::find_peaks;

/// MAD multiplier for onset picking
pub const ONSET_MAD_K: f32 = 2.5;

/// Onsets must also exceed this fraction of the strongest flux value
pub const ONSET_RELATIVE_FLOOR: f32 = 0.1;

/// Minimum spacing between onsets in seconds
pub const MIN_ONSET_SPACING_SECONDS: f32 = 0.05;

/// Pick onset frames from a flux envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength (one value per frame)
/// * `frames_per_second` - Envelope frame rate
///
/// # Returns
///
/// Onset frame indices in ascending order (empty for a flat envelope)
pub fn detect_onsets(envelope: &[f32], frames_per_second: f32) -> Vec<usize> {
    let Ok(adaptive) = threshold::adaptive_threshold_median_mad(envelope, ONSET_MAD_K) else {
        return Vec::new();
    };
    let max = envelope.iter().copied().fold(0.0f32, f32::max);
    let threshold = adaptive.max(ONSET_RELATIVE_FLOOR * max);

    let min_distance = ((MIN_ONSET_SPACING_SECONDS * frames_per_second).round() as usize).max(1);

    let onsets: Vec<usize> = find_peaks(envelope, threshold, min_distance)
        .into_iter()
        .map(|(idx, _)| idx)
        .collect();

    log::debug!(
        "Picked {} onsets (threshold {:.4}, min distance {} frames)",
        onsets.len(),
        threshold,
        min_distance
    );

    onsets
}
