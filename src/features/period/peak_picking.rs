//! Robust peak detection utilities
//!
//! Finds local maxima in 1D signals (onset envelopes, novelty curves).

use crate::features::stats::EPSILON;

/// Find peaks in a signal
///
/// Detects local maxima at or above an absolute threshold that are separated
/// by at least `min_distance` samples.
///
/// # Arguments
///
/// * `signal` - Signal to find peaks in
/// * `threshold` - Minimum peak height (absolute)
/// * `min_distance` - Minimum distance between peaks (in samples)
///
/// # Returns
///
/// Vector of (index, value) pairs for detected peaks, sorted by index
///
/// # Algorithm
///
/// 1. Find all local maxima (value > left neighbor && value >= right neighbor)
/// 2. Filter by threshold
/// 3. Enforce minimum distance (keep highest peak when too close)
///
/// # Example
///
/// ```
/// use tunescore::features::period::peak_picking::find_peaks;
///
/// let signal = vec![0.0, 0.5, 1.0, 0.7, 0.3, 0.9, 0.2];
/// let peaks = find_peaks(&signal, 0.5, 2);
/// assert_eq!(peaks, vec![(2, 1.0), (5, 0.9)]);
/// ```
pub fn find_peaks(signal: &[f32], threshold: f32, min_distance: usize) -> Vec<(usize, f32)> {
    if signal.len() < 3 {
        return vec![];
    }

    let max_value = signal.iter().copied().fold(0.0f32, f32::max);
    if max_value < EPSILON {
        return vec![];
    }

    let mut peaks: Vec<(usize, f32)> = (1..signal.len() - 1)
        .filter(|&i| signal[i] > signal[i - 1] && signal[i] >= signal[i + 1])
        .filter(|&i| signal[i] >= threshold)
        .map(|i| (i, signal[i]))
        .collect();

    if min_distance > 0 && peaks.len() > 1 {
        // Highest first so the strongest peak in a cluster survives
        peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut kept: Vec<(usize, f32)> = Vec::with_capacity(peaks.len());
        for (idx, value) in peaks {
            let too_close = kept
                .iter()
                .any(|(existing, _)| idx.abs_diff(*existing) < min_distance);
            if !too_close {
                kept.push((idx, value));
            }
        }
        peaks = kept;
    }

    peaks.sort_by_key(|(idx, _)| *idx);

    log::trace!("Found {} peaks in signal of length {}", peaks.len(), signal.len());

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_peaks_basic() {
        let signal = vec![0.0, 0.5, 1.0, 0.7, 0.3, 0.9, 0.2];
        let peaks = find_peaks(&signal, 0.5, 2);
        assert_eq!(peaks, vec![(2, 1.0), (5, 0.9)]);
    }

    #[test]
    fn test_find_peaks_too_short() {
        assert!(find_peaks(&[], 0.5, 2).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 0.5, 2).is_empty());
    }

    #[test]
    fn test_find_peaks_threshold_is_absolute() {
        let signal = vec![0.1, 0.2, 0.3, 0.4, 0.3, 0.2, 0.1];
        assert_eq!(find_peaks(&signal, 0.35, 1), vec![(3, 0.4)]);
        assert!(find_peaks(&signal, 0.5, 1).is_empty());
    }

    #[test]
    fn test_find_peaks_min_distance_keeps_highest() {
        let signal = vec![0.0, 0.5, 1.0, 0.8, 0.9, 0.3, 0.1];
        let peaks = find_peaks(&signal, 0.3, 3);
        assert_eq!(peaks, vec![(2, 1.0)]);
    }

    #[test]
    fn test_find_peaks_plateau_counts_once() {
        let signal = vec![0.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&signal, 0.5, 1), vec![(1, 1.0)]);
    }
}
