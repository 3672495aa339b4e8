//! Adaptive thresholding for onset picking
//!
//! Median + MAD (Median Absolute Deviation) thresholding as recommended by
//! McFee & Ellis (2014), robust to the handful of very strong attacks that
//! would inflate a mean/std threshold.

use crate::error::AnalysisError;
use crate::features::stats::median;

/// Compute adaptive threshold using median + MAD (Median Absolute Deviation)
///
/// `threshold = median(values) + k * MAD(values)` where
/// `MAD = median(|values - median(values)|)`.
///
/// # Reference
///
/// McFee, B., & Ellis, D. P. W. (2014). Better Beat Tracking Through Robust Onset Aggregation.
/// *Proceedings of the International Society for Music Information Retrieval Conference*.
///
/// # Arguments
///
/// * `values` - Flux values to threshold
/// * `k` - Multiplier for MAD (typically 2.0-3.0)
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if values are empty or `k` is negative
pub fn adaptive_threshold_median_mad(values: &[f32], k: f32) -> Result<f32, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty values for threshold calculation".to_string(),
        ));
    }

    if k < 0.0 {
        return Err(AnalysisError::InvalidInput(
            "MAD multiplier k must be non-negative".to_string(),
        ));
    }

    let med = median(values);
    let deviations: Vec<f32> = values.iter().map(|&v| (v - med).abs()).collect();
    let mad = median(&deviations);

    Ok(med + k * mad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_threshold_median_mad_basic() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0]; // Outlier at 100
        let threshold = adaptive_threshold_median_mad(&values, 2.5).unwrap();

        // Median 3.5, MAD 1.5: threshold unaffected by the outlier
        assert!((threshold - 7.25).abs() < 1e-6);
    }

    #[test]
    fn test_adaptive_threshold_median_mad_empty() {
        assert!(adaptive_threshold_median_mad(&[], 2.5).is_err());
        assert!(adaptive_threshold_median_mad(&[1.0], -1.0).is_err());
    }

    #[test]
    fn test_adaptive_threshold_median_mad_single_value() {
        let threshold = adaptive_threshold_median_mad(&[5.0], 2.5).unwrap();
        assert_eq!(threshold, 5.0);
    }
}
