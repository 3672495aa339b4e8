//! Temporal chroma smoothing

use super::Chroma;

/// Smooth chroma vectors over time with a centered moving average
///
/// # Arguments
///
/// * `chroma_vectors` - Sequence of 12-element chroma vectors
/// * `window_size` - Smoothing window size in frames (e.g., 5); 0 or 1 is a no-op
///
/// # Returns
///
/// Smoothed chroma vectors (same length as the input)
pub fn smooth_chroma(chroma_vectors: &[Chroma], window_size: usize) -> Vec<Chroma> {
    if window_size <= 1 || chroma_vectors.is_empty() {
        return chroma_vectors.to_vec();
    }

    log::debug!(
        "Smoothing {} chroma vectors with window size {}",
        chroma_vectors.len(),
        window_size
    );

    let half = window_size / 2;
    let n = chroma_vectors.len();

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            let mut acc = [0.0f32; 12];
            for frame in &chroma_vectors[lo..hi] {
                for (a, &c) in acc.iter_mut().zip(frame) {
                    *a += c;
                }
            }
            let count = (hi - lo) as f32;
            acc.iter_mut().for_each(|a| *a /= count);
            acc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_spreads_impulse() {
        let mut frames = vec![[0.0f32; 12]; 5];
        frames[2][0] = 3.0;
        let smoothed = smooth_chroma(&frames, 3);
        assert_eq!(smoothed.len(), 5);
        assert!((smoothed[1][0] - 1.0).abs() < 1e-6);
        assert!((smoothed[2][0] - 1.0).abs() < 1e-6);
        assert_eq!(smoothed[0][0], 0.0);
    }

    #[test]
    fn test_window_one_is_identity() {
        let frames = vec![[0.5f32; 12]; 3];
        assert_eq!(smooth_chroma(&frames, 1), frames);
    }
}
