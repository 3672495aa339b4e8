//! Dynamic-programming beat tracker
//!
//! Finds the beat sequence that maximizes onset strength at beat positions
//! while penalizing deviation of inter-beat intervals from the global tempo.
//!
//! # Algorithm
//!
//! For every frame `i`:
//!
//! `C[i] = O[i] + max_j { C[j] - tightness * ln((i - j) / period)² }`
//!
//! with `j` searched over `[i - 2·period, i - period/2]`. The best final beat
//! is the last strong local maximum of `C`; the sequence is recovered by
//! following back-links.
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use crate::error::AnalysisError;
use crate::features::stats::{mean, median, std_dev, EPSILON};

/// Default tempo-consistency weight
pub const TIGHTNESS: f32 = 100.0;

/// Track beats through an onset strength envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength (one value per frame)
/// * `frames_per_second` - Envelope frame rate
/// * `bpm` - Global tempo estimate
/// * `tightness` - Penalty weight for tempo deviation (default: [`TIGHTNESS`])
///
/// # Returns
///
/// Beat times in seconds, ascending. Empty when the envelope is flat.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a non-positive BPM or frame rate.
pub fn track_beats(
    envelope: &[f32],
    frames_per_second: f32,
    bpm: f32,
    tightness: f32,
) -> Result<Vec<f32>, AnalysisError> {
    if bpm <= 0.0 || frames_per_second <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid beat tracking parameters: bpm={}, fps={}",
            bpm, frames_per_second
        )));
    }

    let spread = std_dev(envelope);
    if envelope.len() < 2 || spread <= EPSILON {
        log::debug!("Flat onset envelope, no beats tracked");
        return Ok(Vec::new());
    }

    let period = 60.0 * frames_per_second / bpm;
    let local: Vec<f32> = envelope.iter().map(|&x| x / spread).collect();

    let n = local.len();
    let mut cumulative = vec![0.0f32; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];

    let search_far = (2.0 * period).round() as usize;
    let search_near = ((period / 2.0).round() as usize).max(1);

    for i in 0..n {
        let mut best: Option<(usize, f32)> = None;
        if i >= search_near {
            let lo = i.saturating_sub(search_far);
            let hi = i - search_near;
            for j in lo..=hi {
                let ratio = (i - j) as f32 / period;
                let score = cumulative[j] - tightness * ratio.ln().powi(2);
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((j, score));
                }
            }
        }

        match best {
            Some((j, score)) if score > 0.0 => {
                cumulative[i] = local[i] + score;
                backlink[i] = Some(j);
            }
            _ => cumulative[i] = local[i],
        }
    }

    let Some(last) = last_beat(&cumulative, &local) else {
        return Ok(Vec::new());
    };

    let mut frames = vec![last];
    let mut cursor = last;
    while let Some(prev) = backlink[cursor] {
        frames.push(prev);
        cursor = prev;
    }
    frames.reverse();

    let beats: Vec<f32> = frames
        .into_iter()
        .map(|f| f as f32 / frames_per_second)
        .collect();

    log::debug!(
        "Tracked {} beats at {:.1} BPM (period {:.2} frames)",
        beats.len(),
        bpm,
        period
    );

    Ok(beats)
}

/// Last local maximum of the cumulative score that reaches half the median
/// peak and sits on above-average onset strength
fn last_beat(cumulative: &[f32], local: &[f32]) -> Option<usize> {
    let n = cumulative.len();
    let onset_floor = mean(local);
    let maxima: Vec<usize> = (0..n)
        .filter(|&i| {
            let left = if i == 0 { f32::MIN } else { cumulative[i - 1] };
            let right = if i + 1 == n { f32::MIN } else { cumulative[i + 1] };
            cumulative[i] > left && cumulative[i] >= right
        })
        .collect();

    if maxima.is_empty() {
        return None;
    }

    let values: Vec<f32> = maxima.iter().map(|&i| cumulative[i]).collect();
    let floor = 0.5 * median(&values);

    maxima
        .iter()
        .rev()
        .find(|&&i| cumulative[i] >= floor && local[i] >= onset_floor)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_envelope(period_frames: usize, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| if i % period_frames == 5 { 1.0 } else { 0.02 })
            .collect()
    }

    #[test]
    fn test_beats_follow_clicks() {
        let fps = 40.0;
        let env = click_envelope(20, 800); // 120 BPM
        let beats = track_beats(&env, fps, 120.0, TIGHTNESS).unwrap();

        assert!(beats.len() >= 35, "got {} beats", beats.len());
        for pair in beats.windows(2) {
            assert!(((pair[1] - pair[0]) - 0.5).abs() < 0.03);
        }
        // beats land on clicks
        for &b in &beats {
            let frame = (b * fps).round() as usize;
            assert_eq!(frame % 20, 5);
        }
    }

    #[test]
    fn test_flat_envelope_has_no_beats() {
        assert!(track_beats(&[0.3; 500], 43.0, 120.0, TIGHTNESS).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_bpm() {
        assert!(track_beats(&[0.0; 10], 43.0, 0.0, TIGHTNESS).is_err());
    }
}
