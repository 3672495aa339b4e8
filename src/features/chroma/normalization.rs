//! Chroma normalization strategies

use super::Chroma;
use crate::features::stats::EPSILON;

/// Sharpen chroma vector to emphasize prominent semitones
///
/// # Arguments
///
/// * `chroma` - 12-element chroma vector
/// * `power` - Sharpening power (e.g., 1.5 or 2.0)
///
/// # Returns
///
/// Chroma vector with every bin raised to `power` (not renormalized)
pub fn sharpen_chroma(chroma: &Chroma, power: f32) -> Chroma {
    let mut out = [0.0f32; 12];
    for (o, &c) in out.iter_mut().zip(chroma) {
        *o = c.max(0.0).powf(power);
    }
    out
}

/// Scale so the strongest pitch class is 1.0 (all-zero input stays zero)
pub fn normalize_max(chroma: &Chroma) -> Chroma {
    let max = chroma.iter().copied().fold(0.0f32, f32::max);
    if max <= EPSILON {
        return [0.0; 12];
    }
    let mut out = *chroma;
    out.iter_mut().for_each(|c| *c /= max);
    out
}

/// Sum a sequence of chroma frames into one profile
pub fn sum_chroma(frames: &[Chroma]) -> Chroma {
    let mut total = [0.0f32; 12];
    for frame in frames {
        for (t, &c) in total.iter_mut().zip(frame) {
            *t += c;
        }
    }
    total
}
