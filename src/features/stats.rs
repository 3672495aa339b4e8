//! Small descriptive-statistics helpers shared by the analyzers

/// Numerical stability epsilon
pub const EPSILON: f32 = 1e-10;

/// Arithmetic mean (0.0 for empty input)
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population standard deviation (0.0 for empty input)
pub fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|&v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32;
    var.sqrt()
}

/// Population variance (0.0 for empty input)
pub fn variance(values: &[f32]) -> f32 {
    let s = std_dev(values);
    s * s
}

/// Coefficient of variation `std / mean` (0.0 when the mean is ~0)
pub fn coefficient_of_variation(values: &[f32]) -> f32 {
    let m = mean(values);
    if m.abs() <= EPSILON {
        return 0.0;
    }
    std_dev(values) / m.abs()
}

/// Median (0.0 for empty input)
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) * 0.5
    } else {
        sorted[n / 2]
    }
}

/// Pearson correlation of two equally long series
///
/// Returns 0.0 when either series is constant or the lengths differ.
pub fn pearson(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let (ma, mb) = (mean(a), mean(b));
    let mut num = 0.0f32;
    let mut da = 0.0f32;
    let mut db = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        num += (x - ma) * (y - mb);
        da += (x - ma) * (x - ma);
        db += (y - mb) * (y - mb);
    }
    let denom = (da * db).sqrt();
    if denom <= EPSILON {
        0.0
    } else {
        (num / denom).clamp(-1.0, 1.0)
    }
}

/// Cosine similarity of two vectors (0.0 if either is all zeros)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na <= EPSILON || nb <= EPSILON {
        0.0
    } else {
        dot / (na * nb)
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Divide every value by the maximum (all zeros stay zeros)
pub fn normalize_by_max(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    if max <= EPSILON {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&v| (v / max).max(0.0)).collect()
}

/// Round to two decimals (presentation of scores)
pub fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}
