//! Ordered lookup tables for threshold ladders
//!
//! Every banded score in the crate (tempo bands, CV bands, grade bands,
//! multiplier bands) is a small table evaluated by one of these helpers
//! instead of a hand-written if/else chain.
//!
//! ```
//! use tunescore::features::bands::{at_least, below, in_range};
//!
//! // "score >= 90 -> A, >= 80 -> B, else C"
//! assert_eq!(at_least(85.0, &[(90.0, 'A'), (80.0, 'B')], 'C'), 'B');
//! // "cv < 0.02 -> 100, < 0.04 -> 90, else 15"
//! assert_eq!(below(0.03, &[(0.02, 100.0), (0.04, 90.0)], 15.0), 90.0);
//! // "100 <= bpm < 130 -> 1.0"
//! assert_eq!(in_range(120.0, &[(100.0, 130.0, 1.0)], 0.2), 1.0);
//! ```

/// First value whose threshold `x` reaches, scanning a descending table
///
/// `table` is `[(threshold, value), ...]` ordered by decreasing threshold;
/// returns the value of the first entry with `x >= threshold`, else `fallback`.
pub fn at_least<T: Copy>(x: f32, table: &[(f32, T)], fallback: T) -> T {
    table
        .iter()
        .find(|(threshold, _)| x >= *threshold)
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

/// First value whose limit `x` stays under, scanning an ascending table
///
/// `table` is `[(limit, value), ...]` ordered by increasing limit; returns
/// the value of the first entry with `x < limit`, else `fallback`.
pub fn below<T: Copy>(x: f32, table: &[(f32, T)], fallback: T) -> T {
    table
        .iter()
        .find(|(limit, _)| x < *limit)
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

/// Value of the first half-open range `[lo, hi)` containing `x`
pub fn in_range<T: Copy>(x: f32, table: &[(f32, f32, T)], fallback: T) -> T {
    table
        .iter()
        .find(|(lo, hi, _)| x >= *lo && x < *hi)
        .map(|(_, _, value)| *value)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADES: [(f32, &str); 3] = [(90.0, "A"), (75.0, "B"), (50.0, "C")];

    #[test]
    fn test_at_least_boundaries() {
        assert_eq!(at_least(90.0, &GRADES, "F"), "A");
        assert_eq!(at_least(89.99, &GRADES, "F"), "B");
        assert_eq!(at_least(50.0, &GRADES, "F"), "C");
        assert_eq!(at_least(49.0, &GRADES, "F"), "F");
        assert_eq!(at_least(f32::NAN, &GRADES, "F"), "F");
    }

    #[test]
    fn test_below_boundaries() {
        let table = [(0.02, 100), (0.06, 80)];
        assert_eq!(below(0.0199, &table, 15), 100);
        assert_eq!(below(0.02, &table, 15), 80);
        assert_eq!(below(0.06, &table, 15), 15);
    }

    #[test]
    fn test_in_range_half_open() {
        let table = [(60.0, 70.0, 0.3), (70.0, 80.0, 0.45)];
        assert_eq!(in_range(70.0, &table, 0.2), 0.45);
        assert_eq!(in_range(69.9, &table, 0.2), 0.3);
        assert_eq!(in_range(80.0, &table, 0.2), 0.2);
    }
}
