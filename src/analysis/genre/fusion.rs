//! Fusion of heuristic, model and instrument signals

use std::collections::BTreeMap;

use super::heuristics::GENRES;

/// Weight of the normalized heuristic scores
pub const HEURISTIC_WEIGHT: f32 = 0.2;
/// Weight of the normalized external-model scores
pub const MODEL_WEIGHT: f32 = 0.2;

/// External classifier labels -> canonical genre
const LABEL_MAP: [(&str, &str); 24] = [
    ("pop", "Pop"),
    ("rock", "Rock"),
    ("hiphop", "Hip-Hop/Rap"),
    ("hip-hop", "Hip-Hop/Rap"),
    ("hip hop", "Hip-Hop/Rap"),
    ("rap", "Hip-Hop/Rap"),
    ("electronic", "Electronic"),
    ("edm", "Electronic"),
    ("dance", "Electronic"),
    ("house", "Electronic"),
    ("techno", "Electronic"),
    ("disco", "Electronic"),
    ("rnb", "R&B/Soul"),
    ("r&b", "R&B/Soul"),
    ("soul", "R&B/Soul"),
    ("funk", "R&B/Soul"),
    ("country", "Country"),
    ("folk", "Folk"),
    ("bluegrass", "Bluegrass"),
    ("jazz", "Jazz"),
    ("classical", "Classical"),
    ("metal", "Metal"),
    ("blues", "Blues"),
    ("reggae", "Reggae"),
];

/// Instrument -> `(genre, boost per unit presence)`
const INSTRUMENT_BOOSTS: [(&str, &[(&str, f32)]); 10] = [
    ("violin", &[("Country", 4.0), ("Bluegrass", 3.0), ("Folk", 1.5), ("Classical", 2.0)]),
    ("acoustic_guitar", &[("Folk", 3.0), ("Country", 2.5), ("Bluegrass", 1.5)]),
    ("banjo", &[("Bluegrass", 5.0), ("Country", 2.5), ("Folk", 1.0)]),
    ("harmonica", &[("Blues", 4.0), ("Folk", 2.5), ("Country", 1.5)]),
    ("drums", &[("Rock", 1.5), ("Pop", 1.0), ("Hip-Hop/Rap", 1.0)]),
    ("electric_guitar", &[("Rock", 3.0), ("Metal", 3.0), ("Blues", 1.5)]),
    ("synthesizer", &[("Electronic", 4.0), ("Pop", 1.5)]),
    ("piano", &[("Classical", 3.0), ("Jazz", 2.0), ("Pop", 1.0)]),
    ("saxophone", &[("Jazz", 4.0), ("R&B/Soul", 2.0), ("Blues", 1.0)]),
    ("trumpet", &[("Jazz", 3.0), ("Reggae", 1.0)]),
];

/// Map a classifier label to the canonical taxonomy
pub fn canonical_genre(label: &str) -> Option<&'static str> {
    let normalized = label.trim().to_lowercase().replace('_', "-");
    if let Some(genre) = GENRES.iter().find(|g| g.to_lowercase() == normalized) {
        return Some(genre);
    }
    LABEL_MAP
        .iter()
        .find(|(raw, _)| *raw == normalized)
        .map(|&(_, genre)| genre)
}

/// Remap classifier output to canonical genres, summing merged labels
pub fn remap_labels(raw: &BTreeMap<String, f32>) -> BTreeMap<String, f32> {
    let mut out = BTreeMap::new();
    for (label, &probability) in raw {
        if !probability.is_finite() || probability <= 0.0 {
            continue;
        }
        match canonical_genre(label) {
            Some(genre) => *out.entry(genre.to_string()).or_insert(0.0) += probability,
            None => log::debug!("Dropping unmapped classifier label '{}'", label),
        }
    }
    out
}

/// Genre boosts from instrument presence scores above `threshold`
pub fn instrument_boosts(presence: &BTreeMap<String, f32>, threshold: f32) -> BTreeMap<String, f32> {
    let mut boosts = BTreeMap::new();
    for (instrument, &score) in presence {
        if !score.is_finite() || score <= threshold {
            continue;
        }
        let key = instrument.trim().to_lowercase().replace(' ', "_");
        if let Some((_, targets)) = INSTRUMENT_BOOSTS.iter().find(|(name, _)| *name == key) {
            for &(genre, factor) in targets.iter() {
                *boosts.entry(genre.to_string()).or_insert(0.0) += factor * score;
            }
        }
    }
    boosts
}

/// Scale scores so they sum to 100; all-zero input stays zero
pub fn normalize_to_100(scores: &BTreeMap<String, f32>) -> BTreeMap<String, f32> {
    let total: f32 = scores.values().sum();
    scores
        .iter()
        .map(|(g, &s)| (g.clone(), if total > 0.0 { s / total * 100.0 } else { 0.0 }))
        .collect()
}

/// Fuse the three sources per genre
///
/// `model` and `boosts` are `None` when their source was unavailable; with
/// both missing the result is the normalized heuristic score.
pub fn fuse(
    heuristic: &BTreeMap<String, f32>,
    model: Option<&BTreeMap<String, f32>>,
    boosts: Option<&BTreeMap<String, f32>>,
) -> BTreeMap<String, f32> {
    let heuristic = normalize_to_100(heuristic);
    if model.is_none() && boosts.is_none() {
        return heuristic;
    }
    let model = model.map(normalize_to_100);

    GENRES
        .iter()
        .map(|&genre| {
            let h = heuristic.get(genre).copied().unwrap_or(0.0);
            let m = model.as_ref().and_then(|m| m.get(genre)).copied().unwrap_or(0.0);
            let b = boosts.and_then(|b| b.get(genre)).copied().unwrap_or(0.0);
            (genre.to_string(), HEURISTIC_WEIGHT * h + MODEL_WEIGHT * m + b)
        })
        .collect()
}

/// Top `n` genres renormalized to sum to 100, best first
///
/// Ties keep taxonomy order. When every score is zero the returned genres
/// share 100 equally.
pub fn rank_top(scores: &BTreeMap<String, f32>, n: usize) -> Vec<(String, f32)> {
    let mut ranked: Vec<(String, f32)> = GENRES
        .iter()
        .map(|&g| (g.to_string(), scores.get(g).copied().unwrap_or(0.0).max(0.0)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n.max(1));

    let total: f32 = ranked.iter().map(|(_, s)| s).sum();
    let count = ranked.len() as f32;
    ranked
        .into_iter()
        .map(|(g, s)| {
            let confidence = if total > 0.0 { s / total * 100.0 } else { 100.0 / count };
            (g, confidence)
        })
        .collect()
}
