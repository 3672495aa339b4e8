//! Rule-based genre scoring
//!
//! Each genre is a small table of weighted conditions over the sonic genome
//! plus a keyword list matched against the lyrics. A genre's raw score is the
//! sum of the satisfied conditions, clamped to [0, 100].

use std::collections::BTreeMap;

use crate::analysis::sonic::SonicGenome;

/// Canonical genre taxonomy, in tie-break order
pub const GENRES: [&str; 13] = [
    "Pop",
    "Rock",
    "Hip-Hop/Rap",
    "Electronic",
    "R&B/Soul",
    "Country",
    "Folk",
    "Bluegrass",
    "Jazz",
    "Classical",
    "Metal",
    "Blues",
    "Reggae",
];

/// Genome feature a condition reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Energy (0-1)
    Energy,
    /// Danceability (0-1)
    Danceability,
    /// Valence (0-1)
    Valence,
    /// Acousticness (0-1)
    Acousticness,
    /// Mean spectral centroid (Hz)
    Brightness,
    /// Electronic-production confidence (0-1)
    Electronic,
}

impl Feature {
    fn read(self, genome: &SonicGenome) -> f32 {
        match self {
            Feature::Energy => genome.energy,
            Feature::Danceability => genome.danceability,
            Feature::Valence => genome.valence,
            Feature::Acousticness => genome.acousticness,
            Feature::Brightness => genome.spectral_centroid.mean,
            Feature::Electronic => genome.electronic_confidence,
        }
    }
}

/// One weighted condition
#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// Feature strictly above the threshold
    Above(Feature, f32, f32),
    /// Feature strictly below the threshold
    Below(Feature, f32, f32),
}

impl Condition {
    fn points(&self, genome: &SonicGenome) -> f32 {
        match *self {
            Condition::Above(feature, threshold, points) if feature.read(genome) > threshold => points,
            Condition::Below(feature, threshold, points) if feature.read(genome) < threshold => points,
            _ => 0.0,
        }
    }
}

/// Scoring rule of one genre
#[derive(Debug, Clone, Copy)]
pub struct GenreRule {
    /// Canonical genre name
    pub genre: &'static str,
    /// Tempo band `[lo, hi)` in BPM and the points it earns
    pub tempo: (f32, f32, f32),
    /// Feature conditions
    pub conditions: &'static [Condition],
    /// Lyric keywords
    pub keywords: &'static [&'static str],
    /// Points per keyword hit
    pub keyword_points: f32,
    /// Cap on keyword points
    pub keyword_cap: f32,
}

use Condition::{Above, Below};
use Feature::*;

/// Rule table, one entry per genre in [`GENRES`] order
pub const RULES: [GenreRule; 13] = [
    GenreRule {
        genre: "Pop",
        tempo: (100.0, 130.0, 25.0),
        conditions: &[
            Above(Danceability, 0.6, 20.0),
            Above(Energy, 0.5, 15.0),
            Above(Valence, 0.5, 15.0),
            Below(Acousticness, 0.5, 10.0),
        ],
        keywords: &["love", "baby", "tonight", "heart", "dance"],
        keyword_points: 5.0,
        keyword_cap: 15.0,
    },
    GenreRule {
        genre: "Rock",
        tempo: (100.0, 150.0, 20.0),
        conditions: &[
            Above(Energy, 0.65, 25.0),
            Below(Acousticness, 0.4, 15.0),
            Above(Brightness, 2000.0, 15.0),
            Below(Electronic, 0.5, 10.0),
        ],
        keywords: &["rock", "road", "fire", "wild", "rebel"],
        keyword_points: 5.0,
        keyword_cap: 15.0,
    },
    GenreRule {
        genre: "Hip-Hop/Rap",
        tempo: (80.0, 100.0, 25.0),
        conditions: &[
            Above(Danceability, 0.6, 20.0),
            Below(Acousticness, 0.3, 15.0),
            Above(Energy, 0.5, 10.0),
        ],
        keywords: &["money", "street", "hustle", "flow", "rap", "crew", "cash"],
        keyword_points: 6.0,
        keyword_cap: 30.0,
    },
    GenreRule {
        genre: "Electronic",
        tempo: (118.0, 140.0, 25.0),
        conditions: &[
            Above(Electronic, 0.5, 30.0),
            Below(Acousticness, 0.2, 15.0),
            Above(Danceability, 0.6, 15.0),
        ],
        keywords: &["night", "lights", "bass", "drop", "club"],
        keyword_points: 5.0,
        keyword_cap: 15.0,
    },
    GenreRule {
        genre: "R&B/Soul",
        tempo: (60.0, 100.0, 20.0),
        conditions: &[
            Above(Danceability, 0.5, 15.0),
            Below(Energy, 0.7, 15.0),
            Below(Acousticness, 0.6, 10.0),
            Below(Brightness, 2500.0, 15.0),
        ],
        keywords: &["baby", "love", "body", "soul", "feel"],
        keyword_points: 5.0,
        keyword_cap: 25.0,
    },
    GenreRule {
        genre: "Country",
        tempo: (80.0, 130.0, 20.0),
        conditions: &[
            Above(Acousticness, 0.4, 20.0),
            Above(Valence, 0.4, 10.0),
            Below(Electronic, 0.3, 15.0),
        ],
        keywords: &["truck", "whiskey", "road", "home", "town", "country", "beer"],
        keyword_points: 7.0,
        keyword_cap: 35.0,
    },
    GenreRule {
        genre: "Folk",
        tempo: (70.0, 120.0, 15.0),
        conditions: &[
            Above(Acousticness, 0.6, 30.0),
            Below(Energy, 0.5, 20.0),
            Below(Electronic, 0.2, 10.0),
        ],
        keywords: &["river", "home", "mountain", "land", "wind"],
        keyword_points: 5.0,
        keyword_cap: 25.0,
    },
    GenreRule {
        genre: "Bluegrass",
        tempo: (120.0, 180.0, 25.0),
        conditions: &[
            Above(Acousticness, 0.6, 30.0),
            Below(Electronic, 0.2, 15.0),
            Above(Energy, 0.4, 10.0),
        ],
        keywords: &["mountain", "kentucky", "holler", "banjo"],
        keyword_points: 5.0,
        keyword_cap: 20.0,
    },
    GenreRule {
        genre: "Jazz",
        tempo: (80.0, 160.0, 10.0),
        conditions: &[
            Above(Acousticness, 0.5, 20.0),
            Above(Valence, 0.4, 10.0),
            Below(Electronic, 0.3, 15.0),
            Below(Danceability, 0.6, 15.0),
        ],
        keywords: &["blue", "night", "moon", "swing"],
        keyword_points: 5.0,
        keyword_cap: 15.0,
    },
    GenreRule {
        genre: "Classical",
        tempo: (60.0, 120.0, 10.0),
        conditions: &[
            Above(Acousticness, 0.7, 35.0),
            Below(Energy, 0.4, 25.0),
            Below(Danceability, 0.4, 20.0),
            Below(Electronic, 0.2, 10.0),
        ],
        keywords: &[],
        keyword_points: 0.0,
        keyword_cap: 0.0,
    },
    GenreRule {
        genre: "Metal",
        tempo: (100.0, 180.0, 15.0),
        conditions: &[
            Above(Energy, 0.8, 35.0),
            Above(Brightness, 3000.0, 20.0),
            Below(Acousticness, 0.2, 15.0),
        ],
        keywords: &["death", "fire", "blood", "dark", "hell"],
        keyword_points: 5.0,
        keyword_cap: 15.0,
    },
    GenreRule {
        genre: "Blues",
        tempo: (60.0, 110.0, 20.0),
        conditions: &[
            Below(Valence, 0.5, 20.0),
            Above(Acousticness, 0.4, 15.0),
            Below(Energy, 0.7, 10.0),
        ],
        keywords: &["blues", "cry", "lonely", "trouble", "woman"],
        keyword_points: 5.0,
        keyword_cap: 25.0,
    },
    GenreRule {
        genre: "Reggae",
        tempo: (60.0, 90.0, 25.0),
        conditions: &[
            Above(Danceability, 0.6, 20.0),
            Above(Valence, 0.5, 15.0),
            Below(Energy, 0.7, 10.0),
        ],
        keywords: &["jah", "irie", "babylon", "rasta", "zion"],
        keyword_points: 5.0,
        keyword_cap: 25.0,
    },
];

impl GenreRule {
    /// Raw score of this genre (0-100)
    pub fn score(&self, genome: &SonicGenome, lyric_words: &[String]) -> f32 {
        let (lo, hi, tempo_points) = self.tempo;
        let mut score = if genome.tempo >= lo && genome.tempo < hi {
            tempo_points
        } else {
            0.0
        };
        score += self.conditions.iter().map(|c| c.points(genome)).sum::<f32>();

        let hits = lyric_words
            .iter()
            .filter(|w| self.keywords.contains(&w.as_str()))
            .count();
        score += (hits as f32 * self.keyword_points).min(self.keyword_cap);

        score.clamp(0.0, 100.0)
    }
}

/// Score every genre from the genome and optional lyrics
pub fn heuristic_scores(genome: &SonicGenome, lyrics: Option<&str>) -> BTreeMap<String, f32> {
    let words: Vec<String> = lyrics
        .map(|text| {
            text.split(|c: char| !c.is_alphanumeric() && c != '\'')
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default();

    RULES
        .iter()
        .map(|rule| (rule.genre.to_string(), rule.score(genome, &words)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::result::Mode;
    use crate::features::Summary;

    pub(crate) fn genome(tempo: f32, energy: f32, danceability: f32, acousticness: f32) -> SonicGenome {
        SonicGenome {
            duration: 180.0,
            tempo,
            tempo_confidence: 0.8,
            beat_count: 300,
            key: 0,
            key_name: "C".to_string(),
            mode: Mode::Major,
            spectral_centroid: Summary { mean: 2200.0, std: 400.0 },
            spectral_rolloff: Summary { mean: 5000.0, std: 800.0 },
            spectral_bandwidth: Summary { mean: 1800.0, std: 300.0 },
            rms: Summary { mean: 0.15, std: 0.05 },
            loudness: -16.5,
            zero_crossing_rate: Summary { mean: 0.06, std: 0.02 },
            mfcc_means: vec![0.0; 13],
            mfcc_stds: vec![1.0; 13],
            energy,
            danceability,
            valence: 0.6,
            acousticness,
            electronic_confidence: if acousticness < 0.2 { 0.7 } else { 0.1 },
            timing_precision_score: 80.0,
            harmonic_coherence_score: 75.0,
        }
    }

    #[test]
    fn test_rules_follow_taxonomy_order() {
        for (rule, name) in RULES.iter().zip(GENRES.iter()) {
            assert_eq!(rule.genre, *name);
        }
    }

    #[test]
    fn test_acoustic_ballad_favours_folk() {
        let scores = heuristic_scores(&genome(95.0, 0.3, 0.3, 0.8), Some("down by the river, going home"));
        assert!(scores["Folk"] > scores["Metal"]);
        assert!(scores["Folk"] > scores["Electronic"]);
        // 15 tempo + 30 + 20 + 10 + 2 keywords
        assert_eq!(scores["Folk"], 85.0);
    }

    #[test]
    fn test_club_track_favours_electronic() {
        let scores = heuristic_scores(&genome(128.0, 0.8, 0.8, 0.1), None);
        let electronic = scores["Electronic"];
        assert!(scores.values().all(|&s| s <= electronic));
        assert!(electronic > scores["Rock"]);
        assert!(electronic > scores["Folk"]);
    }

    #[test]
    fn test_scores_clamped() {
        let lyric = "money ".repeat(50);
        let scores = heuristic_scores(&genome(90.0, 0.9, 0.9, 0.1), Some(&lyric));
        assert!(scores.values().all(|&s| (0.0..=100.0).contains(&s)));
        assert_eq!(scores.len(), 13);
    }
}
