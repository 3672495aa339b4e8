//! Genre ensemble classifier
//!
//! Three independent sources are fused:
//! - Rule-based heuristics over the sonic genome and lyric keywords
//! - An optional external audio classifier ([`AudioGenreClassifier`])
//! - An optional instrument-presence detector ([`InstrumentDetector`])
//!
//! External sources are optional. A missing, failing or panicking source is
//! excluded from the fusion and the prediction falls back to
//! `method = "heuristic"`; classification itself never fails.

pub mod fusion;
pub mod heuristics;

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use super::sonic::SonicGenome;
use crate::config::GenreConfig;
use crate::error::{ensure_range, AnalysisError};
use crate::io::Waveform;

pub use fusion::{fuse, rank_top, HEURISTIC_WEIGHT, MODEL_WEIGHT};
pub use heuristics::{heuristic_scores, GENRES};

/// Pretrained audio genre classifier
///
/// Returns a label -> probability map over the model's own label set.
pub trait AudioGenreClassifier: Send + Sync {
    /// Provider name recorded in the prediction
    fn name(&self) -> &str;

    /// Classify a mono waveform
    fn classify(&self, waveform: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError>;
}

/// Instrument presence detector
///
/// Returns per-instrument presence scores (0-1).
pub trait InstrumentDetector: Send + Sync {
    /// Provider name recorded in the prediction
    fn name(&self) -> &str;

    /// Detect instruments in a mono waveform
    fn detect(&self, waveform: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError>;
}

/// Which sources contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Heuristic rules only
    Heuristic,
    /// Heuristics fused with at least one external source
    Hybrid,
}

/// One ranked genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreScore {
    /// Canonical genre name
    pub genre: String,
    /// Share of the returned set (0-100)
    pub confidence: f32,
}

/// Per-source scores before fusion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreComponents {
    /// Raw heuristic scores (0-100 per genre)
    pub heuristic: BTreeMap<String, f32>,
    /// Remapped external-model scores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<BTreeMap<String, f32>>,
    /// Instrument-driven boosts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_boosts: Option<BTreeMap<String, f32>>,
    /// Providers that contributed
    pub providers: Vec<String>,
    /// Sources excluded from the fusion and why
    pub excluded: Vec<String>,
}

/// Genre prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenrePrediction {
    /// Ranked genres, confidences sum to 100
    pub genres: Vec<GenreScore>,
    /// Highest-ranked genre
    pub primary_genre: String,
    /// Contributing sources
    pub method: Method,
    /// Source breakdown
    pub components: GenreComponents,
}

/// Optional external genre sources
#[derive(Clone, Copy, Default)]
pub struct GenreSources<'a> {
    /// External audio classifier
    pub classifier: Option<&'a dyn AudioGenreClassifier>,
    /// Instrument detector
    pub instruments: Option<&'a dyn InstrumentDetector>,
}

/// Classify the genre of a track
///
/// # Arguments
///
/// * `genome` - Sonic genome of the track
/// * `lyrics` - Lyrics text for keyword rules, if any
/// * `waveform` - Waveform passed to external sources
/// * `sources` - Optional external sources
/// * `config` - Genre settings
///
/// # Errors
///
/// Only `AnalysisError::NumericalError` if a fused confidence is not finite;
/// source failures are recorded in `components.excluded` instead.
pub fn classify_genre(
    genome: &SonicGenome,
    lyrics: Option<&str>,
    waveform: &Waveform,
    sources: GenreSources<'_>,
    config: &GenreConfig,
) -> Result<GenrePrediction, AnalysisError> {
    let heuristic = heuristic_scores(genome, lyrics);
    let mut components = GenreComponents {
        heuristic: heuristic.clone(),
        ..Default::default()
    };

    if let Some(classifier) = sources.classifier {
        match guarded(classifier.name(), || classifier.classify(waveform)) {
            Ok(raw) => {
                let remapped = fusion::remap_labels(&raw);
                if remapped.is_empty() {
                    components
                        .excluded
                        .push(format!("{}: no labels in the genre taxonomy", classifier.name()));
                } else {
                    components.providers.push(classifier.name().to_string());
                    components.model = Some(remapped);
                }
            }
            Err(e) => {
                log::warn!("Genre classifier excluded: {}", e);
                components.excluded.push(e.to_string());
            }
        }
    }

    if let Some(detector) = sources.instruments {
        match guarded(detector.name(), || detector.detect(waveform)) {
            Ok(presence) => {
                components.providers.push(detector.name().to_string());
                components.instrument_boosts =
                    Some(fusion::instrument_boosts(&presence, config.presence_threshold));
            }
            Err(e) => {
                log::warn!("Instrument detector excluded: {}", e);
                components.excluded.push(e.to_string());
            }
        }
    }

    let method = if components.providers.is_empty() {
        Method::Heuristic
    } else {
        Method::Hybrid
    };

    let fused = fuse(
        &heuristic,
        components.model.as_ref(),
        components.instrument_boosts.as_ref(),
    );
    let genres: Vec<GenreScore> = rank_top(&fused, config.top_n)
        .into_iter()
        .map(|(genre, confidence)| GenreScore { genre, confidence })
        .collect();
    for g in &genres {
        ensure_range("genre.confidence", g.confidence, 0.0, 100.0 + 1e-3)?;
    }

    let primary_genre = genres
        .first()
        .map(|g| g.genre.clone())
        .unwrap_or_else(|| GENRES[0].to_string());

    log::debug!(
        "Genre: {} ({:?}), providers {:?}",
        primary_genre,
        method,
        components.providers
    );

    Ok(GenrePrediction {
        genres,
        primary_genre,
        method,
        components,
    })
}

/// Run an external source, turning errors and panics into `DependencyUnavailable`
fn guarded<T>(
    provider: &str,
    call: impl FnOnce() -> Result<T, AnalysisError>,
) -> Result<T, AnalysisError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(AnalysisError::DependencyUnavailable { dependency, message })) => {
            Err(AnalysisError::DependencyUnavailable { dependency, message })
        }
        Ok(Err(e)) => Err(AnalysisError::unavailable(provider, e.to_string())),
        Err(_) => Err(AnalysisError::unavailable(provider, "provider panicked")),
    }
}

#[cfg(test)]
mod tests {
    use super::heuristics::tests::genome;
    use super::*;

    struct FixedClassifier(Vec<(&'static str, f32)>);

    impl AudioGenreClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }
        fn classify(&self, _: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError> {
            Ok(self.0.iter().map(|(k, v)| (k.to_string(), *v)).collect())
        }
    }

    struct Offline;

    impl AudioGenreClassifier for Offline {
        fn name(&self) -> &str {
            "offline"
        }
        fn classify(&self, _: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError> {
            Err(AnalysisError::unavailable("offline", "model file missing"))
        }
    }

    struct Panicky;

    impl InstrumentDetector for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }
        fn detect(&self, _: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError> {
            panic!("detector crashed")
        }
    }

    struct Fiddle;

    impl InstrumentDetector for Fiddle {
        fn name(&self) -> &str {
            "fiddle"
        }
        fn detect(&self, _: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError> {
            Ok([("violin".to_string(), 0.9)].into_iter().collect())
        }
    }

    fn waveform() -> Waveform {
        Waveform::new(vec![0.1; 1000], 22050).unwrap()
    }

    fn total(p: &GenrePrediction) -> f32 {
        p.genres.iter().map(|g| g.confidence).sum()
    }

    #[test]
    fn test_heuristic_only() {
        let p = classify_genre(
            &genome(120.0, 0.7, 0.7, 0.3),
            None,
            &waveform(),
            GenreSources::default(),
            &GenreConfig::default(),
        )
        .unwrap();
        assert_eq!(p.method, Method::Heuristic);
        assert_eq!(p.genres.len(), 5);
        assert!((total(&p) - 100.0).abs() < 0.01);
        assert_eq!(p.primary_genre, p.genres[0].genre);
    }

    #[test]
    fn test_failing_sources_degrade_to_heuristic() {
        let sources = GenreSources {
            classifier: Some(&Offline),
            instruments: Some(&Panicky),
        };
        let p = classify_genre(
            &genome(120.0, 0.7, 0.7, 0.3),
            None,
            &waveform(),
            sources,
            &GenreConfig::default(),
        )
        .unwrap();
        assert_eq!(p.method, Method::Heuristic);
        assert_eq!(p.components.excluded.len(), 2);
        assert!((total(&p) - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_hybrid_with_model_and_instruments() {
        let classifier = FixedClassifier(vec![("country", 0.7), ("folk", 0.3)]);
        let sources = GenreSources {
            classifier: Some(&classifier),
            instruments: Some(&Fiddle),
        };
        let p = classify_genre(
            &genome(100.0, 0.4, 0.4, 0.7),
            Some("old truck on a country road"),
            &waveform(),
            sources,
            &GenreConfig::default(),
        )
        .unwrap();
        assert_eq!(p.method, Method::Hybrid);
        assert_eq!(p.primary_genre, "Country");
        assert_eq!(p.components.providers, vec!["fixed", "fiddle"]);
        assert!((total(&p) - 100.0).abs() < 0.01);
        assert_eq!(serde_json::to_value(p.method).unwrap(), "hybrid");
    }
}
