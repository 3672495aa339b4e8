//! # TuneScore
//!
//! An audio and lyrics analysis engine that turns one track into a set of
//! typed reports and a single 0-100 composite score.
//!
//! ## Features
//!
//! - **Sonic Genome**: tempo, key, spectral statistics, energy, danceability,
//!   valence and acousticness with context-aware corrections
//! - **Quality**: pitch accuracy, timing precision and harmonic coherence
//! - **Mastering**: BS.1770 integrated loudness, dynamic range and streaming
//!   platform targets
//! - **Harmony**: chord sequence, progression naming and modulations
//! - **Hooks**: ranked short-form clip candidates
//! - **Genre**: heuristic rules fused with optional external classifiers
//! - **Lyrics**: structure, sentiment, themes and songwriting quality
//! - **TuneScore**: five weighted components, letter grade and insights
//!
//! ## Quick Start
//!
//! ```no_run
//! use tunescore::{analyze, AnalysisConfig, AnalysisContext, AudioInput, TrackInfo};
//!
//! let ctx = AnalysisContext::new(AnalysisConfig::default())?;
//! let bundle = analyze(
//!     &ctx,
//!     AudioInput::Path("song.wav".into()),
//!     Some("[Chorus]\nsing it loud"),
//!     TrackInfo::default(),
//! )?;
//!
//! println!("TuneScore: {:.1} ({})", bundle.tunescore.overall_score, bundle.tunescore.grade);
//! # Ok::<(), tunescore::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio Input -> Decode -> Mastering (source rate)
//!             -> Resample -> TrackFeatures -> Sonic / Quality / Chords / Hooks
//!                                          -> Genre (needs Sonic)
//! Lyrics      -> Lyrical Genome
//! All of the above -> TuneScore
//! ```
//!
//! Only decoding failures and invalid configuration abort a run. Every other
//! component failure is recorded in `metadata.degradations` and the component
//! falls back to its neutral default.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod context;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use std::time::Instant;

// Re-export main types
pub use analysis::metadata::AnalysisMetadata;
pub use analysis::result::{AnalysisBundle, Degradation, Key, Mode};
pub use analysis::tunescore::TuneScore;
pub use config::AnalysisConfig;
pub use context::AnalysisContext;
pub use error::AnalysisError;
pub use features::TrackFeatures;
pub use io::{AudioInput, Waveform};

use analysis::genre::classify_genre;
use analysis::tunescore::{compute_tunescore, TuneScoreInputs};
use analysis::{chords, hooks, lyrics, mastering, quality, sonic};

/// Caller-supplied track details
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    /// Track title
    pub title: Option<String>,
    /// Artist name
    pub artist: Option<String>,
}

/// Analyze one track
///
/// Decodes the audio, runs every component and aggregates the TuneScore.
///
/// # Arguments
///
/// * `ctx` - Shared configuration and handles
/// * `input` - Audio file, encoded buffer or decoded waveform
/// * `lyrics` - Lyrics text, if available
/// * `track` - Title and artist recorded in the metadata
///
/// # Returns
///
/// `AnalysisBundle` with every component record that could be computed
///
/// # Errors
///
/// Returns `AnalysisError::Decode` if the audio cannot be decoded or
/// resampled. Component failures never surface here.
pub fn analyze(
    ctx: &AnalysisContext,
    input: AudioInput,
    lyrics: Option<&str>,
    track: TrackInfo,
) -> Result<AnalysisBundle, AnalysisError> {
    let start_time = Instant::now();
    let config = ctx.config();

    let waveform = match input {
        AudioInput::Path(path) => io::decoder::decode_file(&path, config.channel_mix)?,
        AudioInput::Encoded { bytes, extension } => {
            io::decoder::decode_bytes(&bytes, extension.as_deref(), config.channel_mix)?
        }
        AudioInput::Pcm(waveform) => waveform,
    };

    run_pipeline(ctx, &waveform, lyrics, track, start_time)
}

/// Analyze an already-decoded waveform
///
/// # Errors
///
/// Same as [`analyze`].
pub fn analyze_waveform(
    ctx: &AnalysisContext,
    waveform: &Waveform,
    lyrics: Option<&str>,
    track: TrackInfo,
) -> Result<AnalysisBundle, AnalysisError> {
    run_pipeline(ctx, waveform, lyrics, track, Instant::now())
}

fn run_pipeline(
    ctx: &AnalysisContext,
    waveform: &Waveform,
    lyrics_text: Option<&str>,
    track: TrackInfo,
    start_time: Instant,
) -> Result<AnalysisBundle, AnalysisError> {
    let config = ctx.config();

    if waveform.is_empty() {
        return Err(AnalysisError::Decode("No audio samples".to_string()));
    }

    log::info!(
        "Analyzing {:.1} s of audio at {} Hz{}",
        waveform.duration_seconds(),
        waveform.sample_rate(),
        track
            .title
            .as_deref()
            .map(|t| format!(" ({})", t))
            .unwrap_or_default()
    );

    let mut degradations = Vec::new();

    // Loudness is measured before resampling so the K-weighting sees the full band
    let mastering_report = keep(
        "mastering",
        mastering::analyze_mastering(waveform, ctx.loudness_meter(), &config.mastering),
        &mut degradations,
    );

    let analysis_waveform = io::resample::resample(waveform, config.target_sample_rate)?;
    let features = TrackFeatures::compute(&analysis_waveform, config);
    if let Err(e) = &features {
        if e.is_fatal() {
            return Err(e.clone());
        }
    }
    let with_features = |stage: &str| {
        features.as_ref().map_err(|e| AnalysisError::extraction(stage, e.to_string()))
    };

    let sonic_genome = keep(
        "sonic",
        with_features("sonic").and_then(|f| sonic::extract_sonic_genome(f, ctx.key_templates())),
        &mut degradations,
    );
    let quality_metrics = keep(
        "quality",
        with_features("quality").and_then(quality::analyze_quality),
        &mut degradations,
    );
    let chord_report = keep(
        "chords",
        with_features("chords").and_then(|f| chords::analyze_chords(f, &config.chords, ctx.key_templates())),
        &mut degradations,
    );
    let hook_candidates = keep(
        "hooks",
        with_features("hooks").and_then(|f| hooks::score_hooks(f, config)),
        &mut degradations,
    )
    .unwrap_or_default();
    let primary_hook = keep(
        "primary_hook",
        with_features("primary_hook").and_then(|f| hooks::primary_hook(f, config)),
        &mut degradations,
    );

    let genre_prediction = keep(
        "genre",
        match &sonic_genome {
            Some(genome) => classify_genre(
                genome,
                lyrics_text,
                &analysis_waveform,
                ctx.genre_sources(),
                &config.genre,
            ),
            None => Err(AnalysisError::extraction("genre", "sonic genome unavailable")),
        },
        &mut degradations,
    );

    let lyrical_genome = lyrics_text.and_then(|text| {
        keep(
            "lyrics",
            lyrics::analyze_lyrics(text, ctx.annotator()),
            &mut degradations,
        )
    });

    let tunescore = compute_tunescore(TuneScoreInputs {
        genome: sonic_genome.as_ref(),
        lyrics: lyrical_genome.as_ref(),
        hooks: &hook_candidates,
    });

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::info!(
        "Analysis complete in {:.0} ms: TuneScore {:.2} ({}), {} degraded component(s)",
        processing_time_ms,
        tunescore.overall_score,
        tunescore.grade,
        degradations.len()
    );

    Ok(AnalysisBundle {
        sonic_genome,
        quality_metrics,
        mastering_report,
        hook_candidates,
        primary_hook,
        chord_report,
        genre_prediction,
        lyrical_genome,
        tunescore,
        metadata: AnalysisMetadata {
            duration_seconds: waveform.duration_seconds(),
            sample_rate: analysis_waveform.sample_rate(),
            source_sample_rate: waveform.sample_rate(),
            channels: waveform.source_channels(),
            processing_time_ms,
            title: track.title,
            artist: track.artist,
            degradations,
            ..Default::default()
        },
    })
}

/// Keep a component result, recording a degradation on failure
fn keep<T>(component: &str, result: Result<T, AnalysisError>, degradations: &mut Vec<Degradation>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Component '{}' degraded: {}", component, e);
            degradations.push(Degradation::new(component, &e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AnalysisContext {
        AnalysisContext::new(AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_waveform_is_decode_error() {
        let waveform = Waveform::new(vec![], 22050).unwrap();
        let result = analyze_waveform(&ctx(), &waveform, None, TrackInfo::default());
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_silence_degrades_without_failing() {
        let waveform = Waveform::new(vec![0.0; 22050 * 5], 22050).unwrap();
        let bundle = analyze_waveform(&ctx(), &waveform, None, TrackInfo::default()).unwrap();

        assert!(bundle.sonic_genome.is_none());
        assert!(bundle.metadata.is_degraded("sonic"));
        assert!(bundle.metadata.is_degraded("genre"));
        assert!(bundle.metadata.is_degraded("mastering"));
        assert!(bundle.hook_candidates.is_empty());
        assert!(bundle.lyrical_genome.is_none());
        assert!(bundle.tunescore.validate().is_ok());
        assert_eq!(bundle.tunescore.lyrical_quality.score, 10.0);
    }

    #[test]
    fn test_track_info_recorded() {
        let waveform = Waveform::new(vec![0.0; 22050], 22050).unwrap();
        let track = TrackInfo {
            title: Some("Night Drive".to_string()),
            artist: Some("The Examples".to_string()),
        };
        let bundle = analyze_waveform(&ctx(), &waveform, None, track).unwrap();
        assert_eq!(bundle.metadata.title.as_deref(), Some("Night Drive"));
        assert_eq!(bundle.metadata.source_sample_rate, 22050);
    }

    #[test]
    fn test_blank_lyrics_degrade() {
        let waveform = Waveform::new(vec![0.0; 22050], 22050).unwrap();
        let bundle = analyze_waveform(&ctx(), &waveform, Some("   \n"), TrackInfo::default()).unwrap();
        assert!(bundle.metadata.is_degraded("lyrics"));
        assert_eq!(bundle.tunescore.lyrical_quality.score, 10.0);
    }
}
