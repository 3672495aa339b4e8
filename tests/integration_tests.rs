//! Integration tests for the full analysis pipeline
//!
//! Fixtures are synthesized with hound into a temporary directory and decoded
//! back through symphonia.

use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tunescore::analysis::genre::{AudioGenreClassifier, InstrumentDetector, Method};
use tunescore::analysis::mastering::{LufsGrade, PlatformStatus};
use tunescore::{
    analyze, AnalysisBundle, AnalysisConfig, AnalysisContext, AnalysisError, AudioInput, TrackInfo, Waveform,
};

const LYRICS: &str = "\
[Verse 1]
Walking down the road tonight
City lights are shining bright
Every street I used to know

[Chorus]
Hold me close and never let go
Love me now and never let go

[Verse 2]
Memories of yesterday
Dancing in the summer rain

[Chorus]
Hold me close and never let go
Love me now and never let go
";

/// Write a mono or interleaved stereo float WAV
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    for &s in samples {
        writer.write_sample(s).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}

/// Pulsed A major triad, 120 BPM
fn pulsed_triad(seconds: f32, sample_rate: u32) -> Vec<f32> {
    let n = (seconds * sample_rate as f32) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let env = if (t * 2.0).fract() < 0.3 { 1.0 } else { 0.4 };
            let tone = (2.0 * PI * 220.0 * t).sin()
                + 0.6 * (2.0 * PI * 277.18 * t).sin()
                + 0.6 * (2.0 * PI * 329.63 * t).sin();
            0.2 * env * tone
        })
        .collect()
}

fn fixture(dir: &tempfile::TempDir, name: &str, samples: &[f32], sample_rate: u32, channels: u16) -> PathBuf {
    let path = dir.path().join(name);
    write_wav(&path, samples, sample_rate, channels);
    path
}

fn context() -> AnalysisContext {
    AnalysisContext::new(AnalysisConfig::default()).expect("default config is valid")
}

fn run(ctx: &AnalysisContext, path: &Path, lyrics: Option<&str>) -> AnalysisBundle {
    analyze(ctx, AudioInput::Path(path.to_path_buf()), lyrics, TrackInfo::default())
        .expect("Analysis should succeed")
}

fn assert_genre_sums_to_100(bundle: &AnalysisBundle) {
    let prediction = bundle.genre_prediction.as_ref().expect("genre prediction");
    let total: f32 = prediction.genres.iter().map(|g| g.confidence).sum();
    assert!((total - 100.0).abs() < 0.5, "genre confidences sum to {}", total);
    assert_eq!(prediction.primary_genre, prediction.genres[0].genre);
}

struct FixedClassifier;

impl AudioGenreClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    fn classify(&self, _waveform: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError> {
        Ok(BTreeMap::from([("country".to_string(), 0.8), ("folk".to_string(), 0.2)]))
    }
}

struct BrokenDetector;

impl InstrumentDetector for BrokenDetector {
    fn name(&self) -> &str {
        "broken"
    }

    fn detect(&self, _waveform: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError> {
        panic!("model weights corrupted");
    }
}

#[test]
fn test_silent_file_degrades_to_neutral_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "silence.wav", &vec![0.0; 44100 * 5], 44100, 1);

    let bundle = run(&context(), &path, None);

    assert!(bundle.sonic_genome.is_none());
    assert!(bundle.quality_metrics.is_none());
    assert!(bundle.mastering_report.is_none());
    assert!(bundle.chord_report.is_none());
    assert!(bundle.genre_prediction.is_none());
    for component in ["sonic", "quality", "mastering", "chords", "hooks", "genre"] {
        assert!(bundle.metadata.is_degraded(component), "{} not degraded", component);
    }

    let score = &bundle.tunescore;
    assert!(score.validate().is_ok());
    assert_eq!(score.production_quality.score, 15.0);
    assert_eq!(score.musicality.score, 12.5);
    assert_eq!(score.lyrical_quality.score, 10.0);
    assert_eq!(score.hook_potential.score, 7.5);
    assert_eq!(score.commercial_appeal.score, 5.0);
}

#[test]
fn test_tonal_track_without_lyrics() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "triad.wav", &pulsed_triad(12.0, 44100), 44100, 1);

    let bundle = run(&context(), &path, None);

    assert!(bundle.sonic_genome.is_some());
    assert!(bundle.lyrical_genome.is_none());
    assert!(!bundle.metadata.is_degraded("lyrics"));
    assert_eq!(bundle.metadata.sample_rate, 22050);
    assert_eq!(bundle.metadata.source_sample_rate, 44100);
    assert!((bundle.metadata.duration_seconds - 12.0).abs() < 0.01);

    assert_eq!(bundle.tunescore.lyrical_quality.score, 10.0);
    assert!(bundle.tunescore.validate().is_ok());
    assert!(bundle.tunescore.overall_score >= 0.0 && bundle.tunescore.overall_score <= 100.0);
}

#[test]
fn test_heuristic_genre_without_external_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "triad.wav", &pulsed_triad(10.0, 44100), 44100, 1);

    let bundle = run(&context(), &path, Some(LYRICS));

    let prediction = bundle.genre_prediction.as_ref().expect("genre prediction");
    assert_eq!(prediction.method, Method::Heuristic);
    assert!(prediction.components.providers.is_empty());
    assert_genre_sums_to_100(&bundle);
}

#[test]
fn test_failing_source_is_excluded_from_fusion() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "triad.wav", &pulsed_triad(10.0, 44100), 44100, 1);

    let ctx = context()
        .with_classifier(Arc::new(FixedClassifier))
        .with_instrument_detector(Arc::new(BrokenDetector));
    let bundle = run(&ctx, &path, None);

    let prediction = bundle.genre_prediction.as_ref().expect("genre prediction");
    assert_eq!(prediction.method, Method::Hybrid);
    assert_eq!(prediction.components.providers, vec!["fixed".to_string()]);
    assert_eq!(prediction.components.excluded.len(), 1);
    assert!(prediction.components.instrument_boosts.is_none());
    assert_genre_sums_to_100(&bundle);
}

#[test]
fn test_lyrics_feed_the_score() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "triad.wav", &pulsed_triad(10.0, 44100), 44100, 1);

    let bundle = run(&context(), &path, Some(LYRICS));

    let lyrics = bundle.lyrical_genome.as_ref().expect("lyrical genome");
    assert_eq!(lyrics.structure.pattern, "VCVC");
    let expected = (lyrics.songwriting_quality.overall * 0.2 * 100.0).round() / 100.0;
    assert!((bundle.tunescore.lyrical_quality.score - expected).abs() < 0.011);
}

#[test]
fn test_pipeline_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "triad.wav", &pulsed_triad(10.0, 44100), 44100, 1);
    let ctx = context();

    let first = run(&ctx, &path, Some(LYRICS));
    let second = run(&ctx, &path, Some(LYRICS));

    let json = |b: &AnalysisBundle| {
        (
            serde_json::to_string(&b.sonic_genome).unwrap(),
            serde_json::to_string(&b.quality_metrics).unwrap(),
            serde_json::to_string(&b.mastering_report).unwrap(),
            serde_json::to_string(&b.chord_report).unwrap(),
        )
    };
    assert_eq!(json(&first), json(&second));
    assert_eq!(first.tunescore, second.tunescore);
}

#[test]
fn test_mastering_at_streaming_loudness() {
    let dir = tempfile::tempdir().unwrap();
    let amplitude = 10f32.powf(-11.0 / 20.0);
    let samples: Vec<f32> = (0..48000 * 10)
        .map(|i| amplitude * (2.0 * PI * 997.0 * i as f32 / 48000.0).sin())
        .collect();
    let path = fixture(&dir, "sine.wav", &samples, 48000, 1);

    let bundle = run(&context(), &path, None);

    let report = bundle.mastering_report.as_ref().expect("mastering report");
    assert!((report.lufs + 14.0).abs() < 0.5, "lufs {}", report.lufs);
    assert_eq!(report.lufs_grade, LufsGrade::Optimal);
    assert_eq!(report.platform_targets["spotify"].status, PlatformStatus::Optimal);
    assert_eq!(bundle.metadata.source_sample_rate, 48000);
}

#[test]
fn test_short_clip_is_not_treated_as_silence() {
    let dir = tempfile::tempdir().unwrap();
    // 400 samples at 44.1 kHz: about 9 ms
    let samples: Vec<f32> = (0..400)
        .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
        .collect();
    let path = fixture(&dir, "blip.wav", &samples, 44100, 1);

    let bundle = run(&context(), &path, None);

    assert!(bundle.sonic_genome.is_some(), "degraded: {:?}", bundle.metadata.degradations);
    assert!(!bundle.metadata.is_degraded("sonic"));
    assert!(bundle.tunescore.validate().is_ok());
}

#[test]
fn test_stereo_input_is_mixed_down() {
    let dir = tempfile::tempdir().unwrap();
    let mono = pulsed_triad(6.0, 44100);
    let stereo: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();
    let path = fixture(&dir, "stereo.wav", &stereo, 44100, 2);

    let bundle = run(&context(), &path, None);

    assert_eq!(bundle.metadata.channels, 2);
    assert!((bundle.metadata.duration_seconds - 6.0).abs() < 0.01);
}

#[test]
fn test_encoded_bytes_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "triad.wav", &pulsed_triad(6.0, 44100), 44100, 1);
    let bytes = std::fs::read(&path).unwrap();

    let bundle = analyze(
        &context(),
        AudioInput::Encoded {
            bytes,
            extension: Some("wav".to_string()),
        },
        None,
        TrackInfo {
            title: Some("Triad".to_string()),
            artist: None,
        },
    )
    .unwrap();

    assert_eq!(bundle.metadata.title.as_deref(), Some("Triad"));
    assert!(bundle.sonic_genome.is_some());
}

#[test]
fn test_corrupt_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.wav");
    std::fs::write(&path, b"definitely not audio").unwrap();

    let result = analyze(&context(), AudioInput::Path(path), None, TrackInfo::default());
    assert!(matches!(result, Err(AnalysisError::Decode(_))));
}

#[test]
fn test_missing_file_is_fatal() {
    let result = analyze(
        &context(),
        AudioInput::Path(PathBuf::from("/nonexistent/track.wav")),
        None,
        TrackInfo::default(),
    );
    assert!(matches!(result, Err(AnalysisError::Decode(_))));
}

#[test]
fn test_bundle_serializes_with_fixed_strings() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(&dir, "triad.wav", &pulsed_triad(8.0, 44100), 44100, 1);

    let bundle = run(&context(), &path, None);
    let json = serde_json::to_value(&bundle).unwrap();

    assert_eq!(json["genre_prediction"]["method"], "heuristic");
    assert!(json["tunescore"]["grade"].is_string());
    assert!(json.get("lyrical_genome").map_or(true, |v| v.is_null()));
}
