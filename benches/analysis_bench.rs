//! Performance benchmarks for the analysis pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tunescore::analysis::lyrics::analyze_lyrics;
use tunescore::analysis::tunescore::{compute_tunescore, TuneScoreInputs};
use tunescore::{analyze_waveform, AnalysisConfig, AnalysisContext, TrackFeatures, TrackInfo, Waveform};

const SAMPLE_RATE: u32 = 22050;

/// 30 s of a pulsed A major triad at 120 BPM
fn synthetic_track() -> Waveform {
    let samples: Vec<f32> = (0..SAMPLE_RATE as usize * 30)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = if (t * 2.0).fract() < 0.3 { 1.0 } else { 0.4 };
            let tone = (2.0 * std::f32::consts::PI * 220.0 * t).sin()
                + 0.6 * (2.0 * std::f32::consts::PI * 277.18 * t).sin()
                + 0.6 * (2.0 * std::f32::consts::PI * 329.63 * t).sin();
            0.2 * env * tone
        })
        .collect();
    Waveform::new(samples, SAMPLE_RATE).expect("valid sample rate")
}

const LYRICS: &str = "[Verse]\nWalking down the road tonight\nCity lights are shining bright\n\n\
                      [Chorus]\nHold me close and never let go\n\n\
                      [Verse]\nMemories of yesterday\nDancing in the summer rain\n\n\
                      [Chorus]\nHold me close and never let go";

fn bench_pipeline(c: &mut Criterion) {
    let waveform = synthetic_track();
    let ctx = AnalysisContext::new(AnalysisConfig::default()).expect("valid config");

    c.bench_function("analyze_30s", |b| {
        b.iter(|| {
            let _ = analyze_waveform(&ctx, black_box(&waveform), Some(LYRICS), TrackInfo::default());
        });
    });

    c.bench_function("track_features_30s", |b| {
        b.iter(|| {
            let _ = TrackFeatures::compute(black_box(&waveform), ctx.config());
        });
    });
}

fn bench_lyrics_and_score(c: &mut Criterion) {
    c.bench_function("analyze_lyrics", |b| {
        b.iter(|| {
            let _ = analyze_lyrics(black_box(LYRICS), None);
        });
    });

    c.bench_function("compute_tunescore_neutral", |b| {
        b.iter(|| compute_tunescore(black_box(TuneScoreInputs::default())));
    });
}

criterion_group!(benches, bench_pipeline, bench_lyrics_and_score);
criterion_main!(benches);
