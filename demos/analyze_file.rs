//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- <audio> [--lyrics FILE] [--title T] [--artist A] [--config FILE] [--json]
//!
//! Prints a summary, or the whole bundle as pretty JSON with `--json`.

use std::env;
use std::path::PathBuf;

use tunescore::{analyze, AnalysisConfig, AnalysisContext, AudioInput, TrackInfo};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut audio: Option<PathBuf> = None;
    let mut lyrics_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut track = TrackInfo::default();
    let mut json = false;

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--lyrics" | "--title" | "--artist" | "--config" => {
                if args.is_empty() {
                    return Err(format!("{} requires a value", a).into());
                }
                let value = args.remove(0);
                match a.as_str() {
                    "--lyrics" => lyrics_path = Some(value.into()),
                    "--title" => track.title = Some(value),
                    "--artist" => track.artist = Some(value),
                    _ => config_path = Some(value.into()),
                }
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_file <audio> [--lyrics FILE] [--title T] [--artist A] [--config FILE] [--json]"
                );
                return Ok(());
            }
            _ => audio = Some(a.into()),
        }
    }

    let Some(audio) = audio else {
        eprintln!("ERROR: Provide an audio file path. Use --help for usage.");
        std::process::exit(2);
    };

    let config: AnalysisConfig = match config_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    let lyrics = lyrics_path.map(std::fs::read_to_string).transpose()?;

    let ctx = AnalysisContext::new(config)?;
    let bundle = analyze(&ctx, AudioInput::Path(audio.clone()), lyrics.as_deref(), track)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    println!("Analysis Results: {}", audio.display());
    if let Some(genome) = &bundle.sonic_genome {
        println!(
            "  Tempo: {:.1} BPM (confidence: {:.2}), Key: {} {}",
            genome.tempo,
            genome.tempo_confidence,
            genome.key_name,
            genome.mode.as_str()
        );
        println!(
            "  Energy {:.2}  Danceability {:.2}  Valence {:.2}  Acousticness {:.2}",
            genome.energy, genome.danceability, genome.valence, genome.acousticness
        );
    }
    if let Some(quality) = &bundle.quality_metrics {
        println!("  Quality: {:.1} ({:?})", quality.overall_quality, quality.quality_grade);
    }
    if let Some(mastering) = &bundle.mastering_report {
        println!(
            "  Loudness: {:.1} LUFS ({:?}), DR {:.1} dB ({:?})",
            mastering.lufs, mastering.lufs_grade, mastering.dynamic_range, mastering.dr_grade
        );
    }
    if let Some(chords) = &bundle.chord_report {
        println!(
            "  Progression: {} ({})",
            chords.progression.join("-"),
            chords.progression_name
        );
    }
    if let Some(genre) = &bundle.genre_prediction {
        println!("  Genre: {} ({:?})", genre.primary_genre, genre.method);
    }
    if let Some(hook) = bundle.hook_candidates.first() {
        println!(
            "  Best hook: {:.1}-{:.1} s (score {:.1})",
            hook.start_time, hook.end_time, hook.score
        );
    }

    let score = &bundle.tunescore;
    println!("  TuneScore: {:.1} ({})", score.overall_score, score.grade);
    for (name, component) in score.components() {
        println!("    {:<20} {:>5.1} / {:.0}", name, component.score, component.max);
    }
    for insight in &score.insights {
        println!("    - {}", insight);
    }
    for d in &bundle.metadata.degradations {
        println!("  Degraded: {}: {}", d.component, d.error);
    }
    println!("  Processing time: {:.2} ms", bundle.metadata.processing_time_ms);

    Ok(())
}
