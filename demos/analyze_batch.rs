//! Example: Analyze a directory tree of audio files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <dir-or-file> ...
//!
//! Notes:
//! - Parallelism is across files. Each file analysis is single-threaded.
//! - A sibling `<name>.txt` next to an audio file is read as its lyrics.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.
//! - `--json` emits one JSON object per line (JSONL).

use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use tunescore::{analyze, AnalysisBundle, AnalysisConfig, AnalysisContext, AudioInput, TrackInfo};

const AUDIO_EXTENSIONS: [&str; 7] = ["wav", "flac", "mp3", "ogg", "m4a", "aac", "aiff"];

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_files(roots: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = roots
        .iter()
        .flat_map(|root| {
            WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file() && is_audio(entry.path()))
                .map(|entry| entry.into_path())
        })
        .collect();
    files.sort();
    files
}

#[derive(Serialize)]
struct ItemOut {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle: Option<AnalysisBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn analyze_one(ctx: &AnalysisContext, path: &Path) -> ItemOut {
    let lyrics = std::fs::read_to_string(path.with_extension("txt")).ok();
    let track = TrackInfo {
        title: path.file_stem().map(|s| s.to_string_lossy().into_owned()),
        artist: None,
    };
    let file = path.display().to_string();
    match analyze(ctx, AudioInput::Path(path.to_path_buf()), lyrics.as_deref(), track) {
        Ok(bundle) => ItemOut {
            file,
            bundle: Some(bundle),
            error: None,
        },
        Err(e) => ItemOut {
            file,
            bundle: None,
            error: Some(e.to_string()),
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut roots: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args.first().ok_or("--jobs requires a value")?.parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <dir-or-file> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => roots.push(a),
        }
    }

    if roots.is_empty() {
        eprintln!("ERROR: Provide at least one directory or audio file. Use --help for usage.");
        std::process::exit(2);
    }

    let files = collect_files(&roots);
    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", files.len(), jobs);

    // One context for every worker: handles are built once and shared read-only
    let ctx = AnalysisContext::new(AnalysisConfig::default())?;

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let outs: Vec<ItemOut> = pool.install(|| files.par_iter().map(|path| analyze_one(&ctx, path)).collect());

    for (idx, o) in outs.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(o)?);
            continue;
        }
        match (&o.bundle, &o.error) {
            (Some(bundle), _) => println!(
                "[{}/{}] {}: TuneScore={:.1} ({}) degraded={} time={:.0}ms",
                idx + 1,
                outs.len(),
                o.file,
                bundle.tunescore.overall_score,
                bundle.tunescore.grade,
                bundle.metadata.degradations.len(),
                bundle.metadata.processing_time_ms
            ),
            (None, error) => println!(
                "[{}/{}] {}: ERROR: {}",
                idx + 1,
                outs.len(),
                o.file,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    let ok_times: Vec<f32> = outs
        .iter()
        .filter_map(|o| o.bundle.as_ref())
        .map(|b| b.metadata.processing_time_ms)
        .collect();
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    eprintln!("Done: ok={}/{} wall={:.0}ms", ok_times.len(), outs.len(), wall_ms);
    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        eprintln!("processing_time_ms: mean={:.2} p50={:.2} p90={:.2}", mean, p50, p90);
    }

    Ok(())
}
