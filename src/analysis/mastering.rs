//! Mastering analysis
//!
//! Measures integrated loudness (BS.1770), sample peak, RMS and dynamic range
//! and compares the loudness against streaming-platform normalization targets.
//!
//! The measurement runs on the decoded waveform at its source sample rate so
//! peaks are not smeared by resampling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MasteringConfig;
use crate::error::{ensure_range, AnalysisError};
use crate::features::bands::{at_least, below};
use crate::features::stats::median;
use crate::io::Waveform;
use crate::preprocessing::loudness::LoudnessMeter;

/// Streaming platform loudness targets: `(key, display name, LUFS)`
pub const PLATFORM_TARGETS: [(&str, &str, f32); 5] = [
    ("spotify", "Spotify", -14.0),
    ("apple_music", "Apple Music", -16.0),
    ("youtube", "YouTube", -13.0),
    ("tidal", "Tidal", -14.0),
    ("soundcloud", "SoundCloud", -10.0),
];

/// Weight of the loudness score in the overall mastering quality
pub const LOUDNESS_WEIGHT: f32 = 0.4;
/// Weight of the peak score in the overall mastering quality
pub const PEAK_WEIGHT: f32 = 0.3;
/// Weight of the dynamic-range score in the overall mastering quality
pub const DYNAMIC_RANGE_WEIGHT: f32 = 0.3;

/// Loudness window that scores 100 (LUFS, inclusive)
pub const IDEAL_LUFS_RANGE: (f32, f32) = (-14.0, -10.0);
/// Negated distance (LU) from the ideal window -> loudness score
const LOUDNESS_DISTANCE_BANDS: [(f32, f32); 4] = [(0.0, 100.0), (-2.0, 80.0), (-4.0, 60.0), (-6.0, 40.0)];

/// Peaks above this level risk inter-sample clipping (dBFS)
pub const CLIPPING_RISK_DB: f32 = -0.1;
/// Peak level (dBFS) -> peak score, for peaks at or below [`CLIPPING_RISK_DB`]
const PEAK_BANDS: [(f32, f32); 4] = [(-0.5, 100.0), (-1.0, 90.0), (-3.0, 75.0), (-6.0, 55.0)];

/// Integrated loudness grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LufsGrade {
    /// Above -9 LUFS
    #[serde(rename = "Too Loud")]
    TooLoud,
    /// Above -10 LUFS
    Loud,
    /// -16 to -10 LUFS
    Optimal,
    /// -20 to -16 LUFS
    Quiet,
    /// Below -20 LUFS
    #[serde(rename = "Too Quiet")]
    TooQuiet,
}

/// Dynamic range grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrGrade {
    /// Below DR6
    #[serde(rename = "Over-compressed")]
    OverCompressed,
    /// DR6 to DR8
    Compressed,
    /// DR8 to DR14
    Optimal,
    /// DR14 to DR18
    Dynamic,
    /// Above DR18
    #[serde(rename = "Under-compressed")]
    UnderCompressed,
}

/// Loudness relative to a platform target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformStatus {
    /// Within the tolerance of the target
    Optimal,
    /// Louder than the target; the platform will turn it down
    TooLoud,
    /// Quieter than the target
    TooQuiet,
}

/// One platform comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformTarget {
    /// Target integrated loudness (LUFS)
    pub target: f32,
    /// Measured minus target (LU)
    pub delta: f32,
    /// Status against the target
    pub status: PlatformStatus,
}

/// Mastering measurements and grades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteringReport {
    /// Integrated loudness (LUFS)
    pub lufs: f32,
    /// Loudness grade
    pub lufs_grade: LufsGrade,
    /// Sample peak (dBFS)
    pub peak_db: f32,
    /// RMS level (dBFS)
    pub rms_db: f32,
    /// Median per-segment peak-to-RMS ratio (dB)
    pub dynamic_range: f32,
    /// Dynamic range grade
    pub dr_grade: DrGrade,
    /// Comparison against every platform target, keyed by platform
    pub platform_targets: BTreeMap<String, PlatformTarget>,
    /// Loudness sub-score (0-100)
    pub loudness_score: f32,
    /// Peak sub-score (0-100)
    pub peak_score: f32,
    /// Dynamic range sub-score (0-100)
    pub dynamic_range_score: f32,
    /// Weighted mastering quality (0-100)
    pub overall_quality: f32,
    /// Fixes, ordered loudness, peak, dynamic range, platforms
    pub recommendations: Vec<String>,
}

/// Analyze mastering of a decoded waveform
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` when the signal is below the
/// loudness gate (silence) and propagates meter errors.
pub fn analyze_mastering(
    waveform: &Waveform,
    meter: &LoudnessMeter,
    config: &MasteringConfig,
) -> Result<MasteringReport, AnalysisError> {
    let samples = waveform.samples();
    let lufs = meter
        .integrated_loudness(samples, waveform.sample_rate())
        .map_err(|e| AnalysisError::extraction("mastering", e.to_string()))?;
    if !lufs.is_finite() {
        return Err(AnalysisError::extraction(
            "mastering",
            "signal is below the loudness gate",
        ));
    }

    let peak_db = meter.peak_db(samples);
    let rms_db = meter.rms_db(samples);
    let dynamic_range = dynamic_range(waveform, meter, config.segment_seconds)?;

    let platform_targets: BTreeMap<String, PlatformTarget> = PLATFORM_TARGETS
        .iter()
        .map(|&(key, _, target)| {
            (
                key.to_string(),
                platform_target(lufs, target, config.platform_tolerance_lu),
            )
        })
        .collect();

    let loudness_score = loudness_score(lufs);
    let peak_score = peak_score(peak_db);
    let dynamic_range_score = dynamic_range_score(dynamic_range);
    let overall_quality = (LOUDNESS_WEIGHT * loudness_score
        + PEAK_WEIGHT * peak_score
        + DYNAMIC_RANGE_WEIGHT * dynamic_range_score)
        .min(100.0);

    let report = MasteringReport {
        lufs,
        lufs_grade: lufs_grade(lufs),
        peak_db,
        rms_db,
        dynamic_range,
        dr_grade: dr_grade(dynamic_range),
        recommendations: recommendations(lufs, peak_db, dynamic_range, &platform_targets),
        platform_targets,
        loudness_score,
        peak_score,
        dynamic_range_score,
        overall_quality,
    };

    log::debug!(
        "Mastering: {:.1} LUFS ({:?}), peak {:.2} dBFS, DR {:.1} ({:?}), quality {:.0}",
        report.lufs,
        report.lufs_grade,
        report.peak_db,
        report.dynamic_range,
        report.dr_grade,
        report.overall_quality
    );

    ensure_range("mastering.overall_quality", report.overall_quality, 0.0, 100.0)?;
    Ok(report)
}

/// Median peak-to-RMS ratio over fixed-length segments
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` when no segment carries signal.
pub fn dynamic_range(
    waveform: &Waveform,
    meter: &LoudnessMeter,
    segment_seconds: f32,
) -> Result<f32, AnalysisError> {
    let segment_len = ((segment_seconds * waveform.sample_rate() as f32) as usize).max(1);

    let ratios: Vec<f32> = waveform
        .samples()
        .chunks(segment_len)
        .filter_map(|segment| {
            let rms = meter.rms_db(segment);
            let peak = meter.peak_db(segment);
            (rms.is_finite() && peak.is_finite()).then(|| peak - rms)
        })
        .collect();

    if ratios.is_empty() {
        return Err(AnalysisError::extraction(
            "mastering",
            "no audible segment for dynamic range",
        ));
    }

    Ok(median(&ratios))
}

/// Compare a measurement with one platform target
pub fn platform_target(lufs: f32, target: f32, tolerance: f32) -> PlatformTarget {
    let delta = lufs - target;
    let status = if delta.abs() <= tolerance {
        PlatformStatus::Optimal
    } else if delta > 0.0 {
        PlatformStatus::TooLoud
    } else {
        PlatformStatus::TooQuiet
    };
    PlatformTarget {
        target,
        delta,
        status,
    }
}

/// Grade integrated loudness
pub fn lufs_grade(lufs: f32) -> LufsGrade {
    let quiet_side = at_least(
        lufs,
        &[(-16.0, LufsGrade::Optimal), (-20.0, LufsGrade::Quiet)],
        LufsGrade::TooQuiet,
    );
    // -lufs < 9 means lufs > -9; Loud starts above the ideal window
    below(
        -lufs,
        &[(9.0, LufsGrade::TooLoud), (-IDEAL_LUFS_RANGE.1, LufsGrade::Loud)],
        quiet_side,
    )
}

/// Grade dynamic range
pub fn dr_grade(dr: f32) -> DrGrade {
    let wide_side = at_least(
        -dr,
        &[(-14.0, DrGrade::Optimal), (-18.0, DrGrade::Dynamic)],
        DrGrade::UnderCompressed,
    );
    below(dr, &[(6.0, DrGrade::OverCompressed), (8.0, DrGrade::Compressed)], wide_side)
}

/// Loudness sub-score, 100 inside [`IDEAL_LUFS_RANGE`]
pub fn loudness_score(lufs: f32) -> f32 {
    let (lo, hi) = IDEAL_LUFS_RANGE;
    let distance = if lufs < lo {
        lo - lufs
    } else if lufs > hi {
        lufs - hi
    } else {
        0.0
    };
    at_least(-distance, &LOUDNESS_DISTANCE_BANDS, 20.0)
}

/// Peak sub-score, 100 for peaks in [-0.5, -0.1] dBFS
pub fn peak_score(peak_db: f32) -> f32 {
    if peak_db > CLIPPING_RISK_DB {
        return 40.0;
    }
    at_least(peak_db, &PEAK_BANDS, 35.0)
}

/// Dynamic range sub-score, 100 for DR8 to DR14
pub fn dynamic_range_score(dr: f32) -> f32 {
    let upper = at_least(-dr, &[(-14.0, 100.0), (-18.0, 75.0)], 50.0);
    below(dr, &[(6.0, 35.0), (8.0, 75.0)], upper)
}

fn recommendations(
    lufs: f32,
    peak_db: f32,
    dynamic_range: f32,
    platforms: &BTreeMap<String, PlatformTarget>,
) -> Vec<String> {
    let mut out = Vec::new();

    match lufs_grade(lufs) {
        LufsGrade::TooLoud => out.push(format!(
            "Integrated loudness of {:.1} LUFS is far above streaming targets; reduce limiting, platforms will turn it down anyway",
            lufs
        )),
        LufsGrade::Loud => out.push(format!(
            "Integrated loudness of {:.1} LUFS is louder than most platform targets; consider backing off the limiter",
            lufs
        )),
        LufsGrade::Quiet => out.push(format!(
            "Integrated loudness of {:.1} LUFS is quiet; raise the overall level toward -14 LUFS",
            lufs
        )),
        LufsGrade::TooQuiet => out.push(format!(
            "Integrated loudness of {:.1} LUFS is too quiet for streaming; increase gain and apply gentle limiting",
            lufs
        )),
        LufsGrade::Optimal => {}
    }

    if peak_db > CLIPPING_RISK_DB {
        out.push(format!(
            "Peak at {:.2} dBFS risks clipping after lossy encoding; leave at least 1 dB of true-peak headroom",
            peak_db
        ));
    } else if peak_db < -3.0 {
        out.push(format!(
            "Peak at {:.1} dBFS leaves unused headroom; the master can be brought up",
            peak_db
        ));
    }

    match dr_grade(dynamic_range) {
        DrGrade::OverCompressed => out.push(format!(
            "Dynamic range of DR{:.1} indicates heavy over-compression; ease off bus compression and limiting",
            dynamic_range
        )),
        DrGrade::UnderCompressed => out.push(format!(
            "Dynamic range of DR{:.1} is very wide for streaming playback; consider gentle compression",
            dynamic_range
        )),
        _ => {}
    }

    for &(key, name, _) in PLATFORM_TARGETS.iter() {
        let Some(platform) = platforms.get(key) else {
            continue;
        };
        match platform.status {
            PlatformStatus::TooLoud => out.push(format!(
                "{}: {:+.1} LU above the {:.0} LUFS target, playback will be turned down",
                name, platform.delta, platform.target
            )),
            PlatformStatus::TooQuiet => out.push(format!(
                "{}: {:+.1} LU below the {:.0} LUFS target",
                name, platform.delta, platform.target
            )),
            PlatformStatus::Optimal => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(amplitude: f32, seconds: f32, sample_rate: u32) -> Waveform {
        let n = (seconds * sample_rate as f32) as usize;
        let samples = (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 997.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_lufs_grade_boundaries() {
        assert_eq!(lufs_grade(-14.0), LufsGrade::Optimal);
        assert_eq!(lufs_grade(-8.5), LufsGrade::TooLoud);
        assert_eq!(lufs_grade(-9.0), LufsGrade::Loud);
        assert_eq!(lufs_grade(-9.5), LufsGrade::Loud);
        assert_eq!(lufs_grade(-10.0), LufsGrade::Optimal);
        assert_eq!(lufs_grade(-11.0), LufsGrade::Optimal);
        assert_eq!(lufs_grade(-16.0), LufsGrade::Optimal);
        assert_eq!(lufs_grade(-18.0), LufsGrade::Quiet);
        assert_eq!(lufs_grade(-25.0), LufsGrade::TooQuiet);
    }

    #[test]
    fn test_dr_grade_boundaries() {
        assert_eq!(dr_grade(5.9), DrGrade::OverCompressed);
        assert_eq!(dr_grade(7.0), DrGrade::Compressed);
        assert_eq!(dr_grade(14.0), DrGrade::Optimal);
        assert_eq!(dr_grade(16.0), DrGrade::Dynamic);
        assert_eq!(dr_grade(19.0), DrGrade::UnderCompressed);
    }

    #[test]
    fn test_sub_scores() {
        assert_eq!(loudness_score(-12.0), 100.0);
        assert_eq!(loudness_score(-15.5), 80.0);
        assert_eq!(loudness_score(-25.0), 20.0);
        assert_eq!(peak_score(-0.3), 100.0);
        assert_eq!(peak_score(0.0), 40.0);
        assert_eq!(peak_score(-2.0), 75.0);
        assert_eq!(dynamic_range_score(10.0), 100.0);
        assert_eq!(dynamic_range_score(4.0), 35.0);
        assert_eq!(dynamic_range_score(20.0), 50.0);
    }

    #[test]
    fn test_platform_status_at_target() {
        let t = platform_target(-14.0, -14.0, 1.0);
        assert_eq!(t.status, PlatformStatus::Optimal);
        assert_eq!(platform_target(-10.0, -14.0, 1.0).status, PlatformStatus::TooLoud);
        assert_eq!(platform_target(-20.0, -14.0, 1.0).status, PlatformStatus::TooQuiet);
    }

    #[test]
    fn test_report_for_sine_near_minus_14() {
        // full-scale 997 Hz sine measures about -3 LUFS; -11 dB of gain lands near -14
        let w = sine(10f32.powf(-11.0 / 20.0), 10.0, 48000);
        let report = analyze_mastering(&w, &LoudnessMeter::default(), &MasteringConfig::default()).unwrap();

        assert!((report.lufs + 14.0).abs() < 0.5, "lufs {}", report.lufs);
        assert_eq!(report.lufs_grade, LufsGrade::Optimal);
        assert_eq!(report.platform_targets["spotify"].status, PlatformStatus::Optimal);
        assert_eq!(report.platform_targets.len(), 5);
        // a pure sine has a 3 dB crest factor
        assert!((report.dynamic_range - 3.01).abs() < 0.1);
        assert_eq!(report.dr_grade, DrGrade::OverCompressed);
    }

    #[test]
    fn test_recommendation_order() {
        // very loud, clipping, over-compressed
        let w = sine(1.0, 5.0, 44100);
        let report = analyze_mastering(&w, &LoudnessMeter::default(), &MasteringConfig::default()).unwrap();
        let recs = &report.recommendations;
        assert!(recs[0].starts_with("Integrated loudness"));
        assert!(recs[1].starts_with("Peak"));
        assert!(recs[2].starts_with("Dynamic range"));
        assert!(recs[3..].iter().all(|r| r.contains("LU ")));
    }

    #[test]
    fn test_no_loudness_advice_inside_ideal_window() {
        for lufs in [-10.0, -10.5, -11.0] {
            assert_eq!(loudness_score(lufs), 100.0);
            assert!(recommendations(lufs, -0.3, 10.0, &BTreeMap::new()).is_empty());
        }
        let recs = recommendations(-9.5, -0.3, 10.0, &BTreeMap::new());
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("louder than most platform targets"));
    }

    #[test]
    fn test_silence_fails() {
        let w = Waveform::new(vec![0.0; 48000], 48000).unwrap();
        assert!(matches!(
            analyze_mastering(&w, &LoudnessMeter::default(), &MasteringConfig::default()),
            Err(AnalysisError::FeatureExtraction { .. })
        ));
    }
}
