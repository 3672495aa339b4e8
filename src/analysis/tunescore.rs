//! Composite TuneScore
//!
//! Five weighted components sum to a 0-100 score:
//!
//! | component          | max | inputs                                            |
//! |--------------------|-----|---------------------------------------------------|
//! | Production Quality | 30  | RMS variation, loudness, centroid balance, ZCR    |
//! | Musicality         | 25  | tempo, harmonic coherence, groove; chaos detector |
//! | Lyrical Quality    | 20  | songwriting quality (10 without lyrics)           |
//! | Hook Potential     | 15  | best hook score (7.5 without hooks)               |
//! | Commercial Appeal  | 10  | duration, energy, danceability, themes; quality-gated |
//!
//! The aggregator never fails: missing upstream records fall back to
//! neutral component values.

use serde::{Deserialize, Serialize};

use super::hooks::HookCandidate;
use super::lyrics::LyricalGenome;
use super::sonic::SonicGenome;
use crate::error::{ensure_range, AnalysisError};
use crate::features::bands::{at_least, in_range};
use crate::features::stats::round2;

/// Production Quality maximum
pub const PRODUCTION_MAX: f32 = 30.0;
/// Musicality maximum
pub const MUSICALITY_MAX: f32 = 25.0;
/// Lyrical Quality maximum
pub const LYRICAL_MAX: f32 = 20.0;
/// Hook Potential maximum
pub const HOOK_MAX: f32 = 15.0;
/// Commercial Appeal maximum
pub const COMMERCIAL_MAX: f32 = 10.0;

/// Lyrical Quality when no lyrics were analysed
pub const NEUTRAL_LYRICAL: f32 = 10.0;
/// Hook Potential when no hook was found
pub const NEUTRAL_HOOK: f32 = 7.5;
/// Production Quality without a sonic genome
pub const NEUTRAL_PRODUCTION: f32 = 15.0;
/// Musicality without a sonic genome
pub const NEUTRAL_MUSICALITY: f32 = 12.5;
/// Commercial Appeal without a sonic genome
pub const NEUTRAL_COMMERCIAL: f32 = 5.0;

/// Songwriting overall (0-100) -> Lyrical Quality
pub const LYRICAL_SCALE: f32 = 0.2;
/// Hook score (0-100) -> Hook Potential
pub const HOOK_SCALE: f32 = 0.15;

/// Danceability above which the chaos detector arms
pub const CHAOS_DANCEABILITY: f32 = 0.95;
/// Centroid CV above which a danceable track is treated as chaotic
pub const CHAOS_CENTROID_CV: f32 = 0.25;
/// Centroid CV above which a danceable track is treated as suspicious
pub const SUSPICIOUS_CENTROID_CV: f32 = 0.20;
/// Musicality scale and ceiling for chaotic tracks
pub const CHAOS_SCALE: f32 = 0.4;
/// Ceiling for chaotic tracks
pub const CHAOS_CEILING: f32 = 10.0;
/// Musicality scale for suspicious tracks
pub const SUSPICIOUS_SCALE: f32 = 0.7;

/// Mean of timing precision and harmonic coherence -> commercial multiplier
pub const QUALITY_MULTIPLIER_BANDS: [(f32, f32); 4] = [(75.0, 1.00), (60.0, 0.85), (50.0, 0.65), (40.0, 0.45)];
/// Multiplier below the lowest band
pub const QUALITY_MULTIPLIER_FLOOR: f32 = 0.30;

/// Letter grade bands
pub const GRADE_BANDS: [(f32, &str); 11] = [
    (90.0, "A+"),
    (85.0, "A"),
    (80.0, "A-"),
    (75.0, "B+"),
    (70.0, "B"),
    (65.0, "B-"),
    (60.0, "C+"),
    (55.0, "C"),
    (50.0, "C-"),
    (45.0, "D+"),
    (40.0, "D"),
];

// Production Quality sub-scores
const RMS_CV_BANDS: [(f32, f32, f32); 3] = [(0.2, 0.5, 8.0), (0.1, 0.2, 6.0), (0.5, 0.8, 5.0)];
const LOUDNESS_BANDS: [(f32, f32, f32); 4] = [(-16.0, -8.0, 8.0), (-22.0, -16.0, 6.0), (-8.0, 0.5, 5.0), (-30.0, -22.0, 4.0)];
const CENTROID_BANDS: [(f32, f32, f32); 3] = [(1500.0, 3500.0, 7.0), (1000.0, 1500.0, 5.0), (3500.0, 5000.0, 5.0)];
const ZCR_BANDS: [(f32, f32, f32); 3] = [(0.03, 0.12, 7.0), (0.01, 0.03, 5.0), (0.12, 0.2, 5.0)];

// Musicality sub-scores
const TEMPO_BANDS: [(f32, f32, f32); 3] = [(90.0, 140.0, 8.0), (70.0, 90.0, 6.0), (140.0, 170.0, 6.0)];
const HARMONIC_POINTS: f32 = 9.0;
const GROOVE_POINTS: f32 = 8.0;

// Commercial Appeal sub-scores
const DURATION_BANDS: [(f32, f32, f32); 3] = [(150.0, 240.0, 3.0), (120.0, 150.0, 2.0), (240.0, 300.0, 2.0)];
const ENERGY_POINTS: f32 = 2.5;
const DANCE_POINTS: f32 = 2.5;
const THEME_POINTS: f32 = 1.0;
const MAX_THEME_POINTS: f32 = 2.0;

/// One component of the score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    /// Points earned
    pub score: f32,
    /// Maximum points
    pub max: f32,
    /// `score / max * 100`
    pub percentage: f32,
}

impl ComponentScore {
    fn new(score: f32, max: f32) -> Self {
        let score = round2(score.clamp(0.0, max));
        Self {
            score,
            max,
            percentage: round2(score / max * 100.0),
        }
    }
}

/// Composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneScore {
    /// Sum of the components (0-100)
    pub overall_score: f32,
    /// Letter grade
    pub grade: String,
    /// Production Quality (max 30)
    pub production_quality: ComponentScore,
    /// Musicality (max 25)
    pub musicality: ComponentScore,
    /// Lyrical Quality (max 20)
    pub lyrical_quality: ComponentScore,
    /// Hook Potential (max 15)
    pub hook_potential: ComponentScore,
    /// Commercial Appeal (max 10)
    pub commercial_appeal: ComponentScore,
    /// Diagnostic insights
    pub insights: Vec<String>,
}

impl TuneScore {
    /// Components with display names, in table order
    pub fn components(&self) -> [(&'static str, ComponentScore); 5] {
        [
            ("Production Quality", self.production_quality),
            ("Musicality", self.musicality),
            ("Lyrical Quality", self.lyrical_quality),
            ("Hook Potential", self.hook_potential),
            ("Commercial Appeal", self.commercial_appeal),
        ]
    }

    /// Check that every component is within its maximum and the total is their sum
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` on any violation.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, c) in self.components() {
            ensure_range(name, c.score, 0.0, c.max)?;
        }
        ensure_range("overall_score", self.overall_score, 0.0, 100.0)?;
        let sum: f32 = self.components().iter().map(|(_, c)| c.score).sum();
        if (sum - self.overall_score).abs() > 0.011 {
            return Err(AnalysisError::NumericalError(format!(
                "overall_score {} differs from component sum {}",
                self.overall_score, sum
            )));
        }
        Ok(())
    }
}

/// Upstream records feeding the score
#[derive(Debug, Clone, Copy, Default)]
pub struct TuneScoreInputs<'a> {
    /// Sonic genome, if extraction succeeded
    pub genome: Option<&'a SonicGenome>,
    /// Lyrical genome, if lyrics were analysed
    pub lyrics: Option<&'a LyricalGenome>,
    /// Ranked hook candidates (best first)
    pub hooks: &'a [HookCandidate],
}

/// Compute the composite score
pub fn compute_tunescore(inputs: TuneScoreInputs<'_>) -> TuneScore {
    let (production, musicality, commercial) = match inputs.genome {
        Some(genome) => (
            production_quality(genome),
            musicality(genome),
            commercial_appeal(genome, inputs.lyrics),
        ),
        None => (NEUTRAL_PRODUCTION, NEUTRAL_MUSICALITY, NEUTRAL_COMMERCIAL),
    };

    let lyrical = inputs
        .lyrics
        .map_or(NEUTRAL_LYRICAL, |l| l.songwriting_quality.overall * LYRICAL_SCALE);

    let hook = inputs
        .hooks
        .iter()
        .map(|h| h.score)
        .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))
        .map_or(NEUTRAL_HOOK, |best| best * HOOK_SCALE);

    let production_quality = ComponentScore::new(production, PRODUCTION_MAX);
    let musicality = ComponentScore::new(musicality, MUSICALITY_MAX);
    let lyrical_quality = ComponentScore::new(lyrical, LYRICAL_MAX);
    let hook_potential = ComponentScore::new(hook, HOOK_MAX);
    let commercial_appeal = ComponentScore::new(commercial, COMMERCIAL_MAX);

    let overall_score = round2(
        production_quality.score
            + musicality.score
            + lyrical_quality.score
            + hook_potential.score
            + commercial_appeal.score,
    );

    let mut score = TuneScore {
        overall_score,
        grade: letter_grade(overall_score).to_string(),
        production_quality,
        musicality,
        lyrical_quality,
        hook_potential,
        commercial_appeal,
        insights: Vec::new(),
    };
    score.insights = insights(&score, inputs.lyrics.is_some());

    log::debug!(
        "TuneScore {:.2} ({}): production {:.2}, musicality {:.2}, lyrical {:.2}, hook {:.2}, commercial {:.2}",
        score.overall_score,
        score.grade,
        production_quality.score,
        musicality.score,
        lyrical_quality.score,
        hook_potential.score,
        commercial_appeal.score
    );

    score
}

/// Letter grade of a total score
pub fn letter_grade(score: f32) -> &'static str {
    at_least(score, &GRADE_BANDS, "F")
}

/// Commercial multiplier from timing precision and harmonic coherence (0-100 each)
pub fn quality_multiplier(timing_precision: f32, harmonic_coherence: f32) -> f32 {
    at_least(
        (timing_precision + harmonic_coherence) / 2.0,
        &QUALITY_MULTIPLIER_BANDS,
        QUALITY_MULTIPLIER_FLOOR,
    )
}

/// Production Quality points (0-30)
pub fn production_quality(genome: &SonicGenome) -> f32 {
    in_range(genome.rms.cv(), &RMS_CV_BANDS, 3.0)
        + in_range(genome.loudness, &LOUDNESS_BANDS, 2.0)
        + in_range(genome.spectral_centroid.mean, &CENTROID_BANDS, 3.0)
        + in_range(genome.zero_crossing_rate.mean, &ZCR_BANDS, 3.0)
}

/// Musicality points (0-25) after the chaos detector
pub fn musicality(genome: &SonicGenome) -> f32 {
    let normal = in_range(genome.tempo, &TEMPO_BANDS, 4.0)
        + genome.harmonic_coherence_score / 100.0 * HARMONIC_POINTS
        + genome.danceability * GROOVE_POINTS;

    let centroid_cv = genome.spectral_centroid.cv();
    if genome.danceability > CHAOS_DANCEABILITY {
        if centroid_cv > CHAOS_CENTROID_CV {
            log::debug!(
                "Chaos detector: danceability {:.2} with centroid CV {:.2}",
                genome.danceability,
                centroid_cv
            );
            return (normal * CHAOS_SCALE).min(CHAOS_CEILING);
        }
        if centroid_cv > SUSPICIOUS_CENTROID_CV {
            return normal * SUSPICIOUS_SCALE;
        }
    }
    normal
}

/// Commercial Appeal points (0-10) after the quality multiplier
pub fn commercial_appeal(genome: &SonicGenome, lyrics: Option<&LyricalGenome>) -> f32 {
    let themes = match lyrics {
        Some(l) => (l.themes.len() as f32 * THEME_POINTS).min(MAX_THEME_POINTS),
        None => THEME_POINTS,
    };
    let raw = in_range(genome.duration, &DURATION_BANDS, 1.0)
        + genome.energy * ENERGY_POINTS
        + genome.danceability * DANCE_POINTS
        + themes;
    raw * quality_multiplier(genome.timing_precision_score, genome.harmonic_coherence_score)
}

fn insights(score: &TuneScore, has_lyrics: bool) -> Vec<String> {
    let mut out = Vec::new();

    if score.overall_score >= 80.0 {
        out.push("Strong commercial potential across the board".to_string());
    } else if score.overall_score < 50.0 {
        out.push("Significant improvements needed before release".to_string());
    } else {
        out.push("Solid foundation with clear room to grow".to_string());
    }

    let weak = |c: &ComponentScore| c.percentage < 50.0;
    if weak(&score.production_quality) {
        out.push("Production quality is holding the track back; revisit the mix and master".to_string());
    }
    if weak(&score.musicality) {
        out.push("Musicality scores low; tighten timing and harmonic choices".to_string());
    }
    if has_lyrics && weak(&score.lyrical_quality) {
        out.push("Lyrics need work on structure and hooks".to_string());
    }
    if weak(&score.hook_potential) {
        out.push("No standout hook section detected".to_string());
    }
    if weak(&score.commercial_appeal) {
        out.push("Limited commercial appeal in its current form".to_string());
    }

    let strongest = score
        .components()
        .into_iter()
        .fold(None, |best: Option<(&str, f32)>, (name, c)| match best {
            Some((_, p)) if p >= c.percentage => best,
            _ => Some((name, c.percentage)),
        });
    if let Some((name, percentage)) = strongest {
        if percentage > 80.0 {
            out.push(format!("Strongest area: {} ({:.0}% of max)", name, percentage));
        }
    }

    out
}
