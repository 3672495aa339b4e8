//! Lyrical analysis
//!
//! Builds a lyrical genome from lyrics text: sentiment and per-line
//! emotional arc, section structure, themes, complexity and repetition, and
//! a songwriting-quality score made of four sub-scores capped at 25 each:
//!
//! - **structure**: verse and chorus present and balanced, bridge,
//!   pre-chorus, chorus repeated 2 to 4 times
//! - **hook**: repetition strength and chorus sentiment lift
//! - **narrative**: sentiment range, first-half to second-half shift, ending clarity
//! - **craft**: vocabulary richness, rhyme density sweet spot, line-length variety

pub mod sections;
pub mod sentiment;
pub mod themes;

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::error::{ensure_range, AnalysisError};
use crate::features::stats::{clamp01, coefficient_of_variation, mean};

pub use sections::{HeuristicSplitter, Section, SectionAnnotator, SectionKind};
pub use sentiment::Sentiment;

/// Cap of every songwriting sub-score
pub const SUB_SCORE_MAX: f32 = 25.0;
/// Sub-scores below this produce a weakness insight
pub const WEAK_SUB_SCORE: f32 = 12.0;
/// Sub-scores at or above this produce a strength insight
pub const STRONG_SUB_SCORE: f32 = 20.0;

/// Rhyme density sweet spot (rhyming line endings per word)
pub const RHYME_SWEET_SPOT: (f32, f32) = (0.05, 0.20);

/// Repeated-line share that saturates repetition strength
const REPETITION_SATURATION: f32 = 0.4;
/// Chorus intensity gain over the verses that saturates the lift
const LIFT_SATURATION: f32 = 0.3;
/// Type/token ratio that saturates vocabulary richness
const VOCABULARY_SATURATION: f32 = 0.6;
/// Line-length CV that saturates line variety
const LINE_VARIETY_SATURATION: f32 = 0.3;

/// Section structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricStructure {
    /// Sections in order
    pub sections: Vec<Section>,
    /// Pattern such as "VCVCBC"
    pub pattern: String,
    /// Number of verses
    pub verse_count: usize,
    /// Number of choruses
    pub chorus_count: usize,
    /// A bridge is present
    pub has_bridge: bool,
    /// A pre-chorus is present
    pub has_pre_chorus: bool,
    /// Annotator that produced the sections
    pub annotator: String,
}

/// Lexical complexity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LyricComplexity {
    /// Unique words / total words
    pub vocabulary_richness: f32,
    /// Rhyming line endings per word
    pub rhyme_density: f32,
    /// Mean words per line
    pub avg_line_length: f32,
    /// Lyric lines
    pub line_count: usize,
    /// Words
    pub word_count: usize,
}

/// Line repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repetition {
    /// Most repeated line, when any line repeats
    pub most_repeated_line: Option<String>,
    /// Occurrences of that line
    pub count: usize,
    /// Share of lines that repeat an earlier line (0-1)
    pub score: f32,
}

/// Songwriting quality sub-scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongwritingQuality {
    /// Structure quality (0-25)
    pub structure: f32,
    /// Hook effectiveness (0-25)
    pub hook: f32,
    /// Narrative arc (0-25)
    pub narrative: f32,
    /// Lyrical craft (0-25)
    pub craft: f32,
    /// Sum of the four (0-100)
    pub overall: f32,
    /// Up to four insights, ordered structure, hook, narrative, craft
    pub insights: Vec<String>,
}

/// Lyrical genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricalGenome {
    /// Whole-text sentiment
    pub sentiment: Sentiment,
    /// Compound sentiment per lyric line
    pub emotional_arc: Vec<f32>,
    /// Section structure
    pub structure: LyricStructure,
    /// Detected themes
    pub themes: Vec<String>,
    /// Lexical complexity
    pub complexity: LyricComplexity,
    /// Line repetition
    pub repetition: Repetition,
    /// Songwriting quality
    pub songwriting_quality: SongwritingQuality,
}

/// Analyze lyrics text
///
/// Sections come from `annotator` when given; if it fails or panics the
/// built-in [`HeuristicSplitter`] is used.
///
/// # Errors
///
/// Returns `AnalysisError::EmptyInput` for blank text.
pub fn analyze_lyrics(
    text: &str,
    annotator: Option<&dyn SectionAnnotator>,
) -> Result<LyricalGenome, AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput("lyrics text is empty".to_string()));
    }

    let (sections, annotator_name) = annotate(text, annotator)?;
    let lines: Vec<&str> = sections
        .iter()
        .flat_map(|s| s.lines.iter().map(String::as_str))
        .collect();
    if lines.is_empty() {
        return Err(AnalysisError::EmptyInput("lyrics contain no lines".to_string()));
    }

    let sentiment = sentiment::score(&lines.join("\n"));
    let emotional_arc: Vec<f32> = lines.iter().map(|l| sentiment::score(l).compound).collect();

    let tokens: Vec<String> = lines.iter().flat_map(|l| sentiment::tokenize(l)).collect();
    let themes = themes::detect_themes(&tokens);
    let complexity = complexity(&lines, &tokens);
    let repetition = repetition(&lines);
    let structure = structure(sections.clone(), annotator_name);

    let quality = songwriting_quality(&structure, &repetition, &emotional_arc, &complexity, &lines);

    log::debug!(
        "Lyrics: {} lines, pattern {}, compound {:.2}, themes {:?}, quality {:.1}",
        complexity.line_count,
        structure.pattern,
        sentiment.compound,
        themes,
        quality.overall
    );

    quality.validate()?;
    Ok(LyricalGenome {
        sentiment,
        emotional_arc,
        structure,
        themes,
        complexity,
        repetition,
        songwriting_quality: quality,
    })
}

fn annotate(
    text: &str,
    annotator: Option<&dyn SectionAnnotator>,
) -> Result<(Vec<Section>, String), AnalysisError> {
    if let Some(external) = annotator {
        match catch_unwind(AssertUnwindSafe(|| external.annotate(text))) {
            Ok(Ok(sections)) if !sections.is_empty() => {
                return Ok((sections, external.name().to_string()));
            }
            Ok(Ok(_)) => log::warn!("Section annotator '{}' returned no sections", external.name()),
            Ok(Err(e)) => log::warn!("Section annotator '{}' failed: {}", external.name(), e),
            Err(_) => log::warn!("Section annotator '{}' panicked", external.name()),
        }
    }
    let fallback = HeuristicSplitter;
    Ok((fallback.annotate(text)?, fallback.name().to_string()))
}

fn structure(sections: Vec<Section>, annotator: String) -> LyricStructure {
    let count = |kind: SectionKind| sections.iter().filter(|s| s.kind == kind).count();
    LyricStructure {
        pattern: sections::pattern(&sections),
        verse_count: count(SectionKind::Verse),
        chorus_count: count(SectionKind::Chorus),
        has_bridge: count(SectionKind::Bridge) > 0,
        has_pre_chorus: count(SectionKind::PreChorus) > 0,
        annotator,
        sections,
    }
}

fn complexity(lines: &[&str], tokens: &[String]) -> LyricComplexity {
    let mut unique: Vec<&str> = tokens.iter().map(String::as_str).collect();
    unique.sort_unstable();
    unique.dedup();

    let endings: Vec<Option<String>> = lines.iter().map(|l| rhyme_ending(l)).collect();
    let rhymes = (1..endings.len())
        .filter(|&i| {
            let Some(end) = &endings[i] else { return false };
            (i.saturating_sub(2)..i).any(|j| endings[j].as_ref() == Some(end))
        })
        .count();

    let word_count = tokens.len();
    LyricComplexity {
        vocabulary_richness: if word_count > 0 {
            unique.len() as f32 / word_count as f32
        } else {
            0.0
        },
        rhyme_density: if word_count > 0 {
            rhymes as f32 / word_count as f32
        } else {
            0.0
        },
        avg_line_length: word_count as f32 / lines.len().max(1) as f32,
        line_count: lines.len(),
        word_count,
    }
}

/// Last two letters of the final word of a line
fn rhyme_ending(line: &str) -> Option<String> {
    let word = sentiment::tokenize(line).pop()?;
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 2 {
        return None;
    }
    Some(letters[letters.len() - 2..].iter().collect())
}

fn repetition(lines: &[&str]) -> Repetition {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    for line in lines {
        let key = line.trim().to_lowercase();
        let entry = counts.entry(key.clone()).or_insert(0);
        if *entry == 0 {
            first_seen.push(key);
        }
        *entry += 1;
    }

    // earliest line wins ties
    let mut best: Option<(&String, usize)> = None;
    for key in &first_seen {
        let count = counts[key];
        if count > 1 && best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }

    Repetition {
        most_repeated_line: best.map(|(line, _)| line.clone()),
        count: best.map_or(0, |(_, c)| c),
        score: (lines.len() - counts.len()) as f32 / lines.len().max(1) as f32,
    }
}

fn songwriting_quality(
    structure: &LyricStructure,
    repetition: &Repetition,
    arc: &[f32],
    complexity: &LyricComplexity,
    lines: &[&str],
) -> SongwritingQuality {
    let structure_score = structure_score(structure);
    let hook = hook_score(structure, repetition);
    let narrative = narrative_score(arc);
    let craft = craft_score(complexity, lines);

    let mut insights = Vec::new();
    let labelled = [
        (
            structure_score,
            "Song structure is loose; a clear verse/chorus form with a bridge would help",
            "Strong, well-balanced song structure",
        ),
        (
            hook,
            "The chorus lacks a memorable, repeated hook",
            "Memorable, repeated hook with emotional lift",
        ),
        (
            narrative,
            "The lyrics stay emotionally flat; build more of a story arc",
            "Clear emotional journey from start to finish",
        ),
        (
            craft,
            "Word choice and rhyme could be more varied",
            "Rich vocabulary and well-judged rhyme",
        ),
    ];
    for (score, weakness, strength) in labelled {
        if score < WEAK_SUB_SCORE {
            insights.push(weakness.to_string());
        } else if score >= STRONG_SUB_SCORE {
            insights.push(strength.to_string());
        }
    }

    SongwritingQuality {
        structure: structure_score,
        hook,
        narrative,
        craft,
        overall: structure_score + hook + narrative + craft,
        insights,
    }
}

fn structure_score(s: &LyricStructure) -> f32 {
    let mut score: f32 = 0.0;
    if s.verse_count > 0 && s.chorus_count > 0 {
        score += 8.0;
        if s.verse_count.abs_diff(s.chorus_count) <= 1 {
            score += 4.0;
        }
    }
    if s.has_bridge {
        score += 5.0;
    }
    if s.has_pre_chorus {
        score += 3.0;
    }
    score += if (2..=4).contains(&s.chorus_count) { 5.0 } else { 2.0 };
    score.min(SUB_SCORE_MAX)
}

fn hook_score(structure: &LyricStructure, repetition: &Repetition) -> f32 {
    let strength = clamp01(repetition.score / REPETITION_SATURATION);

    let intensity = |kind: Option<SectionKind>| {
        let values: Vec<f32> = structure
            .sections
            .iter()
            .filter(|s| match kind {
                Some(k) => s.kind == k,
                None => s.kind != SectionKind::Chorus,
            })
            .flat_map(|s| s.lines.iter().map(|l| sentiment::score(l).compound.abs()))
            .collect();
        mean(&values)
    };
    let lift = if structure.chorus_count > 0 {
        clamp01((intensity(Some(SectionKind::Chorus)) - intensity(None)) / LIFT_SATURATION)
    } else {
        0.0
    };

    (15.0 * strength + 10.0 * lift).min(SUB_SCORE_MAX)
}

fn narrative_score(arc: &[f32]) -> f32 {
    if arc.is_empty() {
        return 0.0;
    }
    let max = arc.iter().cloned().fold(f32::MIN, f32::max);
    let min = arc.iter().cloned().fold(f32::MAX, f32::min);
    let range = clamp01(max - min);

    let half = arc.len() / 2;
    let shift = if half > 0 {
        clamp01((mean(&arc[half..]) - mean(&arc[..half])).abs() / 0.5)
    } else {
        0.0
    };

    let tail = &arc[arc.len().saturating_sub(2)..];
    let ending = clamp01(mean(tail).abs() / 0.5);

    (10.0 * range + 8.0 * shift + 7.0 * ending).min(SUB_SCORE_MAX)
}

fn craft_score(complexity: &LyricComplexity, lines: &[&str]) -> f32 {
    let vocabulary = clamp01(complexity.vocabulary_richness / VOCABULARY_SATURATION);
    let (lo, hi) = RHYME_SWEET_SPOT;
    let d = complexity.rhyme_density;
    let rhyme = if d < lo {
        d / lo
    } else if d <= hi {
        1.0
    } else {
        clamp01(1.0 - (d - hi) / hi)
    };
    let lengths: Vec<f32> = lines
        .iter()
        .map(|l| sentiment::tokenize(l).len() as f32)
        .collect();
    let variety = clamp01(coefficient_of_variation(&lengths) / LINE_VARIETY_SATURATION);

    (9.0 * vocabulary + 9.0 * rhyme + 7.0 * variety).min(SUB_SCORE_MAX)
}

impl SongwritingQuality {
    /// Check sub-score caps
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` on an out-of-range sub-score.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        ensure_range("lyrics.structure", self.structure, 0.0, SUB_SCORE_MAX)?;
        ensure_range("lyrics.hook", self.hook, 0.0, SUB_SCORE_MAX)?;
        ensure_range("lyrics.narrative", self.narrative, 0.0, SUB_SCORE_MAX)?;
        ensure_range("lyrics.craft", self.craft, 0.0, SUB_SCORE_MAX)?;
        ensure_range("lyrics.overall", self.overall, 0.0, 4.0 * SUB_SCORE_MAX)
    }
}
