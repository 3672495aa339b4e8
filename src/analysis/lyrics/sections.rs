//! Lyric section annotation
//!
//! Section boundaries normally come from an external [`SectionAnnotator`].
//! [`HeuristicSplitter`] is the built-in fallback: it reads bracketed tags
//! such as `[Chorus]` or `[Verse 2]` when present, otherwise splits on blank
//! lines and labels repeated stanzas as chorus.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Kind of lyric section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Intro
    Intro,
    /// Verse
    Verse,
    /// Pre-chorus
    PreChorus,
    /// Chorus / hook / refrain
    Chorus,
    /// Bridge
    Bridge,
    /// Outro
    Outro,
    /// Unrecognized tag
    Other,
}

impl SectionKind {
    /// Single-letter code used in structure patterns
    pub fn code(&self) -> char {
        match self {
            SectionKind::Intro => 'I',
            SectionKind::Verse => 'V',
            SectionKind::PreChorus => 'P',
            SectionKind::Chorus => 'C',
            SectionKind::Bridge => 'B',
            SectionKind::Outro => 'O',
            SectionKind::Other => 'X',
        }
    }

    /// Classify a tag such as "Pre-Chorus" or "Verse 2"
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_lowercase();
        if tag.contains("pre") && tag.contains("chorus") {
            SectionKind::PreChorus
        } else if tag.contains("chorus") || tag.contains("hook") || tag.contains("refrain") {
            SectionKind::Chorus
        } else if tag.contains("verse") {
            SectionKind::Verse
        } else if tag.contains("bridge") {
            SectionKind::Bridge
        } else if tag.contains("intro") {
            SectionKind::Intro
        } else if tag.contains("outro") {
            SectionKind::Outro
        } else {
            SectionKind::Other
        }
    }
}

/// A lyric section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section kind
    pub kind: SectionKind,
    /// Lyric lines, tags removed
    pub lines: Vec<String>,
}

/// External lyric section annotator
pub trait SectionAnnotator: Send + Sync {
    /// Provider name recorded in the structure
    fn name(&self) -> &str;

    /// Split lyrics into sections
    fn annotate(&self, text: &str) -> Result<Vec<Section>, AnalysisError>;
}

/// Tag and blank-line splitter
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSplitter;

impl SectionAnnotator for HeuristicSplitter {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn annotate(&self, text: &str) -> Result<Vec<Section>, AnalysisError> {
        let sections = if text.lines().any(|l| tag_of(l).is_some()) {
            split_tagged(text)
        } else {
            split_stanza_sections(text)
        };
        if sections.is_empty() {
            return Err(AnalysisError::EmptyInput("lyrics contain no lines".to_string()));
        }
        Ok(sections)
    }
}

fn tag_of(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

fn split_tagged(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        kind: SectionKind::Verse,
        lines: Vec::new(),
    };

    for line in text.lines() {
        if let Some(tag) = tag_of(line) {
            if !current.lines.is_empty() {
                sections.push(current);
            }
            current = Section {
                kind: SectionKind::from_tag(tag),
                lines: Vec::new(),
            };
        } else if !line.trim().is_empty() {
            current.lines.push(line.trim().to_string());
        }
    }
    if !current.lines.is_empty() {
        sections.push(current);
    }
    sections
}

fn split_stanzas(text: &str) -> Vec<String> {
    let mut stanzas = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                stanzas.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        stanzas.push(current.join("\n"));
    }
    stanzas
}

fn split_stanza_sections(text: &str) -> Vec<Section> {
    let stanzas = split_stanzas(text);

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for stanza in &stanzas {
        *counts.entry(stanza.to_lowercase()).or_insert(0) += 1;
    }
    let is_chorus = |s: &str| counts.get(&s.to_lowercase()).copied().unwrap_or(0) > 1;

    let mut kinds: Vec<SectionKind> = stanzas
        .iter()
        .map(|s| if is_chorus(s) { SectionKind::Chorus } else { SectionKind::Verse })
        .collect();

    // a lone stanza sitting between a later chorus and the final chorus is a bridge
    let chorus_positions: Vec<usize> = (0..kinds.len()).filter(|&i| kinds[i] == SectionKind::Chorus).collect();
    if chorus_positions.len() >= 3 {
        let last = chorus_positions[chorus_positions.len() - 1];
        let before = chorus_positions[chorus_positions.len() - 2];
        if last == before + 2 && kinds[before + 1] == SectionKind::Verse {
            kinds[before + 1] = SectionKind::Bridge;
        }
    }

    stanzas
        .into_iter()
        .zip(kinds)
        .map(|(stanza, kind)| Section {
            kind,
            lines: stanza.lines().map(str::to_string).collect(),
        })
        .collect()
}

/// Structure pattern such as "VCVCBC"
pub fn pattern(sections: &[Section]) -> String {
    sections.iter().map(|s| s.kind.code()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_sections() {
        let text = "[Verse 1]\nline one\nline two\n\n[Pre-Chorus]\nbuild up\n[Chorus]\nsing it\n[Bridge]\nturn\n[Chorus]\nsing it";
        let sections = HeuristicSplitter.annotate(text).unwrap();
        assert_eq!(pattern(&sections), "VPCBC");
        assert_eq!(sections[0].lines, vec!["line one", "line two"]);
    }

    #[test]
    fn test_untagged_lines_before_first_tag_are_verse() {
        let sections = HeuristicSplitter.annotate("opening line\n[Hook]\nhey hey").unwrap();
        assert_eq!(pattern(&sections), "VC");
    }

    #[test]
    fn test_repeated_stanzas_become_chorus() {
        let chorus = "oh we go\nall night long";
        let text = format!(
            "first verse\nwalking down\n\n{c}\n\nsecond verse\ntalking loud\n\n{c}\n\nsomething new\nchanges here\n\n{c}",
            c = chorus
        );
        let sections = HeuristicSplitter.annotate(&text).unwrap();
        assert_eq!(pattern(&sections), "VCVCBC");
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(SectionKind::from_tag("Pre Chorus"), SectionKind::PreChorus);
        assert_eq!(SectionKind::from_tag("Refrain"), SectionKind::Chorus);
        assert_eq!(SectionKind::from_tag("Interlude"), SectionKind::Other);
    }

    #[test]
    fn test_blank_text_is_empty_input() {
        assert!(matches!(
            HeuristicSplitter.annotate("\n \n"),
            Err(AnalysisError::EmptyInput(_))
        ));
    }
}
