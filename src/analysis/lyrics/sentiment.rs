//! Lexicon sentiment scoring
//!
//! Token valences come from a small lexicon. A negation within the three
//! preceding tokens flips and damps a valence, booster words intensify it and
//! exclamation marks add emphasis. The summed valence is squashed into a
//! compound score with `x / sqrt(x^2 + 15)`.

use serde::{Deserialize, Serialize};

/// Squash constant of the compound normalisation
pub const COMPOUND_ALPHA: f32 = 15.0;
/// Multiplier applied to a negated valence
pub const NEGATION_SCALAR: f32 = -0.74;
/// Increment added by a booster word
pub const BOOSTER_INCREMENT: f32 = 0.293;
/// Emphasis per exclamation mark (at most four count)
pub const EXCLAMATION_INCREMENT: f32 = 0.292;

const NEGATIONS: [&str; 14] = [
    "not", "no", "never", "don't", "dont", "can't", "cant", "won't", "ain't", "isn't", "wasn't", "nothing",
    "nobody", "without",
];

const BOOSTERS: [&str; 10] = [
    "very", "so", "really", "extremely", "totally", "completely", "absolutely", "deeply", "truly", "too",
];

/// Word valences on a -4..4 scale
const LEXICON: [(&str, f32); 72] = [
    ("love", 3.2),
    ("loved", 2.9),
    ("loving", 2.9),
    ("happy", 2.7),
    ("joy", 2.8),
    ("smile", 1.9),
    ("laugh", 2.2),
    ("beautiful", 2.9),
    ("sweet", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("best", 3.2),
    ("free", 2.3),
    ("freedom", 3.2),
    ("hope", 1.9),
    ("dream", 1.5),
    ("dreams", 1.5),
    ("shine", 1.8),
    ("bright", 1.9),
    ("alive", 1.6),
    ("kiss", 1.8),
    ("heaven", 2.0),
    ("together", 1.4),
    ("forever", 1.0),
    ("glory", 2.3),
    ("peace", 2.5),
    ("win", 2.8),
    ("strong", 2.3),
    ("gold", 1.0),
    ("dance", 1.4),
    ("party", 1.7),
    ("fun", 2.3),
    ("baby", 0.8),
    ("darling", 2.0),
    ("safe", 1.9),
    ("warm", 0.9),
    ("light", 0.9),
    ("rise", 1.1),
    ("thank", 1.5),
    ("blessed", 2.9),
    ("hate", -2.7),
    ("sad", -2.1),
    ("cry", -2.1),
    ("crying", -2.1),
    ("tears", -1.8),
    ("pain", -2.3),
    ("hurt", -2.4),
    ("broken", -2.1),
    ("lonely", -2.0),
    ("alone", -1.0),
    ("lost", -1.3),
    ("die", -2.9),
    ("dead", -3.3),
    ("death", -2.9),
    ("dark", -1.4),
    ("cold", -0.7),
    ("fear", -2.2),
    ("afraid", -2.0),
    ("wrong", -2.1),
    ("bad", -2.5),
    ("sorry", -0.3),
    ("goodbye", -0.8),
    ("gone", -1.1),
    ("fall", -0.9),
    ("fight", -1.6),
    ("war", -2.9),
    ("blood", -1.6),
    ("lie", -1.6),
    ("lies", -1.8),
    ("miss", -0.6),
    ("empty", -0.8),
    ("trouble", -1.7),
];

/// Sentiment of a text span
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Share of positive valence (0-1)
    pub positive: f32,
    /// Share of negative valence (0-1)
    pub negative: f32,
    /// Share of neutral tokens (0-1)
    pub neutral: f32,
    /// Normalized overall valence (-1..1)
    pub compound: f32,
}

/// Valence of a lowercase token, if it is in the lexicon
pub fn valence(token: &str) -> Option<f32> {
    LEXICON.iter().find(|(w, _)| *w == token).map(|&(_, v)| v)
}

/// Split text into lowercase word tokens (apostrophes kept)
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Map a summed valence into -1..1
pub fn normalize_compound(sum: f32) -> f32 {
    sum / (sum * sum + COMPOUND_ALPHA).sqrt()
}

/// Score a text span
pub fn score(text: &str) -> Sentiment {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Sentiment {
            neutral: 1.0,
            ..Default::default()
        };
    }

    let mut valences = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let Some(mut v) = valence(token) else {
            valences.push(0.0);
            continue;
        };

        if i > 0 && BOOSTERS.contains(&tokens[i - 1].as_str()) {
            v += BOOSTER_INCREMENT * v.signum();
        }
        let window = &tokens[i.saturating_sub(3)..i];
        if window.iter().any(|t| NEGATIONS.contains(&t.as_str())) {
            v *= NEGATION_SCALAR;
        }
        valences.push(v);
    }

    let mut sum: f32 = valences.iter().sum();
    let exclamations = text.chars().filter(|&c| c == '!').count().min(4) as f32;
    if sum != 0.0 {
        sum += exclamations * EXCLAMATION_INCREMENT * sum.signum();
    }

    let positive: f32 = valences.iter().filter(|&&v| v > 0.0).map(|v| v + 1.0).sum();
    let negative: f32 = valences.iter().filter(|&&v| v < 0.0).map(|v| v.abs() + 1.0).sum();
    let neutral = valences.iter().filter(|&&v| v == 0.0).count() as f32;
    let total = positive + negative + neutral;

    Sentiment {
        positive: positive / total,
        negative: negative / total,
        neutral: neutral / total,
        compound: normalize_compound(sum),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_and_negative() {
        assert!(score("I love you, you make me happy").compound > 0.5);
        assert!(score("broken and lonely, crying in the dark").compound < -0.5);
        assert_eq!(score("the cat sat on the mat").compound, 0.0);
    }

    #[test]
    fn test_negation_flips() {
        let plain = score("I am happy").compound;
        let negated = score("I am not happy").compound;
        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_booster_and_exclamation_intensify() {
        let base = score("happy").compound;
        assert!(score("very happy").compound > base);
        assert!(score("happy!!").compound > base);
    }

    #[test]
    fn test_proportions_sum_to_one() {
        let s = score("love and pain on a quiet street");
        assert!((s.positive + s.negative + s.neutral - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_compound_normalisation() {
        assert!((normalize_compound(1.0) - 0.25).abs() < 1e-6);
        assert!(normalize_compound(100.0) < 1.0);
        assert_eq!(normalize_compound(0.0), 0.0);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        assert_eq!(score("").neutral, 1.0);
    }
}
