//! Keyword theme detection

/// Minimum keyword hits before a theme is reported
pub const MIN_THEME_HITS: usize = 2;
/// Maximum number of themes reported
pub const MAX_THEMES: usize = 5;

/// Theme keyword lexicon, in tie-break order
const THEMES: [(&str, &[&str]); 10] = [
    (
        "love",
        &["love", "heart", "kiss", "baby", "darling", "forever", "together", "hold", "touch"],
    ),
    (
        "heartbreak",
        &["broken", "goodbye", "tears", "cry", "crying", "gone", "leave", "left", "miss", "alone"],
    ),
    (
        "party",
        &["party", "dance", "club", "drink", "drinks", "shots", "tonight", "weekend", "floor"],
    ),
    (
        "money",
        &["money", "cash", "rich", "gold", "diamonds", "paid", "dollar", "dollars", "bank"],
    ),
    (
        "struggle",
        &["fight", "pain", "struggle", "hard", "survive", "battle", "fall", "broke", "storm"],
    ),
    (
        "freedom",
        &["free", "freedom", "fly", "wings", "escape", "run", "open", "wild", "chains"],
    ),
    (
        "nostalgia",
        &["remember", "memories", "yesterday", "used", "young", "old", "back", "childhood", "again"],
    ),
    (
        "faith",
        &["god", "lord", "pray", "prayer", "heaven", "angel", "faith", "soul", "grace"],
    ),
    (
        "night life",
        &["night", "lights", "city", "midnight", "neon", "streets", "late", "moon", "stars"],
    ),
    (
        "home",
        &["home", "town", "house", "family", "mama", "daddy", "porch", "road", "hometown"],
    ),
];

/// Themes with at least [`MIN_THEME_HITS`] keyword hits, most hits first
pub fn detect_themes(tokens: &[String]) -> Vec<String> {
    let mut hits: Vec<(&str, usize)> = THEMES
        .iter()
        .map(|(theme, words)| {
            let count = tokens.iter().filter(|t| words.contains(&t.as_str())).count();
            (*theme, count)
        })
        .filter(|&(_, count)| count >= MIN_THEME_HITS)
        .collect();

    hits.sort_by(|a, b| b.1.cmp(&a.1));
    hits.into_iter()
        .take(MAX_THEMES)
        .map(|(theme, _)| theme.to_string())
        .collect()
}
