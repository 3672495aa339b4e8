//! Krumhansl-Kessler key templates
//!
//! Defines tonal profiles for 24 keys (12 major + 12 minor).
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.

use crate::features::chroma::Chroma;

/// C major probe-tone profile
pub const MAJOR_PROFILE: Chroma = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// C minor probe-tone profile
pub const MINOR_PROFILE: Chroma = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Key templates for all 24 keys
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// Major key templates (12 keys: C, C#, D, ..., B)
    pub major: [Chroma; 12],

    /// Minor key templates (12 keys: C, C#, D, ..., B)
    pub minor: [Chroma; 12],
}

impl KeyTemplates {
    /// Create new key templates with Krumhansl-Kessler profiles
    ///
    /// Template `k` is the C profile rotated so its tonic lands on pitch class `k`.
    pub fn new() -> Self {
        Self {
            major: std::array::from_fn(|tonic| rotate(&MAJOR_PROFILE, tonic)),
            minor: std::array::from_fn(|tonic| rotate(&MINOR_PROFILE, tonic)),
        }
    }

    /// Major template with tonic `key_idx` (0 = C)
    pub fn major_template(&self, key_idx: u32) -> &Chroma {
        &self.major[key_idx as usize % 12]
    }

    /// Minor template with tonic `key_idx` (0 = C)
    pub fn minor_template(&self, key_idx: u32) -> &Chroma {
        &self.minor[key_idx as usize % 12]
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

fn rotate(profile: &Chroma, tonic: usize) -> Chroma {
    std::array::from_fn(|pc| profile[(pc + 12 - tonic) % 12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_moves_tonic() {
        let templates = KeyTemplates::new();
        // G major: tonic weight lands on pitch class 7
        assert_eq!(templates.major_template(7)[7], MAJOR_PROFILE[0]);
        // A minor: tonic weight lands on pitch class 9
        assert_eq!(templates.minor_template(9)[9], MINOR_PROFILE[0]);
        assert_eq!(templates.major_template(0), &MAJOR_PROFILE);
    }
}
