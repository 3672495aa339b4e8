//! Period estimation modules
//!
//! Convert the onset strength envelope to a tempo estimate using:
//! - FFT autocorrelation with a log-normal tempo prior
//! - Peak picking utilities shared with onset detection

pub mod autocorrelation;
pub mod peak_picking;

use serde::{Deserialize, Serialize};

/// Tempo estimate with confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// BPM estimate
    pub bpm: f32,

    /// Confidence score (0.0-1.0): normalized autocorrelation at the chosen lag
    pub confidence: f32,
}

impl TempoEstimate {
    /// Estimate used when the envelope has no periodicity
    pub fn fallback() -> Self {
        Self {
            bpm: autocorrelation::FALLBACK_BPM,
            confidence: 0.0,
        }
    }
}
