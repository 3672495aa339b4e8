//! Feature extraction modules
//!
//! DSP building blocks shared by every analyzer:
//! - STFT and per-frame spectral descriptors (centroid, rolloff, bandwidth, RMS, ZCR, MFCC)
//! - Chroma extraction and key detection
//! - Onset detection (spectral flux + median/MAD threshold)
//! - Period estimation (autocorrelation tempo)
//! - Beat tracking (dynamic programming)
//! - Dominant pitch tracking
//! - Banded lookup tables and descriptive statistics

pub mod bands;
pub mod beat_tracking;
pub mod chroma;
pub mod key;
pub mod onset;
pub mod period;
pub mod pitch;
pub mod spectral;
pub mod stats;
pub mod stft;
mod track;

pub use track::{Summary, TrackFeatures, SILENCE_PEAK};
