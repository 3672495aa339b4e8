//! Waveform front-end
//!
//! Audio decoding (Symphonia), mono mixdown and resampling (rubato) into the
//! fixed analysis sample rate.

pub mod decoder;
pub mod resample;
pub mod waveform;

use std::path::PathBuf;

pub use waveform::Waveform;

/// Audio handed to the pipeline
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// Path to an encoded audio file
    Path(PathBuf),
    /// Encoded bytes (e.g. an upload body) with an optional extension hint
    Encoded {
        /// File contents
        bytes: Vec<u8>,
        /// Format hint such as `"mp3"`
        extension: Option<String>,
    },
    /// Already-decoded mono samples
    Pcm(Waveform),
}

impl From<Waveform> for AudioInput {
    fn from(waveform: Waveform) -> Self {
        AudioInput::Pcm(waveform)
    }
}

impl From<PathBuf> for AudioInput {
    fn from(path: PathBuf) -> Self {
        AudioInput::Path(path)
    }
}
