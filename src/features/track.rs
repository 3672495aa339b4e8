//! Shared frame-level features of one track
//!
//! Every scoring component reads the same STFT-derived features. They are
//! computed in a single pass over the resampled waveform so no component
//! repeats the transform.

use serde::{Deserialize, Serialize};

use super::beat_tracking::{track_beats, TIGHTNESS};
use super::chroma::{Chroma, ChromaExtractor};
use super::onset::detect_onsets;
use super::onset::spectral_flux::SpectralFlux;
use super::period::autocorrelation::estimate_tempo;
use super::period::TempoEstimate;
use super::pitch::{dominant_peak, voiced_track};
use super::spectral::{frame_rms, spectral_shape, zero_crossing_rate, Mfcc, N_MFCC};
use super::stats::{mean, std_dev};
use super::stft::Stft;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::Waveform;

/// Peak amplitude below which a track is treated as silent (-80 dBFS)
pub const SILENCE_PEAK: f32 = 1e-4;

/// Mean and standard deviation of a per-frame series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Mean over frames
    pub mean: f32,
    /// Population standard deviation over frames
    pub std: f32,
}

impl Summary {
    /// Summarize a series
    pub fn of(values: &[f32]) -> Self {
        Self {
            mean: mean(values),
            std: std_dev(values),
        }
    }

    /// `std / mean` (0.0 for a zero mean)
    pub fn cv(&self) -> f32 {
        if self.mean.abs() <= f32::EPSILON {
            0.0
        } else {
            self.std / self.mean.abs()
        }
    }
}

/// Frame-level features shared by the analyzers
#[derive(Debug, Clone)]
pub struct TrackFeatures {
    /// Analysis sample rate in Hz
    pub sample_rate: u32,
    /// STFT frame size
    pub frame_size: usize,
    /// STFT hop size
    pub hop_size: usize,
    /// Duration of the analysed buffer in seconds
    pub duration: f32,
    /// Absolute peak amplitude
    pub peak: f32,
    /// Spectral centroid per frame (Hz)
    pub centroid: Vec<f32>,
    /// 85% spectral rolloff per frame (Hz)
    pub rolloff: Vec<f32>,
    /// Spectral bandwidth per frame (Hz)
    pub bandwidth: Vec<f32>,
    /// RMS amplitude per frame
    pub rms: Vec<f32>,
    /// Zero-crossing rate per frame
    pub zcr: Vec<f32>,
    /// MFCCs per frame
    pub mfcc: Vec<[f32; N_MFCC]>,
    /// Chroma per frame (max-normalized, silent frames all zero)
    pub chroma: Vec<Chroma>,
    /// Spectral flux onset strength per frame
    pub onset_envelope: Vec<f32>,
    /// Onset frame indices, ascending
    pub onsets: Vec<usize>,
    /// Dominant pitch per frame in Hz (`None` when unvoiced)
    pub pitch: Vec<Option<f32>>,
    /// Global tempo estimate
    pub tempo: TempoEstimate,
    /// Beat times in seconds, ascending
    pub beats: Vec<f32>,
}

impl TrackFeatures {
    /// Compute all frame features of a waveform
    ///
    /// The waveform is expected at the analysis sample rate.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for invalid STFT or tempo parameters.
    pub fn compute(waveform: &Waveform, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let sample_rate = waveform.sample_rate();
        let stft = Stft::new(config.frame_size, config.hop_size)?;
        let n_frames = stft.num_frames(waveform.len());

        log::debug!(
            "Computing frame features: {} samples at {} Hz, {} frames",
            waveform.len(),
            sample_rate,
            n_frames
        );

        let chroma_extractor = ChromaExtractor::new(sample_rate, config.frame_size, config);
        let mfcc_bank = Mfcc::new(sample_rate, config.frame_size);
        let mut flux = SpectralFlux::new();

        let mut features = Self {
            sample_rate,
            frame_size: config.frame_size,
            hop_size: config.hop_size,
            duration: waveform.duration_seconds(),
            peak: waveform.peak(),
            centroid: Vec::with_capacity(n_frames),
            rolloff: Vec::with_capacity(n_frames),
            bandwidth: Vec::with_capacity(n_frames),
            rms: Vec::with_capacity(n_frames),
            zcr: Vec::with_capacity(n_frames),
            mfcc: Vec::with_capacity(n_frames),
            chroma: Vec::with_capacity(n_frames),
            onset_envelope: Vec::with_capacity(n_frames),
            onsets: Vec::new(),
            pitch: Vec::new(),
            tempo: TempoEstimate::fallback(),
            beats: Vec::new(),
        };
        let mut peaks = Vec::with_capacity(n_frames);

        stft.process(waveform.samples(), |_, frame, mags| {
            let shape = spectral_shape(mags, sample_rate, config.frame_size);
            features.centroid.push(shape.centroid);
            features.rolloff.push(shape.rolloff);
            features.bandwidth.push(shape.bandwidth);
            features.rms.push(frame_rms(frame));
            features.zcr.push(zero_crossing_rate(frame));
            features.mfcc.push(mfcc_bank.compute(mags));
            features.chroma.push(chroma_extractor.extract(mags));
            features.onset_envelope.push(flux.push(mags));
            peaks.push(dominant_peak(mags, sample_rate, config.frame_size));
        });

        features.pitch = voiced_track(&peaks);

        let fps = features.frames_per_second();
        features.onsets = detect_onsets(&features.onset_envelope, fps);
        features.tempo = estimate_tempo(&features.onset_envelope, fps, config.min_bpm, config.max_bpm)?;
        features.beats = track_beats(&features.onset_envelope, fps, features.tempo.bpm, TIGHTNESS)?;

        log::debug!(
            "Frame features: tempo {:.1} BPM, {} beats, {} onsets, silent={}",
            features.tempo.bpm,
            features.beats.len(),
            features.onsets.len(),
            features.is_silent()
        );

        Ok(features)
    }

    /// Frames per second of every per-frame series
    pub fn frames_per_second(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size as f32
    }

    /// Number of analysis frames
    pub fn num_frames(&self) -> usize {
        self.rms.len()
    }

    /// Start time of a frame in seconds
    pub fn frame_time(&self, frame: usize) -> f32 {
        frame as f32 * self.hop_size as f32 / self.sample_rate as f32
    }

    /// Frame index range covering `[start, end)` seconds, clamped to the track
    pub fn frame_range(&self, start: f32, end: f32) -> std::ops::Range<usize> {
        let fps = self.frames_per_second();
        let n = self.num_frames();
        let a = ((start.max(0.0) * fps).floor() as usize).min(n);
        let b = ((end.max(0.0) * fps).ceil() as usize).min(n);
        a..b.max(a)
    }

    /// True when the peak level is below -80 dBFS
    pub fn is_silent(&self) -> bool {
        self.peak < SILENCE_PEAK
    }

    /// Fail with `FeatureExtraction` for silent tracks
    ///
    /// Scoring components call this first so silent input degrades every
    /// component instead of producing meaningless numbers.
    pub fn ensure_audible(&self, stage: &str) -> Result<(), AnalysisError> {
        if self.is_silent() {
            return Err(AnalysisError::extraction(
                stage,
                format!("signal is silent (peak {:.2e})", self.peak),
            ));
        }
        Ok(())
    }

    /// Intervals between consecutive beats in seconds
    pub fn beat_intervals(&self) -> Vec<f32> {
        self.beats.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Per-coefficient MFCC means and standard deviations
    pub fn mfcc_summary(&self) -> (Vec<f32>, Vec<f32>) {
        (0..N_MFCC)
            .map(|k| {
                let column: Vec<f32> = self.mfcc.iter().map(|frame| frame[k]).collect();
                (mean(&column), std_dev(&column))
            })
            .unzip()
    }
}
