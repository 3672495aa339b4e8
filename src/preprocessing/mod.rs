//! Audio preprocessing modules
//!
//! This module contains utilities for preparing and measuring audio:
//! - Channel mixing (multi-channel to mono)
//! - Perceptual loudness metering (ITU-R BS.1770), peak and RMS levels

pub mod channel_mixer;
pub mod loudness;

pub use loudness::LoudnessMeter;
