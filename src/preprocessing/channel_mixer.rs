//! Channel mixing utilities (multi-channel to mono conversion)

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Channel mixing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMixMode {
    /// Average of all channels: (L + R) / 2 for stereo
    Average,
    /// First channel only
    Left,
    /// Per frame, keep the channel with the largest absolute value
    Dominant,
}

/// Fold planar channel buffers to a single mono buffer
///
/// # Arguments
///
/// * `channels` - One slice per channel, all of equal length
/// * `mode` - Mixing mode
///
/// # Returns
///
/// Mono samples
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if no channels are given or the
/// channel lengths differ.
pub fn mix_to_mono(channels: &[&[f32]], mode: ChannelMixMode) -> Result<Vec<f32>, AnalysisError> {
    let first = channels
        .first()
        .ok_or_else(|| AnalysisError::InvalidInput("No channels to mix".to_string()))?;
    let n = first.len();

    if channels.iter().any(|c| c.len() != n) {
        return Err(AnalysisError::InvalidInput(
            "Channel buffers have different lengths".to_string(),
        ));
    }

    if channels.len() == 1 {
        return Ok(first.to_vec());
    }

    let mono = match mode {
        ChannelMixMode::Average => {
            let scale = 1.0 / channels.len() as f32;
            (0..n)
                .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
                .collect()
        }
        ChannelMixMode::Left => first.to_vec(),
        ChannelMixMode::Dominant => (0..n)
            .map(|i| {
                channels
                    .iter()
                    .map(|c| c[i])
                    .fold(0.0f32, |acc, x| if x.abs() > acc.abs() { x } else { acc })
            })
            .collect(),
    };

    Ok(mono)
}

/// Convert stereo to mono
///
/// Convenience wrapper over [`mix_to_mono`] for two-channel input.
pub fn stereo_to_mono(
    left: &[f32],
    right: &[f32],
    mode: ChannelMixMode,
) -> Result<Vec<f32>, AnalysisError> {
    log::debug!("Converting stereo to mono using {:?}", mode);
    mix_to_mono(&[left, right], mode)
}
