//! Spectral flux onset strength
//!
//! Detects onsets by finding changes in the log-compressed magnitude spectrum.
//!
//! # Algorithm
//!
//! `flux[n] = sum_k max(0, log(1 + C*|X_n(k)|) - log(1 + C*|X_{n-1}(k)|))`
//!
//! Log compression makes the measure sensitive to soft attacks as well as
//! loud ones. The first frame has no predecessor and gets zero flux.

/// Log compression constant
pub const COMPRESSION: f32 = 10.0;

/// Streaming spectral-flux accumulator (one value per pushed frame)
#[derive(Debug, Default)]
pub struct SpectralFlux {
    previous: Option<Vec<f32>>,
}

impl SpectralFlux {
    /// New accumulator with no previous frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Flux between the previous frame and `magnitudes`
    pub fn push(&mut self, magnitudes: &[f32]) -> f32 {
        let current: Vec<f32> = magnitudes
            .iter()
            .map(|&m| (1.0 + COMPRESSION * m).ln())
            .collect();

        let flux = match &self.previous {
            Some(prev) if prev.len() == current.len() => current
                .iter()
                .zip(prev)
                .map(|(&c, &p)| (c - p).max(0.0))
                .sum(),
            _ => 0.0,
        };

        self.previous = Some(current);
        flux
    }
}

/// Onset strength envelope of a whole magnitude spectrogram
///
/// # Arguments
///
/// * `fft_magnitudes` - FFT magnitude spectrogram (n_frames × n_bins)
///
/// # Returns
///
/// One flux value per frame
pub fn spectral_flux_envelope(fft_magnitudes: &[Vec<f32>]) -> Vec<f32> {
    let mut flux = SpectralFlux::new();
    fft_magnitudes.iter().map(|frame| flux.push(frame)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_rises_on_attack_only() {
        let quiet = vec![0.0f32; 8];
        let loud = vec![1.0f32; 8];
        let env = spectral_flux_envelope(&[quiet.clone(), loud.clone(), loud, quiet]);
        assert_eq!(env[0], 0.0);
        assert!(env[1] > 0.0);
        assert_eq!(env[2], 0.0);
        // decays are not onsets
        assert_eq!(env[3], 0.0);
    }
}
