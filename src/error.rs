//! Error types for the analysis pipeline

use std::fmt;

/// Errors that can occur during track analysis
///
/// Only [`AnalysisError::Decode`] and [`AnalysisError::InvalidInput`] abort a
/// pipeline run. The remaining variants are produced by individual components
/// and are recorded as degradations by [`crate::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Audio could not be decoded (unsupported, corrupt or empty file)
    Decode(String),

    /// A specific DSP stage failed; the owning component degrades to its default
    FeatureExtraction {
        /// Stage or component that failed (e.g. "sonic", "chords")
        stage: String,
        /// Human-readable reason
        message: String,
    },

    /// An optional external model or collaborator is missing or failed
    DependencyUnavailable {
        /// Name of the dependency (e.g. "genre_classifier")
        dependency: String,
        /// Human-readable reason
        message: String,
    },

    /// Input was present but empty (e.g. whitespace-only lyrics)
    EmptyInput(String),

    /// Invalid input parameters or configuration
    InvalidInput(String),

    /// Numerical error (NaN, value outside its declared range)
    NumericalError(String),
}

impl AnalysisError {
    /// Shorthand for a [`AnalysisError::FeatureExtraction`] error
    pub fn extraction(stage: &str, message: impl Into<String>) -> Self {
        AnalysisError::FeatureExtraction {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`AnalysisError::DependencyUnavailable`] error
    pub fn unavailable(dependency: &str, message: impl Into<String>) -> Self {
        AnalysisError::DependencyUnavailable {
            dependency: dependency.to_string(),
            message: message.into(),
        }
    }

    /// True for errors that must abort the whole pipeline
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Decode(_) | AnalysisError::InvalidInput(_))
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Decode(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::FeatureExtraction { stage, message } => {
                write!(f, "Feature extraction failed in {}: {}", stage, message)
            }
            AnalysisError::DependencyUnavailable {
                dependency,
                message,
            } => write!(f, "Dependency unavailable ({}): {}", dependency, message),
            AnalysisError::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Fail with [`AnalysisError::NumericalError`] unless `value` is finite and
/// inside `[min, max]`
pub(crate) fn ensure_range(field: &str, value: f32, min: f32, max: f32) -> Result<(), AnalysisError> {
    if !value.is_finite() || value < min || value > max {
        return Err(AnalysisError::NumericalError(format!(
            "{} = {} outside [{}, {}]",
            field, value, min, max
        )));
    }
    Ok(())
}

/// Fail with [`AnalysisError::NumericalError`] unless `value` is finite
pub(crate) fn ensure_finite(field: &str, value: f32) -> Result<(), AnalysisError> {
    if !value.is_finite() {
        return Err(AnalysisError::NumericalError(format!(
            "{} is not finite ({})",
            field, value
        )));
    }
    Ok(())
}
