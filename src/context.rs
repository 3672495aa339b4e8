//! Shared analysis context
//!
//! Built once per process and passed by reference into every pipeline run.
//! Holds the configuration, the loudness meter, the key templates and the
//! optional external collaborators. Heavyweight handles are constructed
//! lazily, at most once, and are read-only afterwards, so one context can be
//! shared across worker threads.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::analysis::genre::{AudioGenreClassifier, GenreSources, InstrumentDetector};
use crate::analysis::lyrics::sections::SectionAnnotator;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::key::KeyTemplates;
use crate::preprocessing::loudness::LoudnessMeter;

type Loader<T> = Box<dyn Fn() -> Result<Arc<T>, AnalysisError> + Send + Sync>;

/// A collaborator that is either supplied ready-made or loaded on first use
struct LazyHandle<T: ?Sized> {
    loader: Option<Loader<T>>,
    cell: OnceLock<Option<Arc<T>>>,
}

impl<T: ?Sized> LazyHandle<T> {
    fn empty() -> Self {
        Self {
            loader: None,
            cell: OnceLock::new(),
        }
    }

    fn ready(handle: Arc<T>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Some(handle));
        Self { loader: None, cell }
    }

    fn deferred(loader: Loader<T>) -> Self {
        Self {
            loader: Some(loader),
            cell: OnceLock::new(),
        }
    }

    fn is_configured(&self) -> bool {
        self.loader.is_some() || self.cell.get().is_some_and(Option::is_some)
    }

    fn get(&self, what: &str) -> Option<&T> {
        self.cell
            .get_or_init(|| {
                let loader = self.loader.as_ref()?;
                match loader() {
                    Ok(handle) => {
                        log::info!("Loaded {}", what);
                        Some(handle)
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", what, e);
                        None
                    }
                }
            })
            .as_deref()
    }
}

/// Configuration and shared handles for pipeline runs
///
/// # Example
///
/// ```
/// use tunescore::{AnalysisConfig, AnalysisContext};
///
/// let ctx = AnalysisContext::new(AnalysisConfig::default()).unwrap();
/// assert!(ctx.genre_sources().classifier.is_none());
/// ```
pub struct AnalysisContext {
    config: AnalysisConfig,
    meter: OnceLock<LoudnessMeter>,
    key_templates: OnceLock<KeyTemplates>,
    classifier: LazyHandle<dyn AudioGenreClassifier>,
    instruments: LazyHandle<dyn InstrumentDetector>,
    annotator: LazyHandle<dyn SectionAnnotator>,
}

impl AnalysisContext {
    /// Create a context without external collaborators
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            meter: OnceLock::new(),
            key_templates: OnceLock::new(),
            classifier: LazyHandle::empty(),
            instruments: LazyHandle::empty(),
            annotator: LazyHandle::empty(),
        })
    }

    /// Attach a constructed genre classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn AudioGenreClassifier>) -> Self {
        self.classifier = LazyHandle::ready(classifier);
        self
    }

    /// Attach a genre classifier built on first use
    ///
    /// A failing loader is logged once and the classifier stays absent.
    pub fn with_classifier_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn AudioGenreClassifier>, AnalysisError> + Send + Sync + 'static,
    {
        self.classifier = LazyHandle::deferred(Box::new(loader));
        self
    }

    /// Attach a constructed instrument detector
    pub fn with_instrument_detector(mut self, detector: Arc<dyn InstrumentDetector>) -> Self {
        self.instruments = LazyHandle::ready(detector);
        self
    }

    /// Attach an instrument detector built on first use
    pub fn with_instrument_detector_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn InstrumentDetector>, AnalysisError> + Send + Sync + 'static,
    {
        self.instruments = LazyHandle::deferred(Box::new(loader));
        self
    }

    /// Attach a lyric section annotator
    pub fn with_annotator(mut self, annotator: Arc<dyn SectionAnnotator>) -> Self {
        self.annotator = LazyHandle::ready(annotator);
        self
    }

    /// Analysis configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Shared loudness meter
    pub fn loudness_meter(&self) -> &LoudnessMeter {
        self.meter.get_or_init(LoudnessMeter::default)
    }

    /// Shared key templates
    pub fn key_templates(&self) -> &KeyTemplates {
        self.key_templates.get_or_init(KeyTemplates::new)
    }

    /// Lyric section annotator, if configured
    pub fn annotator(&self) -> Option<&dyn SectionAnnotator> {
        self.annotator.get("section annotator")
    }

    /// External genre sources available to the ensemble
    pub fn genre_sources(&self) -> GenreSources<'_> {
        GenreSources {
            classifier: self.classifier.get("genre classifier"),
            instruments: self.instruments.get("instrument detector"),
        }
    }
}

impl fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("config", &self.config)
            .field("classifier", &self.classifier.is_configured())
            .field("instruments", &self.instruments.is_configured())
            .field("annotator", &self.annotator.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Waveform;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed;

    impl AudioGenreClassifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn classify(&self, _waveform: &Waveform) -> Result<BTreeMap<String, f32>, AnalysisError> {
            Ok(BTreeMap::from([("rock".to_string(), 1.0)]))
        }
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_context_is_send_sync() {
        assert_send_sync::<AnalysisContext>();
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = AnalysisConfig {
            hop_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            AnalysisContext::new(config),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_loader_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let ctx = AnalysisContext::new(AnalysisConfig::default())
            .unwrap()
            .with_classifier_loader(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Fixed) as Arc<dyn AudioGenreClassifier>)
            });

        for _ in 0..3 {
            assert_eq!(ctx.genre_sources().classifier.map(|c| c.name()), Some("fixed"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_loader_leaves_source_absent() {
        let ctx = AnalysisContext::new(AnalysisConfig::default())
            .unwrap()
            .with_instrument_detector_loader(|| Err(AnalysisError::unavailable("instruments", "model file missing")));
        assert!(ctx.genre_sources().instruments.is_none());
        assert!(ctx.annotator().is_none());
    }

    #[test]
    fn test_debug_lists_configured_sources() {
        let ctx = AnalysisContext::new(AnalysisConfig::default())
            .unwrap()
            .with_classifier(Arc::new(Fixed));
        let rendered = format!("{:?}", ctx);
        assert!(rendered.contains("classifier: true"));
        assert!(rendered.contains("instruments: false"));
    }
}
