//! Orchestrator
//!
//! Fans one decoded image out to the classifier and every analyzer, and
//! collects exactly one record per bundle key.
//!
//! # Error Handling
//! - Per-analyzer isolation: an analyzer error, panic, or timeout becomes an
//!   Error record; the others still run and the bundle is always returned
//! - A timed-out classifier task is aborted. Analyzers run on the blocking
//!   pool and cannot be cancelled, so a timed-out analyzer runs to completion
//!   and its result is discarded
//! - A missing or unavailable classifier becomes a Skipped record
//! - Keys with no configured analyzer are recorded as Skipped

use crate::analyzers::{default_analyzers, SignalAnalyzer};
use crate::classifier::{DeepfakeClassifier, RemoteClassifier};
use crate::config::DfscanConfig;
use crate::error::ClassifierError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, AssessmentBundle, SignalPayload, SignalRecord};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Description of the Skipped classifier record
pub const CLASSIFIER_UNAVAILABLE: &str =
    "AI model not available - configure a classifier endpoint for AI analysis";

/// Description of a Skipped record for a key with no analyzer
pub const ANALYZER_NOT_CONFIGURED: &str = "Analyzer not configured";

const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs all signals against one image
pub struct Orchestrator {
    analyzers: Vec<Arc<dyn SignalAnalyzer>>,
    classifier: Option<Arc<dyn DeepfakeClassifier>>,
    analyzer_timeout: Duration,
    classifier_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        analyzers: Vec<Arc<dyn SignalAnalyzer>>,
        classifier: Option<Arc<dyn DeepfakeClassifier>>,
    ) -> Self {
        Self {
            analyzers,
            classifier,
            analyzer_timeout: DEFAULT_ANALYZER_TIMEOUT,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, analyzer_timeout: Duration, classifier_timeout: Duration) -> Self {
        self.analyzer_timeout = analyzer_timeout;
        self.classifier_timeout = classifier_timeout;
        self
    }

    /// Standard analyzers plus a remote classifier when an endpoint is configured
    ///
    /// A classifier that cannot be constructed is logged and left out; the
    /// assessment then degrades to heuristics only.
    pub fn from_config(config: &DfscanConfig) -> Self {
        let classifier: Option<Arc<dyn DeepfakeClassifier>> = match &config.classifier.endpoint {
            Some(endpoint) => match RemoteClassifier::new(endpoint.clone(), config.classifier.timeout()) {
                Ok(client) => {
                    info!(endpoint = %endpoint, "Remote classifier configured");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Failed to initialize classifier - continuing without it");
                    None
                }
            },
            None => {
                info!("No classifier endpoint configured - running heuristics only");
                None
            }
        };

        Self::new(default_analyzers(&config.heuristics), classifier).with_timeouts(
            config.analysis.analyzer_timeout(),
            config.classifier.timeout(),
        )
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.as_ref().is_some_and(|c| c.is_available())
    }

    /// Run the classifier and every analyzer; never fails
    pub async fn assess(&self, image: Arc<DecodedImage>) -> AssessmentBundle {
        debug!(
            analyzers = self.analyzers.len(),
            classifier = self.has_classifier(),
            width = image.width(),
            height = image.height(),
            "Starting assessment"
        );

        let analyzer_runs = self
            .analyzers
            .iter()
            .map(|analyzer| self.run_analyzer(Arc::clone(analyzer), Arc::clone(&image)));

        let (classifier_record, analyzer_records) =
            tokio::join!(self.run_classifier(Arc::clone(&image)), join_all(analyzer_runs));

        let mut bundle: AssessmentBundle = analyzer_records.into_iter().collect();
        bundle.insert(classifier_record);

        for key in AnalyzerKey::HEURISTICS {
            if bundle.get(key).is_none() {
                bundle.insert(SignalRecord::skipped(key, ANALYZER_NOT_CONFIGURED));
            }
        }

        info!(
            records = bundle.len(),
            suspicious = bundle.suspicious_count(),
            evidence = bundle.evidence_count(),
            "Assessment complete"
        );

        bundle
    }

    async fn run_analyzer(
        &self,
        analyzer: Arc<dyn SignalAnalyzer>,
        image: Arc<DecodedImage>,
    ) -> SignalRecord {
        let key = analyzer.key();
        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || analyzer.analyze(&image));

        let record = match tokio::time::timeout(self.analyzer_timeout, task).await {
            Ok(Ok(Ok(payload))) => SignalRecord::from_payload(key, payload),
            Ok(Ok(Err(e))) => {
                warn!(analyzer = %key, error = %e, "Analyzer failed");
                SignalRecord::failed(key, e)
            }
            Ok(Err(e)) => {
                warn!(analyzer = %key, error = %e, "Analyzer task aborted");
                SignalRecord::failed(key, format!("analyzer task aborted: {}", e))
            }
            Err(_) => {
                warn!(
                    analyzer = %key,
                    timeout_ms = self.analyzer_timeout.as_millis() as u64,
                    "Analyzer timed out"
                );
                SignalRecord::failed(
                    key,
                    format!("timed out after {} ms", self.analyzer_timeout.as_millis()),
                )
            }
        };

        info!(
            analyzer = %key,
            flag = %record.flag,
            score = ?record.suspicious_score(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analyzer finished"
        );
        record
    }

    async fn run_classifier(&self, image: Arc<DecodedImage>) -> SignalRecord {
        let key = AnalyzerKey::DeepfakeDetection;

        let classifier = match &self.classifier {
            Some(classifier) if classifier.is_available() => Arc::clone(classifier),
            _ => return SignalRecord::skipped(key, CLASSIFIER_UNAVAILABLE),
        };

        let started = Instant::now();
        let name = classifier.name().to_string();
        let mut task = tokio::spawn(async move { classifier.predict(&image).await });

        let record = match tokio::time::timeout(self.classifier_timeout, &mut task).await {
            Ok(Ok(Ok(result))) => SignalRecord::from_payload(key, SignalPayload::Classifier(result)),
            Ok(Ok(Err(e))) => {
                warn!(classifier = %name, error = %e, "Classifier failed");
                SignalRecord::failed(key, e)
            }
            Ok(Err(e)) => {
                warn!(classifier = %name, error = %e, "Classifier task aborted");
                SignalRecord::failed(key, format!("classifier task aborted: {}", e))
            }
            Err(_) => {
                task.abort();
                let timeout_ms = self.classifier_timeout.as_millis() as u64;
                warn!(classifier = %name, timeout_ms, "Classifier timed out");
                SignalRecord::failed(key, ClassifierError::Timeout(timeout_ms))
            }
        };

        info!(
            analyzer = %key,
            classifier = %name,
            flag = %record.flag,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Classifier finished"
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::types::{ClassifierResult, SignalFlag};
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Failing;

    impl SignalAnalyzer for Failing {
        fn key(&self) -> AnalyzerKey {
            AnalyzerKey::NoiseAnalysis
        }

        fn analyze(&self, _image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
            Err(AnalysisError::Computation("synthetic failure".to_string()))
        }
    }

    struct Panicking;

    impl SignalAnalyzer for Panicking {
        fn key(&self) -> AnalyzerKey {
            AnalyzerKey::ShadowAnalysis
        }

        fn analyze(&self, _image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
            panic!("analyzer bug");
        }
    }

    struct Sleeping;

    impl SignalAnalyzer for Sleeping {
        fn key(&self) -> AnalyzerKey {
            AnalyzerKey::BlurAnalysis
        }

        fn analyze(&self, _image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
            std::thread::sleep(Duration::from_millis(500));
            Err(AnalysisError::Computation("too late".to_string()))
        }
    }

    struct Fixed(ClassifierResult);

    #[async_trait]
    impl DeepfakeClassifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn predict(&self, _image: &DecodedImage) -> Result<ClassifierResult, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    struct Stalled(Arc<AtomicBool>);

    #[async_trait]
    impl DeepfakeClassifier for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn predict(&self, _image: &DecodedImage) -> Result<ClassifierResult, ClassifierError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.0.store(true, Ordering::SeqCst);
            Ok(ClassifierResult::from_probabilities(0.9, 0.1))
        }
    }

    struct Offline;

    #[async_trait]
    impl DeepfakeClassifier for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn is_available(&self) -> bool {
            false
        }

        async fn predict(&self, _image: &DecodedImage) -> Result<ClassifierResult, ClassifierError> {
            Err(ClassifierError::NotAvailable("offline".to_string()))
        }
    }

    fn image() -> Arc<DecodedImage> {
        Arc::new(DecodedImage::from_rgb(RgbImage::from_pixel(48, 48, Rgb([120, 110, 100]))))
    }

    #[tokio::test]
    async fn test_bundle_has_every_key() {
        let orchestrator = Orchestrator::from_config(&DfscanConfig::default());
        let bundle = orchestrator.assess(image()).await;

        assert_eq!(bundle.len(), AnalyzerKey::ALL.len());
        for key in AnalyzerKey::ALL {
            assert!(bundle.get(key).is_some(), "missing {}", key);
        }
        let classifier = bundle.classifier().unwrap();
        assert_eq!(classifier.flag, SignalFlag::Skipped);
        assert_eq!(classifier.description, CLASSIFIER_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let mut analyzers = default_analyzers(&Default::default());
        analyzers.retain(|a| {
            !matches!(a.key(), AnalyzerKey::NoiseAnalysis | AnalyzerKey::ShadowAnalysis)
        });
        analyzers.push(Arc::new(Failing));
        analyzers.push(Arc::new(Panicking));

        let bundle = Orchestrator::new(analyzers, None).assess(image()).await;

        let noise = bundle.get(AnalyzerKey::NoiseAnalysis).unwrap();
        assert_eq!(noise.flag, SignalFlag::Error);
        assert_eq!(noise.suspicious_score(), Some(0.5));
        assert!(noise.description.contains("synthetic failure"));

        let shadow = bundle.get(AnalyzerKey::ShadowAnalysis).unwrap();
        assert_eq!(shadow.flag, SignalFlag::Error);
        assert_eq!(shadow.suspicious_score(), Some(0.5));

        assert!(bundle.get(AnalyzerKey::BlurAnalysis).unwrap().flag.is_evidence());
    }

    #[tokio::test]
    async fn test_slow_analyzer_times_out() {
        let orchestrator = Orchestrator::new(vec![Arc::new(Sleeping)], None)
            .with_timeouts(Duration::from_millis(20), Duration::from_secs(1));
        let bundle = orchestrator.assess(image()).await;

        let blur = bundle.get(AnalyzerKey::BlurAnalysis).unwrap();
        assert_eq!(blur.flag, SignalFlag::Error);
        assert!(blur.description.contains("timed out"));
        // Unconfigured heuristics are skipped, not missing
        assert_eq!(
            bundle.get(AnalyzerKey::ColorAnalysis).unwrap().flag,
            SignalFlag::Skipped
        );
    }

    #[tokio::test]
    async fn test_classifier_verdict_sets_flag() {
        let classifier: Arc<dyn DeepfakeClassifier> =
            Arc::new(Fixed(ClassifierResult::from_probabilities(0.2, 0.8)));
        let bundle = Orchestrator::new(vec![], Some(classifier)).assess(image()).await;

        let record = bundle.classifier().unwrap();
        assert_eq!(record.flag, SignalFlag::Suspicious);
        assert_eq!(record.operation, "AI Deepfake Detection");
    }

    #[tokio::test]
    async fn test_timed_out_classifier_is_aborted() {
        let finished = Arc::new(AtomicBool::new(false));
        let classifier: Arc<dyn DeepfakeClassifier> = Arc::new(Stalled(Arc::clone(&finished)));
        let orchestrator = Orchestrator::new(vec![], Some(classifier))
            .with_timeouts(Duration::from_secs(1), Duration::from_millis(20));

        let bundle = orchestrator.assess(image()).await;
        let record = bundle.classifier().unwrap();
        assert_eq!(record.flag, SignalFlag::Error);
        assert!(record.description.contains("timed out"));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unavailable_classifier_is_skipped() {
        let classifier: Arc<dyn DeepfakeClassifier> = Arc::new(Offline);
        let orchestrator = Orchestrator::new(vec![], Some(classifier));
        assert!(!orchestrator.has_classifier());

        let bundle = orchestrator.assess(image()).await;
        assert_eq!(bundle.classifier().unwrap().flag, SignalFlag::Skipped);
    }

    #[tokio::test]
    async fn test_classifier_error_result_is_error_record() {
        let classifier: Arc<dyn DeepfakeClassifier> =
            Arc::new(Fixed(ClassifierResult::failed("Prediction failed: bad tensor")));
        let bundle = Orchestrator::new(vec![], Some(classifier)).assess(image()).await;
        assert_eq!(bundle.classifier().unwrap().flag, SignalFlag::Error);
    }
}
