//! Orchestrator + fusion integration tests
//!
//! Uses fixed-payload analyzer and classifier doubles so the fused
//! confidence can be checked against hand-computed values.

mod helpers;

use async_trait::async_trait;
use dfscan_core::analyzers::SignalAnalyzer;
use dfscan_core::classifier::DeepfakeClassifier;
use dfscan_core::error::{AnalysisError, ClassifierError};
use dfscan_core::fusion::ClassifierBranch;
use dfscan_core::types::{
    BlurResult, ChannelMeans, ClassifierResult, ColorResult, NoiseResult,
};
use dfscan_core::{
    fuse, AnalyzerKey, AssessmentBundle, DecodedImage, FusionConfig, Orchestrator, Recommendation, SignalFlag,
    SignalPayload, SignalRecord,
};
use helpers::LogCapture;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

struct FixedAnalyzer(AnalyzerKey, SignalPayload);

impl SignalAnalyzer for FixedAnalyzer {
    fn key(&self) -> AnalyzerKey {
        self.0
    }

    fn analyze(&self, _image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        Ok(self.1.clone())
    }
}

struct BrokenAnalyzer(AnalyzerKey);

impl SignalAnalyzer for BrokenAnalyzer {
    fn key(&self) -> AnalyzerKey {
        self.0
    }

    fn analyze(&self, _image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        Err(AnalysisError::Computation("matrix is singular".to_string()))
    }
}

struct FixedClassifier(ClassifierResult);

#[async_trait]
impl DeepfakeClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn predict(&self, _image: &DecodedImage) -> Result<ClassifierResult, ClassifierError> {
        Ok(self.0.clone())
    }
}

fn blur(score: f64, consistency: f64) -> SignalPayload {
    SignalPayload::Blur(BlurResult {
        overall_sharpness: 250.0,
        is_blurry: false,
        regional_sharpness: vec![250.0; 9],
        sharpness_consistency: consistency,
        suspicious_score: score,
    })
}

fn noise(score: f64) -> SignalPayload {
    SignalPayload::Noise(NoiseResult {
        noise_level: 0.05,
        compression_artifacts: 0.1,
        noise_consistency: 0.9,
        suspicious_score: score,
    })
}

fn color(variance: f64) -> SignalPayload {
    SignalPayload::Color(ColorResult {
        channel_means: ChannelMeans {
            red: 0.5,
            green: 0.5,
            blue: 0.5,
        },
        color_balance: 0.0,
        color_variance: variance,
        is_anomalous: false,
    })
}

fn image() -> Arc<DecodedImage> {
    Arc::new(DecodedImage::from_rgb(helpers::gradient(48, 48)))
}

fn orchestrator(
    analyzers: Vec<Arc<dyn SignalAnalyzer>>,
    classifier: Option<ClassifierResult>,
) -> Orchestrator {
    let classifier = classifier.map(|r| Arc::new(FixedClassifier(r)) as Arc<dyn DeepfakeClassifier>);
    Orchestrator::new(analyzers, classifier)
}

#[tokio::test]
async fn test_classifier_and_heuristics_are_blended() {
    let orchestrator = orchestrator(
        vec![
            Arc::new(FixedAnalyzer(AnalyzerKey::BlurAnalysis, blur(0.8, 0.3))),
            Arc::new(FixedAnalyzer(AnalyzerKey::NoiseAnalysis, noise(0.1))),
            Arc::new(FixedAnalyzer(AnalyzerKey::ColorAnalysis, color(0.5))),
        ],
        Some(ClassifierResult::from_probabilities(0.2, 0.8)),
    );

    let bundle = orchestrator.assess(image()).await;
    assert_eq!(bundle.len(), 7);
    assert_eq!(bundle.get(AnalyzerKey::ExifAnalysis).unwrap().flag, SignalFlag::Skipped);

    // heuristic 1 - 2/4 = 0.5; 0.5 * 0.3 + 0.2 * 0.7 = 0.29
    let overall = fuse(&bundle, &FusionConfig::default());
    assert!((overall.confidence_score - 0.29).abs() < 1e-9);
    assert!(overall.is_likely_deepfake);
    assert!(!overall.is_synthetic_artwork);
    assert_eq!(overall.suspicious_analyses, 2);
    assert_eq!(overall.total_analyses, 4);
    assert_eq!(overall.recommendation, Recommendation::LikelyManipulated);

    let trace = overall.trace.unwrap();
    assert!(matches!(trace.classifier_branch, ClassifierBranch::Probabilities { .. }));
    assert_eq!(trace.suspicion_ratio, Some(0.5));
    assert!(!trace.safeguard_applied);
}

#[tokio::test]
async fn test_heuristics_only_without_classifier() {
    let orchestrator = orchestrator(
        vec![
            Arc::new(FixedAnalyzer(AnalyzerKey::BlurAnalysis, blur(0.1, 0.8))),
            Arc::new(FixedAnalyzer(AnalyzerKey::NoiseAnalysis, noise(0.7))),
        ],
        None,
    );

    let bundle = orchestrator.assess(image()).await;
    let overall = fuse(&bundle, &FusionConfig::default());

    assert_eq!(bundle.classifier().unwrap().flag, SignalFlag::Skipped);
    assert_eq!(overall.total_analyses, 2);
    assert!((overall.confidence_score - 0.5).abs() < 1e-9);
    assert!(!overall.is_likely_deepfake);
    assert_eq!(overall.recommendation, Recommendation::Inconclusive);
}

#[tokio::test]
async fn test_failed_analyzer_is_not_evidence() {
    let orchestrator = orchestrator(
        vec![
            Arc::new(BrokenAnalyzer(AnalyzerKey::ShadowAnalysis)),
            Arc::new(FixedAnalyzer(AnalyzerKey::NoiseAnalysis, noise(0.1))),
        ],
        None,
    );

    let bundle = orchestrator.assess(image()).await;
    let shadow = bundle.get(AnalyzerKey::ShadowAnalysis).unwrap();
    assert_eq!(shadow.flag, SignalFlag::Error);
    assert_eq!(shadow.suspicious_score(), Some(0.5));

    let overall = fuse(&bundle, &FusionConfig::default());
    assert_eq!(overall.total_analyses, 1);
    assert_eq!(overall.confidence_score, 1.0);
    assert_eq!(overall.recommendation, Recommendation::HighConfidenceAuthentic);
}

#[tokio::test]
async fn test_orchestrator_logs_each_analyzer() {
    let capture = LogCapture::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let orchestrator = orchestrator(
        vec![Arc::new(BrokenAnalyzer(AnalyzerKey::TextureAnalysis))],
        None,
    );
    orchestrator.assess(image()).await;

    capture.assert_contains("Analyzer failed");
    let finished = capture.matching("Analyzer finished");
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].fields["analyzer"], "texture_analysis");
    assert!(finished[0].fields.contains_key("elapsed_ms"));
    capture.assert_contains("Assessment complete");
}

#[test]
fn test_fusion_emits_structured_debug_event() {
    let capture = LogCapture::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    let bundle: AssessmentBundle = [
        SignalRecord::from_payload(AnalyzerKey::NoiseAnalysis, noise(0.9)),
        SignalRecord::from_payload(AnalyzerKey::BlurAnalysis, blur(0.1, 0.8)),
    ]
    .into_iter()
    .collect();

    let overall = tracing::subscriber::with_default(subscriber, || {
        fuse(&bundle, &FusionConfig::default())
    });

    let events = capture.matching("Fusion complete");
    assert_eq!(events.len(), 1);
    let fields = &events[0].fields;
    assert_eq!(fields["suspicious_count"], "1");
    assert_eq!(fields["total_analyses"], "2");
    assert_eq!(fields["suspicion_ratio"], "Some(0.5)");
    assert_eq!(fields["classifier_branch"], "not_used");
    assert_eq!(overall.confidence_score, 0.5);
}
