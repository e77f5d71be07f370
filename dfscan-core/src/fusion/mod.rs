// Fusion Engine - Signal Bundle to Overall Assessment
//
// Steps, in order:
// 1. Heuristic confidence from the Suspicious / (Passed + Suspicious) ratio
// 2. Synthetic artwork detection (see artwork.rs)
// 3. Classifier integration, branching on raw probabilities vs label only
// 4. Single-suspicious-classifier safeguard for artwork
// 5. Clamp, round, verdict, recommendation tier
//
// `fuse` is pure: the only side effect is one debug event.

pub mod artwork;
pub mod config;
pub mod recommendation;

pub use artwork::ArtworkIndicators;
pub use config::FusionConfig;
pub use recommendation::Recommendation;

use crate::types::{
    AnalyzerKey, AssessmentBundle, ClassifierLabel, ClassifierResult, SignalFlag, SignalPayload,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Final verdict for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAssessment {
    /// Authenticity confidence in [0, 1], rounded to 3 decimals
    pub confidence_score: f64,
    pub is_likely_deepfake: bool,
    pub suspicious_analyses: usize,
    pub total_analyses: usize,
    pub is_synthetic_artwork: bool,
    pub recommendation: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<FusionTrace>,
}

impl OverallAssessment {
    /// Terminal assessment for an image that could not be analyzed at all
    pub fn failed() -> Self {
        Self {
            confidence_score: 0.0,
            is_likely_deepfake: false,
            suspicious_analyses: 0,
            total_analyses: 0,
            is_synthetic_artwork: false,
            recommendation: Recommendation::AnalysisFailed,
            trace: None,
        }
    }
}

/// How the classifier record entered the score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierBranch {
    /// Classifier absent, skipped, failed, or inconsistent with its flag
    NotUsed,
    /// Weighted blend with the (possibly floored) real probability
    Probabilities {
        real_probability: f64,
        classifier_weight: f64,
        heuristic_weight: f64,
    },
    /// Fake label without probabilities, discounted for artwork
    FakeLabelDiscounted,
    /// Fake label without probabilities, capping confidence at 1 - score
    FakeLabelCap { authentic_confidence: f64 },
    /// Real label without probabilities, raising confidence to its score
    RealLabelFloor { real_confidence: f64 },
}

impl fmt::Display for ClassifierBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierBranch::NotUsed => write!(f, "not_used"),
            ClassifierBranch::Probabilities { .. } => write!(f, "probabilities"),
            ClassifierBranch::FakeLabelDiscounted => write!(f, "fake_label_discounted"),
            ClassifierBranch::FakeLabelCap { .. } => write!(f, "fake_label_cap"),
            ClassifierBranch::RealLabelFloor { .. } => write!(f, "real_label_floor"),
        }
    }
}

/// Intermediate quantities of one fusion run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionTrace {
    /// Suspicious / total, absent when there is no evidence
    pub suspicion_ratio: Option<f64>,
    /// Confidence before the classifier is integrated
    pub heuristic_confidence: f64,
    pub artwork_indicators: ArtworkIndicators,
    pub artwork_indicator_count: usize,
    pub classifier_flag: SignalFlag,
    pub classifier_branch: ClassifierBranch,
    pub safeguard_applied: bool,
    /// Unrounded confidence after every step
    pub unrounded_confidence: f64,
    /// Per-analyzer authenticity estimate (Passed/Suspicious records only)
    pub evidence: BTreeMap<AnalyzerKey, f64>,
}

/// Fuse an assessment bundle into an overall assessment
pub fn fuse(bundle: &AssessmentBundle, config: &FusionConfig) -> OverallAssessment {
    // Step 1: heuristic confidence
    let suspicious_count = bundle.suspicious_count();
    let total_analyses = bundle.evidence_count();
    let suspicion_ratio =
        (total_analyses > 0).then(|| suspicious_count as f64 / total_analyses as f64);
    let heuristic_confidence = suspicion_ratio.map_or(config.neutral_confidence, |r| 1.0 - r);
    let mut confidence = clamp(heuristic_confidence);

    // Step 2: artwork detection
    let indicators = ArtworkIndicators::detect(bundle, config);
    let is_artwork = indicators.is_artwork(config);

    // Step 3: classifier integration
    let classifier_flag = bundle
        .classifier()
        .map_or(SignalFlag::Skipped, |record| record.flag);
    let classifier = bundle
        .payload(AnalyzerKey::DeepfakeDetection)
        .and_then(SignalPayload::as_classifier);

    let branch = match classifier {
        Some(result) => integrate_classifier(&mut confidence, classifier_flag, result, is_artwork, config),
        None => ClassifierBranch::NotUsed,
    };

    // Step 4: safeguard
    let safeguard_applied = suspicious_count == 1
        && classifier_flag == SignalFlag::Suspicious
        && is_artwork
        && confidence > config.safeguard_trigger;
    if safeguard_applied {
        confidence = clamp(confidence.max(config.safeguard_floor));
    }

    // Step 5: verdict on the emitted (rounded) value
    let confidence_score = (clamp(confidence) * 1000.0).round() / 1000.0;
    let is_likely_deepfake = confidence_score < config.deepfake_threshold;
    let recommendation = Recommendation::for_confidence(confidence_score);

    debug!(
        suspicious_count,
        total_analyses,
        suspicion_ratio = ?suspicion_ratio,
        heuristic_confidence,
        artwork_indicators = indicators.tally(),
        is_synthetic_artwork = is_artwork,
        classifier_flag = %classifier_flag,
        classifier_branch = %branch,
        safeguard_applied,
        confidence_score,
        "Fusion complete"
    );

    OverallAssessment {
        confidence_score,
        is_likely_deepfake,
        suspicious_analyses: suspicious_count,
        total_analyses,
        is_synthetic_artwork: is_artwork,
        recommendation,
        trace: Some(FusionTrace {
            suspicion_ratio,
            heuristic_confidence,
            artwork_indicators: indicators,
            artwork_indicator_count: indicators.tally(),
            classifier_flag,
            classifier_branch: branch,
            safeguard_applied,
            unrounded_confidence: confidence,
            evidence: evidence_scores(bundle),
        }),
    }
}

fn integrate_classifier(
    confidence: &mut f64,
    flag: SignalFlag,
    result: &ClassifierResult,
    is_artwork: bool,
    config: &FusionConfig,
) -> ClassifierBranch {
    match (flag, result.raw_probabilities) {
        (SignalFlag::Passed | SignalFlag::Suspicious, Some(probabilities)) => {
            let mut real_probability = probabilities.real;
            if is_artwork {
                if flag == SignalFlag::Suspicious && probabilities.fake < config.artwork_fake_override {
                    real_probability = real_probability.max(config.artwork_suspicious_real_floor);
                } else if flag == SignalFlag::Passed {
                    real_probability = real_probability.max(config.artwork_passed_real_floor);
                }
            }

            let (classifier_weight, heuristic_weight) = if is_artwork {
                (config.artwork_classifier_weight, config.artwork_heuristic_weight)
            } else {
                (config.classifier_weight, config.heuristic_weight)
            };

            *confidence = clamp(*confidence * heuristic_weight + real_probability * classifier_weight);
            ClassifierBranch::Probabilities {
                real_probability,
                classifier_weight,
                heuristic_weight,
            }
        }
        (SignalFlag::Suspicious, None) if result.label == ClassifierLabel::Fake => {
            if is_artwork && result.score < config.artwork_fake_override {
                *confidence = clamp(confidence.max(config.artwork_label_only_floor));
                ClassifierBranch::FakeLabelDiscounted
            } else {
                let authentic_confidence = 1.0 - result.score;
                *confidence = clamp(confidence.min(authentic_confidence));
                ClassifierBranch::FakeLabelCap {
                    authentic_confidence,
                }
            }
        }
        (SignalFlag::Passed, None) if result.label == ClassifierLabel::Real => {
            let mut real_confidence = result.score;
            if is_artwork {
                real_confidence = real_confidence.max(config.artwork_passed_real_floor);
            }
            *confidence = clamp(confidence.max(real_confidence));
            ClassifierBranch::RealLabelFloor { real_confidence }
        }
        _ => ClassifierBranch::NotUsed,
    }
}

/// Authenticity estimate per evidence record; payloads without a score
/// (the color analyzer) are left out
fn evidence_scores(bundle: &AssessmentBundle) -> BTreeMap<AnalyzerKey, f64> {
    bundle
        .records()
        .filter(|record| record.flag.is_evidence())
        .filter_map(|record| {
            record
                .result
                .as_ref()
                .and_then(SignalPayload::evidence_score)
                .map(|score| (record.key, score))
        })
        .collect()
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
