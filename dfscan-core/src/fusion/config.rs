// Fusion weighting constants (`[fusion]` config section)

use dfscan_common::{Error, Result};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Every empirically chosen constant of the fusion engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Classifier share of the blend for photographs
    pub classifier_weight: f64,
    /// Heuristic share of the blend for photographs
    pub heuristic_weight: f64,
    /// Classifier share of the blend for artwork
    pub artwork_classifier_weight: f64,
    /// Heuristic share of the blend for artwork
    pub artwork_heuristic_weight: f64,
    /// Indicators needed to call an image synthetic artwork
    pub artwork_indicator_threshold: usize,
    /// Below this fake probability a Suspicious verdict on artwork is discounted
    pub artwork_fake_override: f64,
    /// Real-probability floor for a discounted Suspicious verdict on artwork
    pub artwork_suspicious_real_floor: f64,
    /// Real-probability floor for a Passed verdict on artwork
    pub artwork_passed_real_floor: f64,
    /// Confidence floor for artwork when only a fake label (no probabilities) is known
    pub artwork_label_only_floor: f64,
    /// The single-suspicious-classifier safeguard applies above this confidence
    pub safeguard_trigger: f64,
    /// ...and raises confidence to at least this
    pub safeguard_floor: f64,
    /// Texture uniformity above this is an artwork indicator
    pub texture_uniformity_indicator: f64,
    /// Color variance below this is an artwork indicator
    pub color_variance_indicator: f64,
    /// Sharpness consistency above this is an artwork indicator
    pub sharpness_consistency_indicator: f64,
    /// Confidence when no Passed/Suspicious evidence exists
    pub neutral_confidence: f64,
    /// Confidence below this is a likely deepfake
    pub deepfake_threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            classifier_weight: 0.7,
            heuristic_weight: 0.3,
            artwork_classifier_weight: 0.4,
            artwork_heuristic_weight: 0.6,
            artwork_indicator_threshold: 2,
            artwork_fake_override: 0.85,
            artwork_suspicious_real_floor: 0.7,
            artwork_passed_real_floor: 0.8,
            artwork_label_only_floor: 0.7,
            safeguard_trigger: 0.4,
            safeguard_floor: 0.6,
            texture_uniformity_indicator: 0.7,
            color_variance_indicator: 0.3,
            sharpness_consistency_indicator: 0.9,
            neutral_confidence: 0.5,
            deepfake_threshold: 0.5,
        }
    }
}

impl FusionConfig {
    /// Weights and thresholds must be probabilities; weight pairs must sum to 1
    pub fn validate(&self) -> Result<()> {
        let unit_fields = [
            ("classifier_weight", self.classifier_weight),
            ("heuristic_weight", self.heuristic_weight),
            ("artwork_classifier_weight", self.artwork_classifier_weight),
            ("artwork_heuristic_weight", self.artwork_heuristic_weight),
            ("artwork_fake_override", self.artwork_fake_override),
            ("artwork_suspicious_real_floor", self.artwork_suspicious_real_floor),
            ("artwork_passed_real_floor", self.artwork_passed_real_floor),
            ("artwork_label_only_floor", self.artwork_label_only_floor),
            ("safeguard_trigger", self.safeguard_trigger),
            ("safeguard_floor", self.safeguard_floor),
            ("texture_uniformity_indicator", self.texture_uniformity_indicator),
            ("color_variance_indicator", self.color_variance_indicator),
            ("sharpness_consistency_indicator", self.sharpness_consistency_indicator),
            ("neutral_confidence", self.neutral_confidence),
            ("deepfake_threshold", self.deepfake_threshold),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "fusion.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let pairs = [
            ("classifier_weight + heuristic_weight", self.classifier_weight + self.heuristic_weight),
            (
                "artwork_classifier_weight + artwork_heuristic_weight",
                self.artwork_classifier_weight + self.artwork_heuristic_weight,
            ),
        ];
        for (name, sum) in pairs {
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(Error::Config(format!("fusion.{} must equal 1.0, got {}", name, sum)));
            }
        }

        if self.artwork_indicator_threshold == 0 {
            return Err(Error::Config(
                "fusion.artwork_indicator_threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
