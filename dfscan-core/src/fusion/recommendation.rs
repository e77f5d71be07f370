// Recommendation tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed recommendation vocabulary; bins are lower-bound exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Image appears authentic with high confidence")]
    HighConfidenceAuthentic,
    #[serde(rename = "Image likely authentic but some minor inconsistencies detected")]
    LikelyAuthentic,
    #[serde(rename = "Inconclusive - mixed indicators detected")]
    Inconclusive,
    #[serde(rename = "Image likely manipulated - multiple suspicious indicators")]
    LikelyManipulated,
    #[serde(rename = "Image very likely deepfake - strong suspicious indicators")]
    VeryLikelyDeepfake,
    #[serde(rename = "Analysis failed - unable to determine authenticity")]
    AnalysisFailed,
}

impl Recommendation {
    /// Tier for a fused confidence score
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            Recommendation::HighConfidenceAuthentic
        } else if confidence > 0.6 {
            Recommendation::LikelyAuthentic
        } else if confidence > 0.4 {
            Recommendation::Inconclusive
        } else if confidence > 0.2 {
            Recommendation::LikelyManipulated
        } else {
            Recommendation::VeryLikelyDeepfake
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::HighConfidenceAuthentic => "Image appears authentic with high confidence",
            Recommendation::LikelyAuthentic => {
                "Image likely authentic but some minor inconsistencies detected"
            }
            Recommendation::Inconclusive => "Inconclusive - mixed indicators detected",
            Recommendation::LikelyManipulated => {
                "Image likely manipulated - multiple suspicious indicators"
            }
            Recommendation::VeryLikelyDeepfake => {
                "Image very likely deepfake - strong suspicious indicators"
            }
            Recommendation::AnalysisFailed => "Analysis failed - unable to determine authenticity",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
