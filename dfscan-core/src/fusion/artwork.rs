// Synthetic Artwork Detector
//
// Photography-tuned heuristics misfire on drawings and digital art. Four weak
// indicators are tallied; enough of them shifts trust toward the classifier.

use crate::fusion::FusionConfig;
use crate::types::{AnalyzerKey, AssessmentBundle, SignalPayload};
use serde::Serialize;

/// Which artwork indicators fired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtworkIndicators {
    /// Texture uniformity (GLCM energy) is high
    pub uniform_texture: bool,
    /// Channel intensities are tightly clustered
    pub even_color: bool,
    /// No camera Make/Model in EXIF (also when EXIF analysis produced nothing)
    pub no_camera_info: bool,
    /// Sharpness is nearly identical across regions
    pub consistent_sharpness: bool,
}

impl ArtworkIndicators {
    /// Evaluate the indicators against a bundle
    ///
    /// A missing payload never fires an indicator, except the camera check
    /// where absence of camera info is the indicator itself.
    pub fn detect(bundle: &AssessmentBundle, config: &FusionConfig) -> Self {
        let uniform_texture = bundle
            .payload(AnalyzerKey::TextureAnalysis)
            .and_then(SignalPayload::as_texture)
            .and_then(|t| t.texture_features.as_ref())
            .is_some_and(|f| f.uniformity > config.texture_uniformity_indicator);

        let even_color = bundle
            .payload(AnalyzerKey::ColorAnalysis)
            .and_then(SignalPayload::as_color)
            .is_some_and(|c| c.color_variance < config.color_variance_indicator);

        let has_camera_info = bundle
            .payload(AnalyzerKey::ExifAnalysis)
            .and_then(SignalPayload::as_exif)
            .is_some_and(|e| e.has_camera_info);

        let consistent_sharpness = bundle
            .payload(AnalyzerKey::BlurAnalysis)
            .and_then(SignalPayload::as_blur)
            .is_some_and(|b| b.sharpness_consistency > config.sharpness_consistency_indicator);

        Self {
            uniform_texture,
            even_color,
            no_camera_info: !has_camera_info,
            consistent_sharpness,
        }
    }

    /// Number of indicators that fired
    pub fn tally(&self) -> usize {
        [
            self.uniform_texture,
            self.even_color,
            self.no_camera_info,
            self.consistent_sharpness,
        ]
        .iter()
        .filter(|&&fired| fired)
        .count()
    }

    pub fn is_artwork(&self, config: &FusionConfig) -> bool {
        self.tally() >= config.artwork_indicator_threshold
    }
}
